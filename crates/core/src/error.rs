//! Error types for cellar-core

use thiserror::Error;

/// Core error type
///
/// Only transport and protocol failures travel through this type. Business
/// outcomes (denied, unavailable, empty cart) are plain values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] postcard::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server unreachable: {0}")]
    ConnectionRefused(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Protocol version mismatch: expected {expected}, got {got}")]
    ProtocolVersionMismatch { expected: u32, got: u32 },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments for {command}: {reason}")]
    InvalidArguments { command: String, reason: String },

    #[error("Unexpected response: expected {expected}, got {got}")]
    UnexpectedResponse { expected: &'static str, got: &'static str },

    #[error("Server error: {0}")]
    Remote(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Connection could not be made or broke mid-exchange
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CoreError::ConnectionRefused(_) | CoreError::Io(_) | CoreError::Timeout(_)
        )
    }

    /// Peer answered, but not with something this client understands
    pub fn is_protocol(&self) -> bool {
        !self.is_transport()
    }

    /// Map a connect-time I/O error, keeping refusals distinct
    pub fn from_connect(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::AddrNotAvailable
            | std::io::ErrorKind::NotFound => CoreError::ConnectionRefused(err.to_string()),
            _ => CoreError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::ConnectionRefused("127.0.0.1:4316".to_string());
        assert_eq!(err.to_string(), "Server unreachable: 127.0.0.1:4316");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let core_err: CoreError = io_err.into();
        assert!(matches!(core_err, CoreError::Io(_)));
    }

    #[test]
    fn test_protocol_version_mismatch_error() {
        let err = CoreError::ProtocolVersionMismatch { expected: 1, got: 2 };
        assert_eq!(err.to_string(), "Protocol version mismatch: expected 1, got 2");
    }

    #[test]
    fn test_refused_connect_is_transport() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = CoreError::from_connect(io_err);
        assert!(matches!(err, CoreError::ConnectionRefused(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_unexpected_response_is_protocol() {
        let err = CoreError::UnexpectedResponse { expected: "actor", got: "flag" };
        assert!(err.is_protocol());
        assert!(!err.is_transport());
        assert!(CoreError::Timeout(10).is_transport());
    }
}
