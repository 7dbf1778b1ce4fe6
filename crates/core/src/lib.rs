//! Cellar Core - Shared types and wire protocol for the storefront
//!
//! This crate provides:
//! - Domain types (users, wines, orders)
//! - Request envelope and tagged responses
//! - Protocol handling (length-prefixed Postcard frames)
//! - Error types
//! - Email validation

// Version constants
pub const PROTOCOL_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 4316;

pub mod error;
pub mod protocol;
pub mod types;
pub mod validation;

// Re-export common types
pub use error::{CoreError, Result};
pub use protocol::MessageCodec;
pub use types::{Command, Envelope, Order, Permission, Response, User, Wine};
pub use validation::is_mail;
