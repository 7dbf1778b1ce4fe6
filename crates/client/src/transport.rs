//! Request/response transport
//!
//! Every component call goes through [`Transport::send`]: one envelope out,
//! one response back. [`TcpTransport`] is the network implementation;
//! [`MockTransport`] scripts responses for tests.

use async_trait::async_trait;
use cellar_core::protocol::{read_frame, write_frame};
use cellar_core::{CoreError, Envelope, Response, Result};
use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::{ClientConfig, ConnectionMode};

/// One request/response exchange with the server
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<Response>;
}

/// TCP transport with explicit connect and I/O timeouts
///
/// In [`ConnectionMode::PerCall`] each `send` owns its stream, so the
/// connection is closed on every exit path. In
/// [`ConnectionMode::Persistent`] a stream that fails is discarded and the
/// error returned; the next call dials again. Nothing is retried.
pub struct TcpTransport {
    config: ClientConfig,
    /// Idle connection kept between calls (persistent mode only)
    idle: Mutex<Option<TcpStream>>,
}

impl TcpTransport {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            idle: Mutex::new(None),
        }
    }

    async fn dial(&self) -> Result<TcpStream> {
        let addr = &self.config.server_addr;
        let stream = timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| CoreError::Timeout(millis(self.config.connect_timeout)))?
            .map_err(CoreError::from_connect)?;

        // Small request/response frames; don't wait for Nagle
        stream.set_nodelay(true)?;
        tracing::debug!("Connected to {}", addr);
        Ok(stream)
    }

    async fn exchange(&self, stream: &mut TcpStream, envelope: &Envelope) -> Result<Response> {
        let io = async {
            write_frame(&mut *stream, envelope).await?;
            read_frame::<_, Response>(&mut *stream).await
        };
        timeout(self.config.io_timeout, io)
            .await
            .map_err(|_| CoreError::Timeout(millis(self.config.io_timeout)))?
    }

    async fn send_per_call(&self, envelope: &Envelope) -> Result<Response> {
        let mut stream = self.dial().await?;
        let result = self.exchange(&mut stream, envelope).await;
        // Best effort: the stream is dropped (and closed) either way
        let _ = stream.shutdown().await;
        result
    }

    async fn send_persistent(&self, envelope: &Envelope) -> Result<Response> {
        let mut idle = self.idle.lock().await;
        let mut stream = match idle.take().filter(is_reusable) {
            Some(stream) => stream,
            None => self.dial().await?,
        };

        match self.exchange(&mut stream, envelope).await {
            Ok(response) => {
                *idle = Some(stream);
                Ok(response)
            }
            Err(e) => {
                tracing::debug!("Dropping persistent connection after error: {}", e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, envelope: Envelope) -> Result<Response> {
        tracing::debug!(
            "Sending {} ({} args) to {}",
            envelope.command,
            envelope.args.len(),
            self.config.server_addr
        );

        let response = match self.config.mode {
            ConnectionMode::PerCall => self.send_per_call(&envelope).await,
            ConnectionMode::Persistent => self.send_persistent(&envelope).await,
        }?;

        tracing::debug!("{} answered with {}", envelope.command, response.kind());
        Ok(response)
    }
}

/// An idle stream is reusable only while reading it would block
///
/// EOF means the server closed it; unsolicited bytes mean it is out of sync.
/// Either way it is dropped before anything is sent, so nothing is resent.
fn is_reusable(stream: &TcpStream) -> bool {
    let mut probe = [0u8; 1];
    match stream.try_read(&mut probe) {
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => true,
        Ok(0) => {
            tracing::debug!("Idle connection closed by server, redialing");
            false
        }
        Ok(_) => {
            tracing::warn!("Unsolicited data on idle connection, redialing");
            false
        }
        Err(e) => {
            tracing::debug!("Idle connection failed ({}), redialing", e);
            false
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// Mock transport for testing
///
/// Returns scripted results in order and records every envelope it sees.
/// Running out of script is reported as a server error.
#[derive(Default)]
pub struct MockTransport {
    script: StdMutex<VecDeque<Result<Response>>>,
    sent: StdMutex<Vec<Envelope>>,
}

impl MockTransport {
    /// Create new mock with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn respond(self, response: Response) -> Self {
        self.push(Ok(response));
        self
    }

    /// Queue a failure
    pub fn fail(self, error: CoreError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, item: Result<Response>) {
        lock(&self.script).push_back(item);
    }

    /// Envelopes sent so far
    pub fn sent(&self) -> Vec<Envelope> {
        lock(&self.sent).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.sent).len()
    }
}

/// A panicking test thread must not make the script disappear
fn lock<T>(mutex: &StdMutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, envelope: Envelope) -> Result<Response> {
        lock(&self.sent).push(envelope);
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Err(CoreError::Remote("mock script exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_core::protocol::try_read_frame;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// Answers every frame with Flag(true) and counts accepted connections
    async fn flag_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    while let Ok(Some(_)) = try_read_frame::<_, Envelope>(&mut stream).await {
                        write_frame(&mut stream, &Response::Flag(true)).await.unwrap();
                    }
                });
            }
        });

        (addr, accepted)
    }

    #[tokio::test]
    async fn test_per_call_opens_one_connection_per_request() {
        let (addr, accepted) = flag_server().await;
        let transport = TcpTransport::new(ClientConfig::with_addr(addr));

        for _ in 0..3 {
            let response = transport.send(Envelope::get_wines()).await.unwrap();
            assert_eq!(response, Response::Flag(true));
        }
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_persistent_reuses_connection() {
        let (addr, accepted) = flag_server().await;
        let config = ClientConfig::with_addr(addr).with_mode(ConnectionMode::Persistent);
        let transport = TcpTransport::new(config);

        for _ in 0..3 {
            transport.send(Envelope::guest()).await.unwrap();
        }
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    /// Answers one frame per connection, then closes it
    async fn one_shot_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                if let Ok(Some(_)) = try_read_frame::<_, Envelope>(&mut stream).await {
                    write_frame(&mut stream, &Response::Flag(true)).await.unwrap();
                }
            }
        });

        (addr, accepted)
    }

    #[tokio::test]
    async fn test_persistent_redials_after_server_close() {
        let (addr, accepted) = one_shot_server().await;
        let config = ClientConfig::with_addr(addr).with_mode(ConnectionMode::Persistent);
        let transport = TcpTransport::new(config);

        for _ in 0..3 {
            let response = transport.send(Envelope::guest()).await.unwrap();
            assert_eq!(response, Response::Flag(true));
            // Let the server's FIN reach the idle stream
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_refused_connection_is_distinct() {
        // Grab a free port, then close it
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let transport = TcpTransport::new(ClientConfig::with_addr(addr));
        let err = transport.send(Envelope::guest()).await.unwrap_err();
        assert!(matches!(err, CoreError::ConnectionRefused(_)), "{:?}", err);
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = ClientConfig::with_addr(addr)
            .with_timeouts(Duration::from_secs(1), Duration::from_millis(100));
        let transport = TcpTransport::new(config);
        let err = transport.send(Envelope::guest()).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout(100)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_mock_records_and_replays() {
        let mock = MockTransport::new()
            .respond(Response::Flag(true))
            .fail(CoreError::Timeout(5));

        assert_eq!(mock.send(Envelope::guest()).await.unwrap(), Response::Flag(true));
        assert!(matches!(mock.send(Envelope::get_wines()).await, Err(CoreError::Timeout(5))));
        assert!(matches!(mock.send(Envelope::get_wines()).await, Err(CoreError::Remote(_))));

        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.sent()[0].command, "guest");
    }

    #[tokio::test]
    async fn test_mock_survives_poisoned_lock() {
        let mock = MockTransport::new();
        let poison = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = mock.script.lock().unwrap();
            panic!("test thread died holding the script");
        }));
        assert!(poison.is_err());
        assert!(mock.script.is_poisoned());

        let mock = mock.respond(Response::Denied);
        assert_eq!(mock.send(Envelope::guest()).await.unwrap(), Response::Denied);
        assert_eq!(mock.call_count(), 1);
    }
}
