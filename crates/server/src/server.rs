//! TCP server for storefront clients
//!
//! Each accepted connection gets its own task, which answers frames until
//! the client closes. Per-call clients send one frame, persistent clients
//! send many.

use anyhow::{Context, Result};
use cellar_core::protocol::{try_read_frame, write_frame};
use cellar_core::{Envelope, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::dispatch::dispatch;
use crate::store::Store;

/// Default time a connection may sit without delivering a complete frame
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Storefront server bound to a TCP address
pub struct StoreServer {
    listener: TcpListener,
    store: Store,
    idle_timeout: Duration,
}

impl StoreServer {
    /// Bind `addr`; port 0 picks a free port
    pub async fn bind(addr: SocketAddr, store: Store) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Cellar server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            store,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        })
    }

    /// Close connections that take longer than `idle_timeout` to send a frame
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run server (accepts connections indefinitely)
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let store = self.store.clone();
                            let idle_timeout = self.idle_timeout;
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, peer, store, idle_timeout).await {
                                    tracing::error!("Connection error from {}: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => {
                            // Usually fd exhaustion; keep serving
                            tracing::error!("Accept error: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Answer frames on one connection until EOF or idle timeout
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    store: Store,
    idle_timeout: Duration,
) -> Result<()> {
    stream.set_nodelay(true)?;
    tracing::debug!("Connection from {}", peer);

    let mut served = 0usize;
    loop {
        let Ok(next) = timeout(idle_timeout, try_read_frame::<_, Envelope>(&mut stream)).await else {
            tracing::debug!("Closing idle connection from {}", peer);
            break;
        };
        let envelope = match next {
            Ok(Some(envelope)) => envelope,
            Ok(None) => break,
            Err(e) if e.is_transport() => return Err(e.into()),
            Err(e) => {
                // Undecodable frame: report it, then drop the connection since
                // the stream position can no longer be trusted
                tracing::warn!("Bad frame from {}: {}", peer, e);
                write_frame(&mut stream, &Response::Failed(e.to_string())).await?;
                break;
            }
        };

        let response = dispatch(&store, &envelope).await;
        tracing::debug!("{} {} -> {}", peer, envelope.command, response.kind());
        write_frame(&mut stream, &response).await?;
        served += 1;
    }

    tracing::debug!("Connection from {} closed after {} requests", peer, served);
    Ok(())
}
