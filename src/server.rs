//! TCP listener and per-connection handling.
//!
//! Every connection carries exactly one command: the server performs one
//! read, dispatches the text to the [`PolicyEngine`], writes one response
//! and closes. There is no length framing; whatever the single read returns
//! is the whole command.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::engine::PolicyEngine;
use crate::error::{Error, Result};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Policy server accepting one-command connections.
pub struct PolicyServer {
    config: ServerConfig,
    engine: Arc<PolicyEngine>,
    shutdown_tx: watch::Sender<bool>,
}

impl PolicyServer {
    /// Create a new server around a shared engine.
    pub fn new(config: ServerConfig, engine: Arc<PolicyEngine>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            engine,
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        self.config.validate()?;
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        log::info!("Policy server listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Bind and serve until shutdown is requested.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown.
    ///
    /// Each accepted connection gets its own detached task. Tasks still in
    /// flight when shutdown arrives run to completion on their own.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if *shutdown_rx.borrow_and_update() {
                log::info!("Policy server shutting down");
                break;
            }

            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let engine = Arc::clone(&self.engine);
                            let config = self.config.clone();

                            tokio::spawn(async move {
                                let result = handle_connection(stream, peer, engine, &config).await;
                                if let Err(e) = result {
                                    log::warn!("Connection {} failed: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => accept_backoff(&e).await,
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Serve until `signal` completes, then stop accepting.
    pub async fn serve_until<F>(&self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.serve(listener) => result,
            _ = signal => {
                self.shutdown();
                log::info!("Policy server shutting down");
                Ok(())
            }
        }
    }

    /// Request shutdown. Takes effect even if `serve` has not started yet.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Handle a single connection: one read, one dispatch, one write.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    engine: Arc<PolicyEngine>,
    config: &ServerConfig,
) -> Result<()> {
    let mut buf = vec![0u8; config.max_request_bytes];
    let n = with_timeout(config.io_timeout, "reading command", stream.read(&mut buf)).await?;
    if n == 0 {
        log::debug!("Connection {} closed without a command", peer);
        return Ok(());
    }

    let line = String::from_utf8_lossy(&buf[..n]);
    log::debug!("Command from {}: {:?}", peer, line);

    // The engine lock is taken and released inside dispatch; it is never
    // held across an await point.
    let response = engine.dispatch(&line);
    let response = truncate_response(&response, config.max_response_bytes);

    with_timeout(config.io_timeout, "writing response", stream.write_all(response.as_bytes()))
        .await
}

/// Pause after a failed accept so a persistent error such as EMFILE does
/// not spin the loop.
async fn accept_backoff(err: &std::io::Error) {
    log::error!("Accept error: {}, retrying in {:?}", err, ACCEPT_BACKOFF);
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

async fn with_timeout<T, F>(timeout: Option<Duration>, what: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(what))?
            .map_err(Error::from),
        None => fut.await.map_err(Error::from),
    }
}

/// Cut a response down to `max` bytes at a character boundary.
fn truncate_response(response: &str, max: usize) -> &str {
    if response.len() <= max {
        return response;
    }
    let mut end = max;
    while !response.is_char_boundary(end) {
        end -= 1;
    }
    log::warn!(
        "Response of {} bytes truncated to {} bytes",
        response.len(),
        end
    );
    &response[..end]
}
