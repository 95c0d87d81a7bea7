//! Chat server listener
//!
//! Binds every configured address, runs one accept loop per address and
//! spawns a connection task per accepted socket. All acceptors share one
//! registry and broadcaster.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{BindError, Error, Result};
use crate::registry::ConnectionRegistry;
use crate::server::broadcaster::Broadcaster;
use crate::server::config::ServerConfig;
use crate::server::connection::ConnectionTask;
use crate::stats::{ServerMetrics, ServerStats};

/// Pause after a failed accept so resource exhaustion does not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// State shared by all acceptors
struct ServerContext {
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    metrics: Arc<ServerMetrics>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

/// Chat relay server
pub struct ChatServer {
    ctx: Arc<ServerContext>,
}

impl ChatServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let registry = Arc::new(ConnectionRegistry::new());
        let metrics = Arc::new(ServerMetrics::new());
        let broadcaster = Arc::new(Broadcaster::with_metrics(
            Arc::clone(&registry),
            Arc::clone(&metrics),
        ));

        Self {
            ctx: Arc::new(ServerContext {
                config,
                registry,
                broadcaster,
                metrics,
                connection_semaphore,
            }),
        }
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.ctx.registry
    }

    /// Get a snapshot of server statistics
    pub fn stats(&self) -> ServerStats {
        self.ctx.metrics.snapshot()
    }

    /// Bind all listen addresses and start accepting in the background
    ///
    /// A bind failure only disables that address; it is logged and kept in
    /// [`ServerHandle::bind_errors`]. Fails only if nothing could be bound.
    pub async fn start(&self) -> Result<ServerHandle> {
        let mut listeners = Vec::new();
        let mut bind_errors = Vec::new();

        for &addr in &self.ctx.config.listen_addrs {
            match bind_listener(addr).await {
                Ok((local_addr, listener)) => {
                    tracing::info!(addr = %local_addr, "Chat server listening");
                    listeners.push((local_addr, listener));
                }
                Err(e) => {
                    tracing::error!(addr = %addr, error = %e, "Failed to bind listener");
                    bind_errors.push(BindError { addr, source: e });
                }
            }
        }

        if listeners.is_empty() {
            return Err(Error::NoListeners(bind_errors));
        }

        let local_addrs = listeners.iter().map(|(addr, _)| *addr).collect();
        let tasks = listeners
            .into_iter()
            .map(|(addr, listener)| {
                let ctx = Arc::clone(&self.ctx);
                tokio::spawn(async move { ctx.accept_loop(listener, addr).await })
            })
            .collect();

        Ok(ServerHandle {
            local_addrs,
            bind_errors,
            tasks,
            registry: Arc::clone(&self.ctx.registry),
        })
    }

    /// Run the server
    ///
    /// This method blocks until every acceptor stops, which normally never happens.
    pub async fn run(&self) -> Result<()> {
        let mut handle = self.start().await?;
        handle.wait().await;
        Ok(())
    }

    /// Run the server with graceful shutdown
    ///
    /// When `shutdown` resolves, all acceptors stop and every connection is closed.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let mut handle = self.start().await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = handle.wait() => {}
        }

        handle.shutdown().await;
        Ok(())
    }
}

impl ServerContext {
    async fn accept_loop(&self, listener: TcpListener, local_addr: SocketAddr) {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr).await;
                }
                Err(e) => {
                    tracing::error!(addr = %local_addr, error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }
    }

    async fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    self.metrics.connection_rejected();
                    return;
                }
            }
        } else {
            None
        };

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(peer = %peer_addr, error = %e, "Failed to configure socket");
                return;
            }
        }

        let (read_half, write_half) = socket.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.outbound_queue_size);

        // Registered before the task is spawned, so shutdown sees every connection
        let conn = self.registry.add(peer_addr, outbound_tx).await;
        self.metrics.connection_accepted();
        let conn_id = conn.id();

        let task = ConnectionTask::new(
            conn,
            Arc::clone(&self.broadcaster),
            self.config.max_line_length,
            self.config.forward_sentinel,
        );

        tokio::spawn(async move {
            let _permit = permit;
            let reason = task.run(read_half, write_half, outbound_rx).await;
            tracing::debug!(conn_id = conn_id, reason = %reason, "Connection task finished");
        });
    }
}

/// Bind one address and resolve the address actually bound
///
/// Either step failing disables only this address.
async fn bind_listener(addr: SocketAddr) -> std::io::Result<(SocketAddr, TcpListener)> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    Ok((local_addr, listener))
}

/// Handle to a started server
///
/// Dropping the handle leaves the acceptors running; call
/// [`shutdown`](Self::shutdown) to stop them.
pub struct ServerHandle {
    local_addrs: Vec<SocketAddr>,
    bind_errors: Vec<BindError>,
    tasks: Vec<JoinHandle<()>>,
    registry: Arc<ConnectionRegistry>,
}

impl ServerHandle {
    /// Addresses actually bound (resolves port 0 to the assigned port)
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Addresses that failed to bind
    pub fn bind_errors(&self) -> &[BindError] {
        &self.bind_errors
    }

    /// Wait for all acceptors to finish
    pub async fn wait(&mut self) {
        while let Some(task) = self.tasks.first_mut() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Acceptor task failed");
            }
            self.tasks.remove(0);
        }
    }

    /// Stop all acceptors and close every registered connection
    ///
    /// Returns the number of connections closed.
    pub async fn shutdown(mut self) -> usize {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }

        self.registry.close_all().await
    }
}
