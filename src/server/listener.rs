use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::router::Router;

/// Stops a [`Listener`]; cheap to clone and safe to trigger any number of
/// times, before or after the listener starts.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn shutdown(&self) {
        if !self.tx.send_replace(true) {
            info!("Shutdown requested");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Owns the listening socket and the accept loop.
///
/// By default connections are served one at a time, in arrival order: a
/// slow client delays everyone queued behind it. With
/// `ServerConfig::concurrent` each connection gets its own task instead.
pub struct Listener {
    listener: TcpListener,
    router: Arc<Router>,
    settings: ServerConfig,
    shutdown: ShutdownHandle,
}

impl Listener {
    pub async fn bind(settings: ServerConfig, router: Arc<Router>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(&settings.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", settings.listen_addr))?;

        Ok(Self {
            listener,
            router,
            settings,
            shutdown: ShutdownHandle::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Runs the accept loop until shutdown, an idle timeout, or a fatal
    /// accept error. The socket is closed when this returns.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut shutdown_rx = self.shutdown.tx.subscribe();
        info!(
            addr = %self.local_addr()?,
            concurrent = self.settings.concurrent,
            "Listening"
        );

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            let accepted = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                res = accept(&self.listener, self.settings.idle_timeout()) => res,
            };

            let (socket, peer) = match accepted {
                Ok(Some(conn)) => conn,
                Ok(None) => {
                    info!("No connection within idle timeout; stopping");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Accept failed; stopping listener");
                    return Err(e).context("accept failed");
                }
            };

            info!("Accepted connection from {}", peer);
            if self.settings.concurrent {
                self.spawn(socket, peer);
                continue;
            }

            // A stalled client must not hold off shutdown.
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    warn!("Shutdown while serving {}; dropping connection", peer);
                    break;
                }
                _ = self.serve(socket, peer) => {}
            }
        }

        info!("Listener closed");
        Ok(())
    }

    async fn serve(&self, socket: TcpStream, peer: SocketAddr) {
        let conn = Connection::new(socket, Some(peer));
        if let Err(e) = conn.run(&self.router).await {
            // One bad client must not stop the server.
            warn!("Connection error from {}: {:#}", peer, e);
        }
    }

    fn spawn(&self, socket: TcpStream, peer: SocketAddr) {
        let conn = Connection::new(socket, Some(peer));
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            if let Err(e) = conn.run(&router).await {
                warn!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
}

async fn accept(
    listener: &TcpListener,
    idle_timeout: Option<Duration>,
) -> std::io::Result<Option<(TcpStream, SocketAddr)>> {
    match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, listener.accept()).await {
            Ok(res) => res.map(Some),
            Err(_) => Ok(None),
        },
        None => listener.accept().await.map(Some),
    }
}
