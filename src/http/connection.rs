use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::router::Router;

/// One accepted client connection.
///
/// A connection carries exactly one request/response exchange and is then
/// shut down. `run` consumes the connection, so it is closed exactly once
/// whichever way the exchange ends.
pub struct Connection<S> {
    stream: S,
    peer: Option<SocketAddr>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: Option<SocketAddr>) -> Self {
        Self { stream, peer }
    }

    pub async fn run(mut self, router: &Router) -> anyhow::Result<()> {
        let served = {
            let (mut reader, mut writer) = tokio::io::split(&mut self.stream);
            router.handle_request(&mut reader, &mut writer).await
        };

        // Close regardless of how the exchange went.
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(peer = ?self.peer, error = %e, "Shutdown after exchange failed");
        }
        tracing::debug!(peer = ?self.peer, "Connection closed");

        served
    }
}
