//! Plain TCP transport.

use std::net::SocketAddr;

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::transport::{BoxFuture, Connection, ConnectionHandle, Connector};
use crate::{AppError, Result};

/// Opens the agent stream over an unauthenticated TCP connection.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: ConnectionConfig,
}

impl TcpConnector {
    /// Create a connector for `config`.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn open(&self) -> Result<Connection> {
        let addr = (self.config.host.as_str(), self.config.port);
        let stream = tokio::time::timeout(self.config.connect_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_elapsed| {
                AppError::Connect(format!(
                    "timed out connecting to {}:{}",
                    self.config.host, self.config.port
                ))
            })?
            .map_err(|err| {
                AppError::Connect(format!(
                    "failed to connect to {}:{}: {err}",
                    self.config.host, self.config.port
                ))
            })?;

        let peer = stream
            .peer_addr()
            .map_err(|err| AppError::Connect(format!("failed to read peer address: {err}")))?;
        info!(%peer, "tcp connection established");

        let (reader, writer) = stream.into_split();
        Ok(Connection::new(reader, writer, TcpHandle { peer }))
    }
}

impl Connector for TcpConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Connection>> {
        Box::pin(self.open())
    }
}

/// The socket is released when both owned halves are dropped; closing only
/// records the event.
#[derive(Debug)]
struct TcpHandle {
    peer: SocketAddr,
}

impl ConnectionHandle for TcpHandle {
    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
        let peer = self.peer;
        Box::pin(async move {
            debug!(%peer, "tcp connection released");
            Ok(())
        })
    }
}
