//! Byte-stream transports for the agent connection.
//!
//! The pipeline needs only a readable half, a writable half, and a handle to
//! release whatever backs them. A [`Connector`] produces those three pieces
//! as a [`Connection`].
//!
//! - `ssh`: spawns the OpenSSH client with key authentication and a pinned
//!   `known_hosts` file.
//! - `tcp`: plain TCP, for local servers and tests.

pub mod ssh;
pub mod tcp;

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{ConnectionConfig, TransportKind};
use crate::Result;

/// Boxed future returned by transport trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Readable half of a connection.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Writable half of a connection.
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Releases the resource behind a connection once both halves are closed.
pub trait ConnectionHandle: Send {
    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource could not be released cleanly.
    fn close(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}

/// An established agent stream.
pub struct Connection {
    /// Inbound line source.
    pub reader: BoxReader,
    /// Outbound line sink.
    pub writer: BoxWriter,
    /// Owner of the underlying transport.
    pub handle: Box<dyn ConnectionHandle>,
}

impl Connection {
    /// Assemble a connection from its parts.
    #[must_use]
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        handle: impl ConnectionHandle + 'static,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            handle: Box::new(handle),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Establishes the agent stream.
pub trait Connector: Send + Sync {
    /// Open the connection.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connect`](crate::AppError::Connect) when the
    /// transport cannot be set up.
    fn connect(&self) -> BoxFuture<'_, Result<Connection>>;
}

/// Pick the connector described by `config`.
#[must_use]
pub fn connector_for(config: &ConnectionConfig) -> Box<dyn Connector> {
    match config.transport {
        TransportKind::Ssh => Box::new(ssh::SshConnector::new(config.clone())),
        TransportKind::Tcp => Box::new(tcp::TcpConnector::new(config.clone())),
    }
}
