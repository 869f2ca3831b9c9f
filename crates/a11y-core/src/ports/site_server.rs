//! Ports for the ephemeral local file server.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from port finding and listener lifecycle.
///
/// Payloads are strings so the error can be cloned to every caller sharing
/// one start operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// No TCP port could be found.
    #[error("No available port: {0}")]
    NoAvailablePort(String),

    /// Binding the listener failed.
    #[error("Failed to bind to port {port}: {reason}")]
    BindFailed { port: u16, reason: String },

    /// The directory to serve does not exist or is not a directory.
    #[error("Site directory not found: {0}")]
    RootNotFound(String),

    /// The handle was stopped, before or during start.
    #[error("Server handle has been stopped")]
    Stopped,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Finds a currently-available TCP port.
#[async_trait]
pub trait PortFinder: Send + Sync {
    /// Return `preferred` when it is free, otherwise any free port.
    async fn get_port(&self, preferred: Option<u16>) -> Result<u16, ServerError>;
}

/// Binds a listener serving a directory tree over HTTP.
#[async_trait]
pub trait SiteServer: Send + Sync {
    /// Serve `root` on `port`. The listener is bound when this returns.
    async fn listen(&self, root: &Path, port: u16) -> Result<Box<dyn ListeningSite>, ServerError>;
}

/// A bound listener returned by [`SiteServer::listen`].
pub trait ListeningSite: Send + Sync + fmt::Debug {
    /// Port the listener is bound to.
    fn port(&self) -> u16;

    /// Close the listener. Consumes the handle so it can only happen once.
    fn close(self: Box<Self>);
}
