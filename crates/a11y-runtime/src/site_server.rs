//! Static-file site server built on axum and tower-http.
//!
//! Key design decisions:
//! - **Bind-then-report**: the TcpListeners bind FIRST, so `listen` only
//!   returns once the port is really held
//! - **Both loopbacks**: `localhost` may resolve to `::1` before `127.0.0.1`,
//!   so the port is served on each loopback address the host has
//! - **Cancellation token shutdown**: `close` signals graceful shutdown; the
//!   socket is released when the serve tasks wind down

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;

use a11y_core::ports::{ListeningSite, ServerError, SiteServer};
use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Router serving every file under `root`.
///
/// Directory requests fall back to their `index.html`.
pub fn static_site_router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

/// [`SiteServer`] that serves files with axum on the loopback addresses.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxumSiteServer;

impl AxumSiteServer {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteServer for AxumSiteServer {
    async fn listen(&self, root: &Path, port: u16) -> Result<Box<dyn ListeningSite>, ServerError> {
        if !root.is_dir() {
            return Err(ServerError::RootNotFound(root.display().to_string()));
        }

        // Bind FIRST - get real address before spawning
        let v4 = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .map_err(|e| bind_failed(port, &e))?;

        let bound_addr = v4
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to get local address: {e}")))?;

        let mut listeners = vec![v4];
        match TcpListener::bind((Ipv6Addr::LOCALHOST, bound_addr.port())).await {
            Ok(v6) => listeners.push(v6),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                return Err(bind_failed(bound_addr.port(), &e));
            }
            Err(e) => debug!("No IPv6 loopback, serving on IPv4 only: {e}"),
        }

        info!("Serving {} on port {}", root.display(), bound_addr.port());

        let cancel_token = CancellationToken::new();
        let app = static_site_router(root);

        for listener in listeners {
            let shutdown = cancel_token.clone();
            let app = app.clone();
            tokio::spawn(async move {
                let addr = listener.local_addr().ok();
                debug!(addr = ?addr, "Site server task starting");
                let served = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown.cancelled_owned())
                    .await;
                match served {
                    Ok(()) => info!(addr = ?addr, "Site server shut down"),
                    Err(e) => warn!(addr = ?addr, "Site server ended with error: {e}"),
                }
            });
        }

        Ok(Box::new(RunningSite {
            cancel_token,
            bound_addr,
        }))
    }
}

fn bind_failed(port: u16, err: &io::Error) -> ServerError {
    ServerError::BindFailed {
        port,
        reason: err.to_string(),
    }
}

/// Handle to the running site server tasks.
struct RunningSite {
    /// Cancellation token for graceful shutdown.
    cancel_token: CancellationToken,
    /// IPv4 address the server is bound to.
    bound_addr: SocketAddr,
}

impl ListeningSite for RunningSite {
    fn port(&self) -> u16 {
        self.bound_addr.port()
    }

    /// Signal shutdown. The sockets are released asynchronously, once the
    /// serve tasks have drained their connections.
    fn close(self: Box<Self>) {
        info!("Stopping site server on port {}", self.bound_addr.port());
        self.cancel_token.cancel();
    }
}

impl fmt::Debug for RunningSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningSite")
            .field("bound_addr", &self.bound_addr)
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish()
    }
}
