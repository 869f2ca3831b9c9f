//! Ephemeral local site server handle.
//!
//! Owns the lifecycle of one short-lived HTTP listener exposing a directory
//! tree. Start is single-flight: the first call stores a shared future and
//! every later call gets a clone of it, so the listener is bound at most once
//! per handle no matter how often readiness is probed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, warn};

use crate::domain::ServerState;
use crate::ports::{ListeningSite, PortFinder, ScanLogger, ServerError, SiteServer};

/// The stored start operation. Resolves to the base URL.
pub type StartFuture = Shared<BoxFuture<'static, Result<String, ServerError>>>;

/// Mutable state shared between the handle and its in-flight start.
struct Slot {
    state: ServerState,
    start: Option<StartFuture>,
    listener: Option<Box<dyn ListeningSite>>,
    bound_port: Option<u16>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    // The slot is only touched in short synchronous sections; a poisoned
    // guard still holds consistent state.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a local HTTP server serving `root_dir`.
///
/// # Example
///
/// ```ignore
/// let server = LocalSiteServer::new(site_dir, None, port_finder, site_server, logger);
/// let base_url = server.start().await?; // "http://localhost:<port>"
/// server.stop();
/// ```
pub struct LocalSiteServer {
    root_dir: PathBuf,
    preferred_port: Option<u16>,
    port_finder: Arc<dyn PortFinder>,
    site_server: Arc<dyn SiteServer>,
    logger: Arc<dyn ScanLogger>,
    slot: Arc<Mutex<Slot>>,
}

impl LocalSiteServer {
    /// Create an idle handle. Nothing is bound until [`start`](Self::start).
    pub fn new(
        root_dir: impl Into<PathBuf>,
        preferred_port: Option<u16>,
        port_finder: Arc<dyn PortFinder>,
        site_server: Arc<dyn SiteServer>,
        logger: Arc<dyn ScanLogger>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            preferred_port,
            port_finder,
            site_server,
            logger,
            slot: Arc::new(Mutex::new(Slot {
                state: ServerState::Idle,
                start: None,
                listener: None,
                bound_port: None,
            })),
        }
    }

    /// Start the server, or join the start that is already in flight.
    ///
    /// Returns the identical stored future on every call. Once the handle
    /// has been stopped, resolves to [`ServerError::Stopped`] without binding.
    pub fn start(&self) -> StartFuture {
        let mut slot = lock(&self.slot);

        if let Some(start) = &slot.start {
            return start.clone();
        }

        if slot.state == ServerState::Stopped {
            return futures_util::future::ready(Err(ServerError::Stopped))
                .boxed()
                .shared();
        }

        slot.state = ServerState::Starting;
        let start = bind(
            self.root_dir.clone(),
            self.preferred_port,
            Arc::clone(&self.port_finder),
            Arc::clone(&self.site_server),
            Arc::clone(&self.logger),
            Arc::downgrade(&self.slot),
        )
        .boxed()
        .shared();
        slot.start = Some(start.clone());
        start
    }

    /// Stop the server. Safe to call any number of times, including before
    /// `start()`.
    ///
    /// A start still in flight closes its listener as soon as it binds.
    pub fn stop(&self) {
        let listener = {
            let mut slot = lock(&self.slot);
            slot.start = None;

            if matches!(slot.state, ServerState::Idle | ServerState::Stopped) {
                return;
            }

            slot.state = ServerState::Stopped;
            slot.listener.take()
        };

        if let Some(listener) = listener {
            debug!(port = %listener.port(), "Closing local site server");
            listener.close();
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        lock(&self.slot).state
    }

    /// Port the listener was bound to, once running.
    pub fn bound_port(&self) -> Option<u16> {
        lock(&self.slot).bound_port
    }
}

async fn bind(
    root_dir: PathBuf,
    preferred_port: Option<u16>,
    port_finder: Arc<dyn PortFinder>,
    site_server: Arc<dyn SiteServer>,
    logger: Arc<dyn ScanLogger>,
    slot: Weak<Mutex<Slot>>,
) -> Result<String, ServerError> {
    let bound = bind_listener(
        &root_dir,
        preferred_port,
        &*port_finder,
        &*site_server,
        &*logger,
    )
    .await;

    let Some(slot) = slot.upgrade() else {
        // Handle dropped while we were starting.
        if let Ok(listener) = bound {
            listener.close();
        }
        return Err(ServerError::Stopped);
    };

    let mut guard = lock(&slot);
    match bound {
        Ok(listener) if guard.state == ServerState::Stopped => {
            drop(guard);
            warn!(port = %listener.port(), "Server stopped during start, closing listener");
            listener.close();
            Err(ServerError::Stopped)
        }
        Ok(listener) => {
            let port = listener.port();
            guard.state = ServerState::Running;
            guard.bound_port = Some(port);
            guard.listener = Some(listener);
            Ok(format!("http://localhost:{port}"))
        }
        Err(e) => {
            guard.state = ServerState::Stopped;
            Err(e)
        }
    }
}

async fn bind_listener(
    root_dir: &Path,
    preferred_port: Option<u16>,
    port_finder: &dyn PortFinder,
    site_server: &dyn SiteServer,
    logger: &dyn ScanLogger,
) -> Result<Box<dyn ListeningSite>, ServerError> {
    let port = port_finder.get_port(preferred_port).await?;
    if let Some(preferred) = preferred_port.filter(|&p| p != port) {
        logger.log_warn(&format!(
            "Port {preferred} is unavailable, falling back to port {port}"
        ));
    }
    logger.log_info(&format!("Using port {port}"));
    site_server.listen(root_dir, port).await
}

impl Drop for LocalSiteServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for LocalSiteServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = lock(&self.slot);
        f.debug_struct("LocalSiteServer")
            .field("root_dir", &self.root_dir)
            .field("state", &slot.state)
            .field("bound_port", &slot.bound_port)
            .finish_non_exhaustive()
    }
}
