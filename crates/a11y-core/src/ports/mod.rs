//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the scan cycle expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No socket, process or CI-platform types in any signature
//! - Every collaborator is injected, never looked up globally
//! - Errors that are shared between callers of one operation are `Clone`

pub mod logger;
pub mod scanner;
pub mod site_server;

use std::sync::Arc;

pub use logger::ScanLogger;
pub use scanner::{ScanError, SiteScanner};
pub use site_server::{ListeningSite, PortFinder, ServerError, SiteServer};

/// Container for all collaborator trait objects a scan cycle needs.
///
/// Lives in `a11y-core` so the orchestrator can accept it without depending
/// on `a11y-runtime`.
#[derive(Clone)]
pub struct ScanDeps {
    /// Finds an available TCP port for the local server.
    pub port_finder: Arc<dyn PortFinder>,
    /// Binds static-file listeners.
    pub site_server: Arc<dyn SiteServer>,
    /// Runs the accessibility scan against a URL.
    pub scanner: Arc<dyn SiteScanner>,
    /// Receives progress messages and tracked exceptions.
    pub logger: Arc<dyn ScanLogger>,
}

impl ScanDeps {
    /// Create a new dependency container.
    pub fn new(
        port_finder: Arc<dyn PortFinder>,
        site_server: Arc<dyn SiteServer>,
        scanner: Arc<dyn SiteScanner>,
        logger: Arc<dyn ScanLogger>,
    ) -> Self {
        Self {
            port_finder,
            site_server,
            scanner,
            logger,
        }
    }
}
