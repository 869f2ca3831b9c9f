//! Core services - the scan cycle's business logic layer.
//!
//! Services here are pure orchestrators over ports; they don't know about
//! concrete implementations.

mod local_site_server;
mod scan_orchestrator;

pub use local_site_server::{LocalSiteServer, StartFuture};
pub use scan_orchestrator::{ScanOrchestrator, resolve_scan_url};
