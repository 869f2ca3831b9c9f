//! Core domain types, ports and services for a11y-ci.
//!
//! This crate knows nothing about sockets, processes or CI platforms. Those
//! live behind the traits in [`ports`] and are wired together by the CLI
//! composition root.
#![deny(unused_crate_dependencies)]

pub mod deadline;
pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use deadline::{DeadlineElapsed, race, wait_for};
pub use domain::{ResolutionError, ScanFailure, ScanOutcome, ScanReport, ServerState};
pub use ports::{
    ListeningSite, PortFinder, ScanDeps, ScanError, ScanLogger, ServerError, SiteScanner,
    SiteServer,
};
pub use services::{LocalSiteServer, ScanOrchestrator, StartFuture, resolve_scan_url};
pub use settings::{
    DEFAULT_SCAN_PATH, DEFAULT_SCAN_TIMEOUT_MS, ScanSettings, SettingsError, validate_settings,
};
