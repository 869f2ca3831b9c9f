//! OS and network adapters for a11y-ci.
//!
//! Each module implements one port from `a11y_core::ports`:
//!
//! - [`port_finder`]: [`PortFinder`](a11y_core::ports::PortFinder) on the local TCP stack
//! - [`site_server`]: [`SiteServer`](a11y_core::ports::SiteServer) with axum + `ServeDir`
//! - [`scanner`]: [`SiteScanner`](a11y_core::ports::SiteScanner) via an external command
//! - [`logger`]: [`ScanLogger`](a11y_core::ports::ScanLogger) for CI runners
#![deny(unsafe_code)]

pub mod ci;
pub mod logger;
pub mod port_finder;
pub mod scanner;
pub mod site_server;

pub use ci::{AnnotationLevel, CiPlatform};
pub use logger::CiLogger;
pub use port_finder::{LocalPortFinder, is_port_available};
pub use scanner::{CommandScanner, interpret_output};
pub use site_server::{AxumSiteServer, static_site_router};
