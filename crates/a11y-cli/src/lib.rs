//! a11y-ci command-line adapter.
//!
//! Parses task inputs, wires the runtime adapters into the core orchestrator
//! and maps the scan outcome to a process exit code.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dependencies used only by the binary target
use anyhow as _;
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod error;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use error::CliError;
pub use parser::Cli;
