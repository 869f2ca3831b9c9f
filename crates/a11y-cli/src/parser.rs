//! Main CLI parser.
//!
//! Every option can also come from the environment, which is how CI task
//! inputs reach the binary.

use std::path::PathBuf;

use a11y_core::settings::{DEFAULT_SCAN_PATH, DEFAULT_SCAN_TIMEOUT_MS};
use clap::Parser;

/// Default scanner: axe's CLI printing JSON results to stdout.
pub const DEFAULT_SCANNER: &str = "npx --yes @axe-core/cli --stdout";

/// Serve a built site locally and scan it for accessibility issues.
#[derive(Debug, Parser)]
#[command(name = "a11y-ci")]
#[command(about = "Serve a local site build and run an accessibility scan against it")]
#[command(version)]
pub struct Cli {
    /// Directory containing the built site
    #[arg(long = "site-dir", env = "A11Y_SITE_DIR")]
    pub site_dir: PathBuf,

    /// Path of the page to scan, relative to the site root
    #[arg(long = "scan-path", env = "A11Y_SCAN_PATH", default_value = DEFAULT_SCAN_PATH)]
    pub scan_path: String,

    /// Port to try first for the local server
    #[arg(long = "local-port", env = "A11Y_LOCAL_PORT")]
    pub local_port: Option<u16>,

    /// Give up on the scan after this many milliseconds
    #[arg(long = "timeout-ms", env = "A11Y_TIMEOUT_MS", default_value_t = DEFAULT_SCAN_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Fail the task when the scanner reports violations
    #[arg(long = "fail-on-violations", env = "A11Y_FAIL_ON_VIOLATIONS")]
    pub fail_on_violations: bool,

    /// Scanner command line; the page URL is appended as the last argument
    #[arg(long = "scanner", env = "A11Y_SCANNER", default_value = DEFAULT_SCANNER)]
    pub scanner: String,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
