//! Scan settings and validation.
//!
//! Pure domain types with no infrastructure dependencies. The CLI fills these
//! from flags and environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadline for a whole scan cycle, in milliseconds.
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 90_000;

/// Path scanned when none is configured.
pub const DEFAULT_SCAN_PATH: &str = "/";

/// Settings for one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Directory served by the local server.
    pub site_dir: PathBuf,
    /// Path joined onto the server's base URL to get the page to scan.
    pub scan_url_relative_path: String,
    /// Port to try first for the local server.
    pub local_port: Option<u16>,
    /// Deadline for the whole cycle.
    pub scan_timeout_ms: u64,
    /// Fail the task when the scanner reports violations.
    pub fail_on_violations: bool,
}

impl ScanSettings {
    /// Create settings for `site_dir` with defaults for everything else.
    #[must_use]
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_dir: site_dir.into(),
            scan_url_relative_path: DEFAULT_SCAN_PATH.to_string(),
            local_port: None,
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
            fail_on_violations: false,
        }
    }

    /// Set the path to scan.
    #[must_use]
    pub fn with_scan_path(mut self, path: impl Into<String>) -> Self {
        self.scan_url_relative_path = path.into();
        self
    }

    /// Set the preferred local port.
    #[must_use]
    pub const fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }

    /// Set the cycle deadline in milliseconds.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.scan_timeout_ms = timeout_ms;
        self
    }

    /// Fail on reported violations.
    #[must_use]
    pub const fn with_fail_on_violations(mut self, fail: bool) -> Self {
        self.fail_on_violations = fail;
        self
    }

    /// The cycle deadline as a [`Duration`].
    #[must_use]
    pub const fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Site directory must not be empty")]
    EmptySiteDir,

    #[error("Scan path must be relative to the local site, got {0}")]
    AbsoluteScanUrl(String),

    #[error("Scan timeout must be greater than zero")]
    ZeroTimeout,
}

/// `//host/...` or any slash/backslash mix of it: joins onto another host.
fn is_scheme_relative(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('/' | '\\'), Some('/' | '\\'))
    )
}

/// Validate settings before a scan cycle is built from them.
pub fn validate_settings(settings: &ScanSettings) -> Result<(), SettingsError> {
    if settings.site_dir.as_os_str().is_empty() {
        return Err(SettingsError::EmptySiteDir);
    }

    if settings.scan_url_relative_path.contains("://")
        || is_scheme_relative(&settings.scan_url_relative_path)
    {
        return Err(SettingsError::AbsoluteScanUrl(
            settings.scan_url_relative_path.clone(),
        ));
    }

    if settings.scan_timeout_ms == 0 {
        return Err(SettingsError::ZeroTimeout);
    }

    Ok(())
}
