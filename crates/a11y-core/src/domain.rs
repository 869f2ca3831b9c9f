//! Domain types for scan cycles.
//!
//! These are process-lifetime values, never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{ScanError, ServerError};

/// Lifecycle state of a [`LocalSiteServer`](crate::services::LocalSiteServer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerState {
    /// `start()` has never been called.
    Idle,
    /// A start operation is in flight.
    Starting,
    /// The listener is bound and serving.
    Running,
    /// `stop()` was called or the start failed.
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Starting => write!(f, "Starting"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Summary produced by a scanner for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// The URL that was scanned.
    pub url: String,
    /// Number of violations, when the scanner reported them in a known shape.
    pub violation_count: Option<usize>,
    /// Whether the page passed.
    pub passed: bool,
}

impl ScanReport {
    /// Build a report; a page passes unless a positive violation count is known.
    #[must_use]
    pub fn new(url: impl Into<String>, violation_count: Option<usize>) -> Self {
        Self {
            url: url.into(),
            violation_count,
            passed: violation_count.is_none_or(|count| count == 0),
        }
    }
}

/// The scan URL could not be derived from the server's base URL.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The base URL or the joined URL is malformed.
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    /// The relative path points somewhere other than the local site.
    #[error("{url} is not on the local site {base_url}")]
    ForeignOrigin { base_url: String, url: String },
}

/// An error captured inside a scan cycle.
///
/// These are tracked and logged, never rethrown out of the cycle.
#[derive(Debug, Error)]
pub enum ScanFailure {
    /// The scan URL could not be built from the base URL and relative path.
    #[error("Failed to resolve scan URL: {0}")]
    Resolution(#[from] ResolutionError),

    /// The local site server could not be started.
    #[error(transparent)]
    ServerStart(#[from] ServerError),

    /// The scanner itself failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The cycle task ended without producing an outcome (e.g. it panicked).
    #[error("Scan task ended unexpectedly: {0}")]
    Internal(String),
}

/// Terminal result of one scan cycle.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The scanner ran to completion.
    Succeeded(ScanReport),
    /// The deadline elapsed before the cycle finished.
    TimedOut,
    /// Something inside the cycle failed; it has already been tracked.
    Failed(ScanFailure),
}

impl ScanOutcome {
    /// Process exit code for this outcome.
    ///
    /// Only a timeout is fatal on its own. Violations fail the task when
    /// `fail_on_violations` is set.
    pub fn exit_code(&self, fail_on_violations: bool) -> i32 {
        match self {
            Self::TimedOut => 1,
            Self::Succeeded(report) if fail_on_violations && !report.passed => 1,
            Self::Succeeded(_) | Self::Failed(_) => 0,
        }
    }

    /// Whether the outcome is the timeout variant.
    pub const fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}
