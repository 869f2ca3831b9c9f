//! Port for the external accessibility scanner.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::ScanReport;

/// Errors from running a scan. Opaque to the orchestrator.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scanner could not be started.
    #[error("Failed to launch scanner: {0}")]
    Launch(String),

    /// The scanner ran and reported failure.
    #[error("Scanner exited with status {code:?}: {stderr}")]
    Exited { code: Option<i32>, stderr: String },
}

/// Runs an accessibility scan against a URL.
#[async_trait]
pub trait SiteScanner: Send + Sync {
    async fn scan(&self, url: &Url) -> Result<ScanReport, ScanError>;
}
