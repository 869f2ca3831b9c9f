//! [`ScanLogger`] that writes through `tracing` and, on CI, emits the
//! platform's annotation commands so warnings and errors surface in the UI.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use a11y_core::ports::ScanLogger;
use tracing::{error, info, warn};

use crate::ci::{AnnotationLevel, CiPlatform};

/// Logger for CI runs.
pub struct CiLogger {
    platform: CiPlatform,
    out: Mutex<Box<dyn Write + Send>>,
}

impl CiLogger {
    /// Logger writing annotations to stdout, where CI runners read them.
    pub fn new(platform: CiPlatform) -> Self {
        Self::with_writer(platform, Box::new(io::stdout()))
    }

    /// Logger writing annotations to `out`.
    pub fn with_writer(platform: CiPlatform, out: Box<dyn Write + Send>) -> Self {
        Self {
            platform,
            out: Mutex::new(out),
        }
    }

    pub const fn platform(&self) -> CiPlatform {
        self.platform
    }

    fn annotate(&self, level: AnnotationLevel, message: &str) {
        let Some(line) = self.platform.annotation(level, message) else {
            return;
        };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Logging is fire-and-forget; a closed stdout must not fail the scan.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

impl ScanLogger for CiLogger {
    fn log_info(&self, message: &str) {
        info!("{message}");
    }

    fn log_warn(&self, message: &str) {
        warn!("{message}");
        self.annotate(AnnotationLevel::Warning, message);
    }

    fn log_error(&self, message: &str) {
        error!("{message}");
        self.annotate(AnnotationLevel::Error, message);
    }

    fn track_exception(&self, err: &(dyn Error + 'static), message: &str) {
        let mut chain = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }

        error!(error = %chain, "{message}");
        self.annotate(AnnotationLevel::Error, &format!("{message} {chain}"));
    }
}

impl fmt::Debug for CiLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CiLogger")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}
