//! Logger port for CI-visible messages.

use std::error::Error;

/// Fire-and-forget logging and exception tracking.
///
/// Implementations decide how messages reach the CI platform; the scan cycle
/// never consumes a return value.
pub trait ScanLogger: Send + Sync {
    fn log_info(&self, message: &str);

    fn log_warn(&self, message: &str);

    fn log_error(&self, message: &str);

    /// Record an error that was caught and recovered from.
    fn track_exception(&self, error: &(dyn Error + 'static), message: &str);
}
