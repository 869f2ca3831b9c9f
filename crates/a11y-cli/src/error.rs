//! CLI-specific error types and exit code mapping.

use a11y_core::settings::SettingsError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 74,     // EX_IOERR
            Self::Config(_) => 78, // EX_CONFIG
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_errors_are_config_errors() {
        let err = CliError::from(SettingsError::ZeroTimeout);
        assert_eq!(err.exit_code(), 78);
        assert_eq!(
            err.to_string(),
            "Configuration error: Scan timeout must be greater than zero"
        );
    }

    #[test]
    fn io_errors_map_to_ioerr() {
        let err = CliError::from(std::io::Error::other("disk gone"));
        assert_eq!(err.exit_code(), 74);
    }
}
