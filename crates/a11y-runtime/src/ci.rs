//! CI platform detection and platform-native log commands.

use std::fmt;

/// Severity of an annotation surfaced in the CI UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationLevel {
    Warning,
    Error,
}

/// The CI platform the task is running under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiPlatform {
    GitHubActions,
    AzureDevOps,
    /// Not running under a recognised CI; no annotations are emitted.
    #[default]
    Local,
}

impl CiPlatform {
    /// Detect the platform from the process environment.
    pub fn detect() -> Self {
        Self::detect_from(|key| std::env::var(key).ok())
    }

    /// Detect the platform using `lookup` for environment variables.
    pub fn detect_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_true = |key: &str| lookup(key).is_some_and(|v| v.eq_ignore_ascii_case("true"));

        if is_true("GITHUB_ACTIONS") {
            Self::GitHubActions
        } else if is_true("TF_BUILD") {
            Self::AzureDevOps
        } else {
            Self::Local
        }
    }

    /// Render an annotation command for this platform.
    ///
    /// Returns `None` when the platform has no annotation syntax.
    pub fn annotation(self, level: AnnotationLevel, message: &str) -> Option<String> {
        match self {
            Self::GitHubActions => {
                let command = match level {
                    AnnotationLevel::Warning => "warning",
                    AnnotationLevel::Error => "error",
                };
                Some(format!("::{command}::{}", escape_github(message)))
            }
            Self::AzureDevOps => {
                let kind = match level {
                    AnnotationLevel::Warning => "warning",
                    AnnotationLevel::Error => "error",
                };
                Some(format!(
                    "##vso[task.logissue type={kind}]{}",
                    escape_azure(message)
                ))
            }
            Self::Local => None,
        }
    }
}

impl fmt::Display for CiPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHubActions => write!(f, "GitHub Actions"),
            Self::AzureDevOps => write!(f, "Azure DevOps"),
            Self::Local => write!(f, "local"),
        }
    }
}

fn escape_github(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_azure(message: &str) -> String {
    message
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
