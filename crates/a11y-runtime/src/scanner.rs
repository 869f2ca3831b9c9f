//! Scanner collaborator that shells out to an external accessibility tool.
//!
//! The tool receives the page URL as its last argument. Output that looks
//! like axe results (an object with a `violations` array, or an array of
//! such objects) is summarised into a violation count.

use std::process::Stdio;

use a11y_core::domain::ScanReport;
use a11y_core::ports::{ScanError, SiteScanner};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

/// Runs `program args.. <url>` and interprets its stdout.
#[derive(Debug, Clone)]
pub struct CommandScanner {
    program: String,
    args: Vec<String>,
}

impl CommandScanner {
    /// Create a scanner for `program` with leading `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace-separated command line.
    ///
    /// Returns `None` for an empty command line.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// Program that will be launched.
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl SiteScanner for CommandScanner {
    async fn scan(&self, url: &Url) -> Result<ScanReport, ScanError> {
        debug!(program = %self.program, args = ?self.args, url = %url, "Launching scanner");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ScanError::Launch(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = ?output.status.code(), "Scanner reported failure");
            return Err(ScanError::Exited {
                code: output.status.code(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = interpret_output(url.as_str(), &stdout);
        info!(
            url = %url,
            violations = ?report.violation_count,
            "Scanner finished"
        );
        Ok(report)
    }
}

/// Summarise scanner stdout into a [`ScanReport`].
pub fn interpret_output(url: &str, stdout: &str) -> ScanReport {
    let violation_count = serde_json::from_str::<Value>(stdout.trim())
        .ok()
        .and_then(|value| count_violations(&value));
    ScanReport::new(url, violation_count)
}

fn count_violations(value: &Value) -> Option<usize> {
    match value {
        Value::Object(map) => map.get("violations")?.as_array().map(Vec::len),
        Value::Array(results) => results.iter().map(count_violations).sum(),
        _ => None,
    }
}
