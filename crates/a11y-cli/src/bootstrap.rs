//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together.
//! All concrete adapters are instantiated here:
//! - Port finder, site server, scanner and logger (via a11y-runtime)
//! - The scan orchestrator (via a11y-core)

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use a11y_core::ports::ScanDeps;
use a11y_core::services::ScanOrchestrator;
use a11y_core::settings::{ScanSettings, validate_settings};
use a11y_runtime::{AxumSiteServer, CiLogger, CiPlatform, CommandScanner, LocalPortFinder};
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Validated scan settings.
    pub settings: ScanSettings,
    /// Scanner to launch for the page.
    pub scanner: CommandScanner,
    /// CI platform for log annotations.
    pub platform: CiPlatform,
}

impl CliConfig {
    /// Build and validate config from parsed arguments.
    pub fn from_cli(cli: &Cli, platform: CiPlatform) -> Result<Self, CliError> {
        let mut settings = ScanSettings::new(&cli.site_dir)
            .with_scan_path(cli.scan_path.clone())
            .with_timeout_ms(cli.timeout_ms)
            .with_fail_on_violations(cli.fail_on_violations);
        if let Some(port) = cli.local_port {
            settings = settings.with_local_port(port);
        }
        validate_settings(&settings)?;

        check_site_dir(&settings.site_dir)?;

        let scanner = CommandScanner::from_command_line(&cli.scanner)
            .ok_or_else(|| CliError::Config("Scanner command must not be empty".into()))?;

        Ok(Self {
            settings,
            scanner,
            platform,
        })
    }
}

/// The site directory must exist and be a directory. Failures other than
/// "not found" (permissions, I/O) are reported as I/O errors.
fn check_site_dir(site_dir: &Path) -> Result<(), CliError> {
    match fs::metadata(site_dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(CliError::Config(format!(
            "Site path is not a directory: {}",
            site_dir.display()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CliError::Config(format!(
            "Site directory does not exist: {}",
            site_dir.display()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Fully composed context for a scan run.
pub struct CliContext {
    /// The scan orchestrator.
    pub orchestrator: ScanOrchestrator,
    /// CI platform the run reports to.
    pub platform: CiPlatform,
}

impl CliContext {
    /// Whether violations fail the task.
    pub fn fail_on_violations(&self) -> bool {
        self.orchestrator.settings().fail_on_violations
    }
}

/// Bootstrap the CLI application.
///
/// This is the composition root. It creates every adapter and hands them to
/// the orchestrator as trait objects.
pub fn bootstrap(config: CliConfig) -> CliContext {
    debug!(
        platform = %config.platform,
        site_dir = %config.settings.site_dir.display(),
        scanner = %config.scanner.program(),
        "Bootstrapping scan"
    );

    let deps = ScanDeps::new(
        Arc::new(LocalPortFinder::new()),
        Arc::new(AxumSiteServer::new()),
        Arc::new(config.scanner),
        Arc::new(CiLogger::new(config.platform)),
    );

    CliContext {
        orchestrator: ScanOrchestrator::new(config.settings, deps),
        platform: config.platform,
    }
}
