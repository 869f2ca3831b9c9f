//! CLI entry point - the composition root.
//!
//! This is the only place that terminates the process: the orchestrator
//! reports a timeout as a value and the exit code is decided here.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use a11y_cli::{Cli, CliConfig, bootstrap};
use a11y_core::domain::ScanOutcome;
use a11y_runtime::CiPlatform;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let platform = CiPlatform::detect();
    let config = match CliConfig::from_cli(&cli, platform) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    info!(platform = %platform, "Starting accessibility scan");
    let ctx = bootstrap(config);
    let outcome = ctx.orchestrator.scan().await;

    match &outcome {
        ScanOutcome::Succeeded(report) => info!(
            url = %report.url,
            violations = ?report.violation_count,
            passed = %report.passed,
            "Scan succeeded"
        ),
        ScanOutcome::TimedOut => error!("Scan timed out"),
        ScanOutcome::Failed(failure) => error!("Scan failed: {failure}"),
    }

    let code = outcome.exit_code(ctx.fail_on_violations());
    if code != 0 {
        // An abandoned scan may still be running; exiting ends it.
        std::process::exit(code);
    }
    Ok(())
}
