//! Scan orchestrator - runs one full scan cycle under a deadline.
//!
//! A cycle is: start the local server, resolve the scan URL, run the
//! scanner, stop the server, report. Errors inside the cycle are tracked and
//! turned into [`ScanOutcome::Failed`]; only the deadline produces
//! [`ScanOutcome::TimedOut`].
//!
//! The cycle runs as a spawned task. When the deadline wins, the task is
//! detached, not cancelled: it may keep running until the process exits, and
//! its cleanup is then not guaranteed.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::deadline::wait_for;
use crate::domain::{ResolutionError, ScanFailure, ScanOutcome, ScanReport};
use crate::ports::ScanDeps;
use crate::services::LocalSiteServer;
use crate::settings::ScanSettings;

/// Shown in log lines when the scan URL was never resolved.
const UNRESOLVED_URL: &str = "<unresolved>";

/// Join the server's base URL with a relative scan path.
///
/// `http://localhost:4321` + `/index.html` gives
/// `http://localhost:4321/index.html`. The result must stay on the base URL's
/// scheme, host and port.
pub fn resolve_scan_url(base_url: &str, relative_path: &str) -> Result<Url, ResolutionError> {
    let base = Url::parse(base_url)?;
    let url = base.join(relative_path)?;
    if url.origin() != base.origin() {
        return Err(ResolutionError::ForeignOrigin {
            base_url: base.to_string(),
            url: url.to_string(),
        });
    }
    Ok(url)
}

/// Service that runs scan cycles.
///
/// Reusable across cycles; each [`scan`](Self::scan) builds its own
/// [`LocalSiteServer`]. Overlapping calls are not supported.
#[derive(Clone)]
pub struct ScanOrchestrator {
    settings: ScanSettings,
    deps: ScanDeps,
}

impl ScanOrchestrator {
    /// Create a new orchestrator.
    pub fn new(settings: ScanSettings, deps: ScanDeps) -> Self {
        Self { settings, deps }
    }

    /// Settings this orchestrator was built with.
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Run one scan cycle, giving up after the configured deadline.
    pub async fn scan(&self) -> ScanOutcome {
        let cycle = tokio::spawn(invoke_scan(self.settings.clone(), self.deps.clone()));
        let logger = Arc::clone(&self.deps.logger);

        debug!(timeout_ms = %self.settings.scan_timeout_ms, "Scan cycle submitted");

        wait_for(
            async move {
                match cycle.await {
                    Ok(outcome) => outcome,
                    Err(join_err) => {
                        ScanOutcome::Failed(ScanFailure::Internal(join_err.to_string()))
                    }
                }
            },
            self.settings.scan_timeout(),
            move || async move {
                logger.log_error("Unable to scan before timeout");
                ScanOutcome::TimedOut
            },
        )
        .await
    }
}

/// One scan cycle. Never returns an error; failures are tracked here.
async fn invoke_scan(settings: ScanSettings, deps: ScanDeps) -> ScanOutcome {
    let server = LocalSiteServer::new(
        settings.site_dir.clone(),
        settings.local_port,
        Arc::clone(&deps.port_finder),
        Arc::clone(&deps.site_server),
        Arc::clone(&deps.logger),
    );

    let mut scan_url = None;
    let result = run_cycle(&server, &settings, &deps, &mut scan_url).await;
    let shown_url = scan_url
        .as_ref()
        .map_or_else(|| UNRESOLVED_URL.to_string(), Url::to_string);

    if let Err(failure) = &result {
        deps.logger.track_exception(
            failure,
            &format!("An error occurred while scanning website page {shown_url}."),
        );
    }

    server.stop();
    deps.logger
        .log_info(&format!("Accessibility scanning of URL {shown_url} completed."));

    match result {
        Ok(report) => {
            info!(
                url = %report.url,
                violations = ?report.violation_count,
                passed = %report.passed,
                "Scan cycle finished"
            );
            ScanOutcome::Succeeded(report)
        }
        Err(failure) => ScanOutcome::Failed(failure),
    }
}

async fn run_cycle(
    server: &LocalSiteServer,
    settings: &ScanSettings,
    deps: &ScanDeps,
    scan_url: &mut Option<Url>,
) -> Result<ScanReport, ScanFailure> {
    let base_url = server.start().await?;
    let url = scan_url.insert(resolve_scan_url(
        &base_url,
        &settings.scan_url_relative_path,
    )?);

    deps.logger
        .log_info(&format!("Starting accessibility scanning of URL {url}."));

    Ok(deps.scanner.scan(url).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortFinder, ScanError, ScanLogger, SiteScanner, SiteServer};
    use crate::services::local_site_server::tests::{
        FakeSiteServer, FixedPortFinder, NoPortFinder, RecordingLogger,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    enum Behavior {
        Pass(Option<usize>),
        Fail,
        Hang,
        Slow(Duration),
    }

    struct FakeScanner {
        behavior: Behavior,
        urls: Mutex<Vec<String>>,
    }

    impl FakeScanner {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                urls: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl SiteScanner for FakeScanner {
        async fn scan(&self, url: &Url) -> Result<ScanReport, ScanError> {
            self.urls.lock().unwrap().push(url.to_string());
            match self.behavior {
                Behavior::Pass(count) => Ok(ScanReport::new(url.as_str(), count)),
                Behavior::Fail => Err(ScanError::Exited {
                    code: Some(2),
                    stderr: "chrome crashed".into(),
                }),
                Behavior::Hang => std::future::pending().await,
                Behavior::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(ScanReport::new(url.as_str(), Some(0)))
                }
            }
        }
    }

    struct Harness {
        site: Arc<FakeSiteServer>,
        scanner: Arc<FakeScanner>,
        logger: Arc<RecordingLogger>,
        orchestrator: ScanOrchestrator,
    }

    fn harness(
        settings: ScanSettings,
        port_finder: Arc<dyn PortFinder>,
        behavior: Behavior,
    ) -> Harness {
        let site = Arc::new(FakeSiteServer::default());
        let scanner = Arc::new(FakeScanner::new(behavior));
        let logger = Arc::new(RecordingLogger::default());
        let deps = ScanDeps::new(
            port_finder,
            Arc::clone(&site) as Arc<dyn SiteServer>,
            Arc::clone(&scanner) as Arc<dyn SiteScanner>,
            Arc::clone(&logger) as Arc<dyn ScanLogger>,
        );
        Harness {
            site,
            scanner,
            logger,
            orchestrator: ScanOrchestrator::new(settings, deps),
        }
    }

    fn settings() -> ScanSettings {
        ScanSettings::new("site").with_scan_path("/index.html")
    }

    #[test]
    fn resolves_relative_path_against_base_url() {
        let url = resolve_scan_url("http://localhost:4321", "/index.html").unwrap();
        assert_eq!(url.as_str(), "http://localhost:4321/index.html");

        let root = resolve_scan_url("http://localhost:4321", "/").unwrap();
        assert_eq!(root.as_str(), "http://localhost:4321/");
    }

    #[test]
    fn rejects_malformed_relative_path() {
        assert!(matches!(
            resolve_scan_url("http://localhost:4321", "//bad host/"),
            Err(ResolutionError::Parse(_))
        ));
    }

    #[test]
    fn rejects_paths_that_leave_the_local_site() {
        for path in [
            "//example.com/page.html",
            "https://example.com/",
            "//localhost:9999/index.html",
        ] {
            let err = resolve_scan_url("http://localhost:4321", path).unwrap_err();
            assert!(
                matches!(err, ResolutionError::ForeignOrigin { .. }),
                "{path} resolved to {err}"
            );
        }
    }

    #[tokio::test]
    async fn successful_cycle_logs_start_and_completion() {
        let h = harness(
            settings(),
            Arc::new(FixedPortFinder(4321)),
            Behavior::Pass(Some(0)),
        );

        let outcome = h.orchestrator.scan().await;

        let report = match outcome {
            ScanOutcome::Succeeded(report) => report,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(report.url, "http://localhost:4321/index.html");
        assert_eq!(
            h.scanner.urls.lock().unwrap().clone(),
            vec!["http://localhost:4321/index.html".to_string()]
        );
        assert_eq!(
            h.logger.infos(),
            vec![
                "Using port 4321".to_string(),
                "Starting accessibility scanning of URL http://localhost:4321/index.html."
                    .to_string(),
                "Accessibility scanning of URL http://localhost:4321/index.html completed."
                    .to_string(),
            ]
        );
        assert_eq!(h.site.listens.load(Ordering::SeqCst), 1);
        assert_eq!(h.site.closes.load(Ordering::SeqCst), 1);
        assert!(h.logger.exceptions().is_empty());
    }

    #[tokio::test]
    async fn never_settling_scan_with_zero_timeout_times_out() {
        let h = harness(
            settings().with_timeout_ms(0),
            Arc::new(FixedPortFinder(4321)),
            Behavior::Hang,
        );

        let outcome = h.orchestrator.scan().await;

        assert!(outcome.is_timed_out());
        assert_eq!(outcome.exit_code(false), 1);
        assert_eq!(
            h.logger.errors(),
            vec!["Unable to scan before timeout".to_string()]
        );
    }

    #[tokio::test]
    async fn scanner_error_is_tracked_and_cycle_completes() {
        let h = harness(settings(), Arc::new(FixedPortFinder(4321)), Behavior::Fail);

        let outcome = h.orchestrator.scan().await;

        assert!(matches!(outcome, ScanOutcome::Failed(ScanFailure::Scan(_))));
        assert_eq!(outcome.exit_code(false), 0);
        assert_eq!(
            h.logger.exceptions(),
            vec![(
                "Scanner exited with status Some(2): chrome crashed".to_string(),
                "An error occurred while scanning website page http://localhost:4321/index.html."
                    .to_string(),
            )]
        );
        assert_eq!(
            h.logger.infos().last().map(String::as_str),
            Some("Accessibility scanning of URL http://localhost:4321/index.html completed.")
        );
        assert_eq!(h.site.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_start_error_reports_unresolved_url() {
        let h = harness(settings(), Arc::new(NoPortFinder), Behavior::Pass(None));

        let outcome = h.orchestrator.scan().await;

        assert!(matches!(
            outcome,
            ScanOutcome::Failed(ScanFailure::ServerStart(_))
        ));
        assert_eq!(
            h.logger.exceptions()[0].1,
            "An error occurred while scanning website page <unresolved>."
        );
        assert_eq!(
            h.logger.infos(),
            vec!["Accessibility scanning of URL <unresolved> completed.".to_string()]
        );
        assert!(h.scanner.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolution_error_stops_server_before_scanning() {
        let h = harness(
            ScanSettings::new("site").with_scan_path("//bad host/"),
            Arc::new(FixedPortFinder(4321)),
            Behavior::Pass(None),
        );

        let outcome = h.orchestrator.scan().await;

        assert!(matches!(
            outcome,
            ScanOutcome::Failed(ScanFailure::Resolution(_))
        ));
        assert_eq!(h.logger.exceptions().len(), 1);
        assert_eq!(h.site.closes.load(Ordering::SeqCst), 1);
        assert!(h.scanner.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_scan_path_is_never_scanned() {
        let h = harness(
            ScanSettings::new("site").with_scan_path("//example.com/page.html"),
            Arc::new(FixedPortFinder(4321)),
            Behavior::Pass(None),
        );

        let outcome = h.orchestrator.scan().await;

        assert!(matches!(
            outcome,
            ScanOutcome::Failed(ScanFailure::Resolution(ResolutionError::ForeignOrigin { .. }))
        ));
        assert!(h.scanner.urls.lock().unwrap().is_empty());
        assert_eq!(h.site.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_cycle_keeps_running_in_background() {
        let h = harness(
            settings().with_timeout_ms(1_000),
            Arc::new(FixedPortFinder(4321)),
            Behavior::Slow(Duration::from_secs(5)),
        );

        let outcome = h.orchestrator.scan().await;
        assert!(outcome.is_timed_out());
        assert_eq!(h.site.closes.load(Ordering::SeqCst), 0);

        // The abandoned cycle still finishes and cleans up on its own.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.site.closes.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.logger.infos().last().map(String::as_str),
            Some("Accessibility scanning of URL http://localhost:4321/index.html completed.")
        );
    }

    #[tokio::test]
    async fn orchestrator_is_reusable_across_cycles() {
        let h = harness(
            settings(),
            Arc::new(FixedPortFinder(4321)),
            Behavior::Pass(Some(1)),
        );

        let first = h.orchestrator.scan().await;
        let second = h.orchestrator.scan().await;

        assert!(matches!(first, ScanOutcome::Succeeded(_)));
        assert_eq!(second.exit_code(true), 1);
        assert_eq!(h.site.listens.load(Ordering::SeqCst), 2);
        assert_eq!(h.site.closes.load(Ordering::SeqCst), 2);
    }
}
