//! Run command handler

use pageprobe::{
    run_suite, CapturePolicy, CheckMode, CheckReport, LeadDetails, PageDriver, ProbeConfig,
    ProbeResult, ProductPage,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::commands::RunArgs;
use crate::error::CliResult;
use crate::output::Reporter;

/// Fold command-line overrides into the configuration and validate it
pub fn prepare(config: ProbeConfig, args: &RunArgs) -> CliResult<ProbeConfig> {
    let mut config = config;
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(path) = &args.path {
        config = config.with_page_path(path.clone());
    }
    if args.headed {
        config = config.with_headless(false);
    }
    config.validate()?;
    Ok(config)
}

/// Run the suite, re-running a failing page up to `retries` more times.
///
/// The report of the last attempt is returned.
pub async fn run_with_retries<D: PageDriver>(
    page: &mut ProductPage<D>,
    lead: &LeadDetails,
    mode: CheckMode,
    retries: u32,
    reporter: &Reporter,
) -> ProbeResult<CheckReport> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let report = run_suite(page, lead, mode).await?;
        if report.all_passed() || attempt > retries {
            info!(attempt, passed = report.passed(), total = report.total(), "run finished");
            return Ok(report);
        }
        warn!(attempt, failed = report.total() - report.passed(), "retrying failed run");
        reporter.warning(&format!(
            "attempt {attempt} failed ({report}); retrying"
        ));
    }
}

/// Write the report as JSON when the capture policy asks for it
pub fn keep_report(
    report: &CheckReport,
    dir: &Path,
    policy: CapturePolicy,
) -> CliResult<Option<PathBuf>> {
    let keep = match policy {
        CapturePolicy::Never => false,
        CapturePolicy::OnFailure => !report.all_passed(),
        CapturePolicy::Always => true,
    };
    if !keep {
        return Ok(None);
    }
    std::fs::create_dir_all(dir)?;
    let path = dir.join("report.json");
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(Some(path))
}

/// Execute the run command against a live browser
#[cfg(feature = "browser")]
pub async fn execute_run(
    config: ProbeConfig,
    args: &RunArgs,
    reporter: &Reporter,
) -> CliResult<CheckReport> {
    use pageprobe::CdpDriver;
    use std::sync::Arc;

    let config = prepare(config, args)?;
    let url = config.url_for(&config.page_path);
    reporter.header(&format!("pageprobe {url}"));

    let driver = Arc::new(CdpDriver::launch(&config.browser).await?);
    let retries = config.retries;
    let capture = config.capture;
    let mut page = ProductPage::new(Arc::clone(&driver), config)?;
    let lead = LeadDetails::new(&args.zip, &args.email, &args.phone);

    let outcome = run_with_retries(&mut page, &lead, args.mode(), retries, reporter).await;
    if let Err(e) = driver.close().await {
        warn!(error = %e, "browser did not close cleanly");
    }
    let report = outcome?;

    reporter.report(&report);
    if let Some(path) = keep_report(&report, &args.output, capture)? {
        reporter.info(&format!("report written to {}", path.display()));
    }
    Ok(report)
}

/// Execute the run command; this build cannot drive a browser
#[cfg(not(feature = "browser"))]
pub async fn execute_run(
    config: ProbeConfig,
    args: &RunArgs,
    _reporter: &Reporter,
) -> CliResult<CheckReport> {
    let _ = prepare(config, args)?;
    Err(crate::error::CliError::feature_disabled("run", "browser"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use pageprobe::{FakeDom, MockDriver, Timeouts};
    use std::sync::Arc;
    use std::time::Duration;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["run"];
        argv.extend_from_slice(extra);
        RunArgs::parse_from(argv)
    }

    mod prepare_tests {
        use super::*;

        #[test]
        fn test_flags_override_config() {
            let args = run_args(&["--base-url", "https://dealer.test", "-p", "/cars/42", "--headed"]);
            let config = prepare(ProbeConfig::default(), &args).unwrap();
            assert_eq!(config.url_for(&config.page_path), "https://dealer.test/cars/42");
            assert!(!config.browser.headless);
        }

        #[test]
        fn test_invalid_base_url_is_rejected() {
            let args = run_args(&["--base-url", "dealer.test"]);
            assert!(prepare(ProbeConfig::default(), &args).is_err());
        }
    }

    mod retry_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_failing_page_is_retried() {
            let driver = Arc::new(MockDriver::new(FakeDom::default()));
            let config = ProbeConfig::default()
                .with_base_url("https://dealer.test")
                .with_timeouts(Timeouts {
                    navigation_ms: 200,
                    ..Timeouts::default()
                });
            let mut page = ProductPage::new(Arc::clone(&driver), config).unwrap();
            let lead = LeadDetails::new("12345", "qa@example.com", "5551234567");
            let reporter = Reporter::new(false, true);

            let report = run_with_retries(&mut page, &lead, CheckMode::Collect, 2, &reporter)
                .await
                .unwrap();
            assert!(!report.all_passed());
            assert_eq!(report.total(), 1);
            let navigations = driver
                .history()
                .iter()
                .filter(|call| call.starts_with("navigate:"))
                .count();
            assert_eq!(navigations, 3);
        }
    }

    mod report_tests {
        use super::*;

        fn failed_report() -> CheckReport {
            let mut report = CheckReport::new();
            let _ = report.record::<()>(
                "page loads",
                Duration::from_millis(5),
                Err(pageprobe::ProbeError::not_found("product", ".product-slider-main")),
            );
            report
        }

        #[test]
        fn test_on_failure_keeps_failed_report() {
            let dir = tempfile::tempdir().unwrap();
            let path = keep_report(&failed_report(), dir.path(), CapturePolicy::OnFailure)
                .unwrap()
                .unwrap();
            let json: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(json["outcomes"][0]["name"], "page loads");
            assert_eq!(json["outcomes"][0]["passed"], false);
        }

        #[test]
        fn test_on_failure_skips_clean_report() {
            let dir = tempfile::tempdir().unwrap();
            let kept = keep_report(&CheckReport::new(), dir.path(), CapturePolicy::OnFailure).unwrap();
            assert!(kept.is_none());
        }

        #[test]
        fn test_never_keeps_nothing() {
            let dir = tempfile::tempdir().unwrap();
            let kept = keep_report(&failed_report(), dir.path(), CapturePolicy::Never).unwrap();
            assert!(kept.is_none());
        }

        #[test]
        fn test_always_creates_directory() {
            let dir = tempfile::tempdir().unwrap();
            let nested = dir.path().join("runs").join("latest");
            let kept = keep_report(&CheckReport::new(), &nested, CapturePolicy::Always).unwrap();
            assert_eq!(kept, Some(nested.join("report.json")));
        }
    }
}
