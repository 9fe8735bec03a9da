//! Output formatting for check results

use console::{style, Style, Term};
use pageprobe::{CheckOutcome, CheckReport};

/// Writes check progress and results to stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one check outcome
    pub fn outcome(&self, outcome: &CheckOutcome) {
        let line = format!("{} ({}ms)", outcome.name, outcome.duration.as_millis());
        if outcome.passed {
            self.success(&line);
            return;
        }
        self.failure(&line);
        if let Some(message) = &outcome.message {
            let detail = if outcome.timed_out {
                format!("    timed out: {message}")
            } else {
                format!("    {message}")
            };
            let _ = self.term.write_line(&detail);
        }
    }

    /// Print every outcome followed by the summary line
    pub fn report(&self, report: &CheckReport) {
        for outcome in report.outcomes() {
            self.outcome(outcome);
        }
        self.summary(report);
    }

    /// Print the summary line
    pub fn summary(&self, report: &CheckReport) {
        let failed = report.total() - report.passed();
        if self.quiet && failed == 0 {
            return;
        }
        let _ = self.term.write_line("");
        let line = summary_line(report);
        if self.use_color {
            let status = if failed > 0 {
                Style::new().red().bold()
            } else {
                Style::new().green().bold()
            };
            let _ = self.term.write_line(&status.apply_to(line).to_string());
        } else {
            let _ = self.term.write_line(&line);
        }
    }
}

/// `PASSED 10/10 checks passed` style summary
#[must_use]
pub fn summary_line(report: &CheckReport) -> String {
    let status = if report.all_passed() {
        "PASSED"
    } else {
        "FAILED"
    };
    format!("{status} {report}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pageprobe::ProbeError;
    use std::time::Duration;

    fn mixed_report() -> CheckReport {
        let mut report = CheckReport::new();
        let _ = report.record("page loads", Duration::from_millis(12), Ok(()));
        let _ = report.record::<()>(
            "carousels agree on load",
            Duration::from_millis(30),
            Err(ProbeError::mismatch("slider", "active index", 1, 0)),
        );
        report
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line(&mixed_report()), "FAILED 1/2 checks passed");
        assert_eq!(summary_line(&CheckReport::new()), "PASSED 0/0 checks passed");
    }

    #[test]
    fn test_new_reporter() {
        let reporter = Reporter::new(true, false);
        assert!(reporter.use_color);
        assert!(!reporter.quiet);
    }

    #[test]
    fn test_report_prints_without_panicking() {
        let reporter = Reporter::new(false, false);
        reporter.header("pageprobe");
        reporter.report(&mixed_report());
    }

    #[test]
    fn test_quiet_mode_suppresses_output() {
        let reporter = Reporter::new(false, true);
        reporter.success("hidden");
        reporter.warning("hidden");
        reporter.info("hidden");
        reporter.header("hidden");
        reporter.failure("shown");
    }
}
