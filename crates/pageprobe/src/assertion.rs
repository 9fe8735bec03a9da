//! Expectations and soft check collection.
//!
//! Component operations fail fast with a [`ProbeError`]. A suite run wants the
//! opposite: run every check, keep each failure, report them together.
//! [`CheckReport`] collects outcomes that way; [`expect_eq`] and
//! [`expect_contains`] build the mismatch errors components raise.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::time::Duration;

use crate::result::{ProbeError, ProbeResult};

/// Fail with `AssertionMismatch` unless `actual == expected`
pub fn expect_eq<T: PartialEq + Debug>(
    component: &str,
    what: &str,
    expected: &T,
    actual: &T,
) -> ProbeResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProbeError::mismatch(
            component,
            what,
            format!("{expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

/// Fail with `AssertionMismatch` unless `haystack` contains `needle`
pub fn expect_contains(component: &str, what: &str, haystack: &str, needle: &str) -> ProbeResult<()> {
    if haystack.contains(needle) {
        Ok(())
    } else {
        Err(ProbeError::mismatch(
            component,
            what,
            format!("text containing {needle:?}"),
            format!("{haystack:?}"),
        ))
    }
}

/// Outcome of one named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check name
    pub name: String,
    /// Whether it passed
    pub passed: bool,
    /// Failure message
    pub message: Option<String>,
    /// Whether the failure was a wait bound expiring
    pub timed_out: bool,
    /// Time the check took
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// Mode for check collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckMode {
    /// Run every check (default)
    #[default]
    Collect,
    /// Stop recording after the first failure
    FailFast,
}

/// Soft collector of check outcomes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckReport {
    outcomes: Vec<CheckOutcome>,
    mode: CheckMode,
}

impl CheckReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a collection mode
    #[must_use]
    pub fn with_mode(mode: CheckMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Whether further checks should run
    #[must_use]
    pub fn should_continue(&self) -> bool {
        self.mode == CheckMode::Collect || self.all_passed()
    }

    /// Record a check result; returns the value on success
    pub fn record<T>(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
        result: ProbeResult<T>,
    ) -> Option<T> {
        let name = name.into();
        match result {
            Ok(value) => {
                self.outcomes.push(CheckOutcome {
                    name,
                    passed: true,
                    message: None,
                    timed_out: false,
                    duration,
                });
                Some(value)
            }
            Err(e) => {
                tracing::warn!(check = %name, error = %e, "check failed");
                self.outcomes.push(CheckOutcome {
                    name,
                    passed: false,
                    timed_out: e.is_timeout(),
                    message: Some(e.to_string()),
                    duration,
                });
                None
            }
        }
    }

    /// All outcomes, in run order
    #[must_use]
    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
    }

    /// Failed outcomes
    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Number of checks run
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of passed checks
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    /// Every check passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// `Ok` when every check passed, else one error listing the failures
    pub fn verify(&self) -> ProbeResult<()> {
        if self.all_passed() {
            return Ok(());
        }
        let failed: Vec<String> = self
            .failures()
            .map(|o| format!("{}: {}", o.name, o.message.as_deref().unwrap_or("failed")))
            .collect();
        Err(ProbeError::InvalidState {
            message: format!(
                "{} of {} checks failed\n  {}",
                failed.len(),
                self.total(),
                failed.join("\n  ")
            ),
        })
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} checks passed", self.passed(), self.total())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod expectation_tests {
        use super::*;

        #[test]
        fn test_expect_eq() {
            assert!(expect_eq("slider", "index", &2, &2).is_ok());
            let err = expect_eq("slider", "index", &2, &3).unwrap_err();
            assert!(err.to_string().contains("expected 2, got 3"));
        }

        #[test]
        fn test_expect_contains() {
            assert!(expect_contains("location", "banner", "near Austin", "Austin").is_ok());
            assert!(matches!(
                expect_contains("location", "banner", "near Austin", "Boston"),
                Err(ProbeError::AssertionMismatch { .. })
            ));
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_collects_all_failures() {
            let mut report = CheckReport::new();
            assert_eq!(report.record("a", Duration::ZERO, Ok(1)), Some(1));
            let _ = report.record::<()>("b", Duration::ZERO, Err(ProbeError::driver("boom")));
            let _ = report.record::<()>(
                "c",
                Duration::ZERO,
                Err(ProbeError::FieldNotReached {
                    field: "email".into(),
                    timeout_ms: 10,
                }),
            );
            assert_eq!(report.total(), 3);
            assert_eq!(report.passed(), 1);
            assert!(report.should_continue());
            assert!(report.outcomes()[2].timed_out);
            let err = report.verify().unwrap_err().to_string();
            assert!(err.contains("2 of 3 checks failed"));
            assert!(err.contains("b: Driver error: boom"));
            assert_eq!(report.to_string(), "1/3 checks passed");
        }

        #[test]
        fn test_fail_fast_stops() {
            let mut report = CheckReport::with_mode(CheckMode::FailFast);
            let _ = report.record::<()>("a", Duration::ZERO, Err(ProbeError::driver("x")));
            assert!(!report.should_continue());
        }

        #[test]
        fn test_serializes_durations_as_millis() {
            let mut report = CheckReport::new();
            let _ = report.record("a", Duration::from_millis(42), Ok(()));
            let json = serde_json::to_string(&report).unwrap();
            assert!(json.contains("\"duration\":42"));
        }
    }
}
