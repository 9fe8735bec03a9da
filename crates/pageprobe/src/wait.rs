//! Wait Mechanisms
//!
//! Bounded polling waits built on top of [`PageDriver`] reads. A wait is the
//! only suspension point a component has; when its bound expires the caller
//! converts the [`WaitResult`] into a typed timeout failure.
//!
//! Conditions re-resolve their locators on every poll, so a re-rendered
//! element is picked up without holding a stale handle. A read that fails
//! because the document was being replaced counts as "not yet"; every other
//! driver failure ends the wait.

use regex::Regex;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::markup::has_class;
use crate::result::{ProbeError, ProbeResult};

/// Default timeout for wait operations (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// A page condition evaluated on each poll
#[derive(Debug, Clone)]
pub enum Condition {
    /// First match exists and is rendered visible
    Visible(Locator),
    /// No match, or the first match is not rendered
    Hidden(Locator),
    /// First match carries the class
    HasClass(Locator, String),
    /// First match lacks the class (holds when nothing matches)
    LacksClass(Locator, String),
    /// First match has the attribute with this exact value
    AttributeEquals(Locator, String, String),
    /// Some match's text content matches the pattern
    TextMatches(Locator, Regex),
    /// Numeric computed style of the first match is at least the value
    StyleAtLeast(Locator, String, f64),
    /// Current address matches the pattern
    UrlMatches(Regex),
    /// First match is visible and the matches no longer show these texts
    VisibleChangedFrom(Locator, Vec<String>),
}

impl Condition {
    /// Evaluate once against the live page
    pub async fn check<D: PageDriver + ?Sized>(&self, driver: &D) -> ProbeResult<bool> {
        match self {
            Self::Visible(loc) => driver.is_visible(loc).await,
            Self::Hidden(loc) => Ok(!driver.is_visible(loc).await?),
            Self::HasClass(loc, class) => Ok(absent_as_none(driver.attribute(loc, "class").await)?
                .is_some_and(|attr| has_class(attr.as_deref(), class))),
            Self::LacksClass(loc, class) => Ok(absent_as_none(driver.attribute(loc, "class").await)?
                .map_or(true, |attr| !has_class(attr.as_deref(), class))),
            Self::AttributeEquals(loc, name, value) => {
                Ok(absent_as_none(driver.attribute(loc, name).await)?
                    .flatten()
                    .is_some_and(|v| v == *value))
            }
            Self::TextMatches(loc, pattern) => Ok(driver
                .all_text_contents(loc)
                .await?
                .iter()
                .any(|text| pattern.is_match(text))),
            Self::StyleAtLeast(loc, property, min) => {
                Ok(absent_as_none(driver.computed_style(loc, property).await)?
                    .flatten()
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .is_some_and(|v| v >= *min))
            }
            Self::UrlMatches(pattern) => Ok(pattern.is_match(&driver.current_url().await?)),
            Self::VisibleChangedFrom(loc, before) => {
                if !driver.is_visible(loc).await? {
                    return Ok(false);
                }
                let now = driver.all_text_contents(loc).await?;
                Ok(!same_texts(&now, before))
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible(loc) => write!(f, "{loc} visible"),
            Self::Hidden(loc) => write!(f, "{loc} hidden"),
            Self::HasClass(loc, class) => write!(f, "{loc} has class {class}"),
            Self::LacksClass(loc, class) => write!(f, "{loc} lacks class {class}"),
            Self::AttributeEquals(loc, name, value) => write!(f, "{loc} [{name}={value:?}]"),
            Self::TextMatches(loc, pattern) => write!(f, "{loc} text ~ /{pattern}/"),
            Self::StyleAtLeast(loc, property, min) => write!(f, "{loc} {property} >= {min}"),
            Self::UrlMatches(pattern) => write!(f, "address ~ /{pattern}/"),
            Self::VisibleChangedFrom(loc, _) => write!(f, "{loc} visible with new text"),
        }
    }
}

/// Texts equal up to surrounding whitespace
fn same_texts(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.trim() == y.trim())
}

/// Map `ElementNotFound` to `Ok(None)` so a missing element reads as "not yet"
fn absent_as_none<T>(result: ProbeResult<T>) -> ProbeResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ProbeError::ElementNotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Whether the wait was successful
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
    /// Index of the condition that held, for [`Waiter::first_of`]
    pub matched: Option<usize>,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            waited_for: waited_for.into(),
            matched: None,
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub fn timeout(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: false,
            elapsed,
            waited_for: waited_for.into(),
            matched: None,
        }
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Waiter for synchronization operations
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Same poll interval, different bound
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.options.timeout_ms = timeout_ms;
        self
    }

    /// Current options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Wait until `condition` holds
    pub async fn until<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        condition: &Condition,
    ) -> ProbeResult<WaitResult> {
        self.until_all(driver, std::slice::from_ref(condition)).await
    }

    /// Wait until every condition holds in the same poll
    pub async fn until_all<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        conditions: &[Condition],
    ) -> ProbeResult<WaitResult> {
        let description = describe(conditions, " and ");
        self.poll(&description, move || async move {
            for condition in conditions {
                if !condition.check(driver).await? {
                    return Ok(None);
                }
            }
            Ok::<_, ProbeError>(Some(0))
        })
        .await
    }

    /// Wait until any condition holds; `matched` names the first that did
    pub async fn first_of<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        conditions: &[Condition],
    ) -> ProbeResult<WaitResult> {
        let description = describe(conditions, " or ");
        self.poll(&description, move || async move {
            for (index, condition) in conditions.iter().enumerate() {
                if condition.check(driver).await? {
                    return Ok(Some(index));
                }
            }
            Ok::<_, ProbeError>(None)
        })
        .await
    }

    async fn poll<F, Fut>(&self, description: &str, mut probe: F) -> ProbeResult<WaitResult>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ProbeResult<Option<usize>>>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout();
        debug!(
            waiting_for = description,
            timeout_ms = self.options.timeout_ms,
            "wait started"
        );
        loop {
            let reading = match probe().await {
                Err(e) if e.is_transient() => {
                    debug!(waiting_for = description, error = %e, "read interrupted, polling again");
                    None
                }
                other => other?,
            };
            if let Some(index) = reading {
                let mut result = WaitResult::success(start.elapsed(), description);
                result.matched = Some(index);
                debug!(
                    waiting_for = description,
                    elapsed_ms = result.elapsed.as_millis() as u64,
                    "wait satisfied"
                );
                return Ok(result);
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                debug!(
                    waiting_for = description,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "wait timed out"
                );
                return Ok(WaitResult::timeout(elapsed, description));
            }
            trace!(waiting_for = description, "condition not met, polling again");
            tokio::time::sleep(self.options.poll_interval().min(timeout - elapsed)).await;
        }
    }
}

fn describe(conditions: &[Condition], joiner: &str) -> String {
    conditions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(joiner)
}
