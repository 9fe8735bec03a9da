//! Run configuration.
//!
//! [`ProbeConfig`] gathers everything a run needs that is not code: where the
//! page lives, how long each kind of wait may take, the markup contract and the
//! validation messages the form is expected to show. It loads from YAML or
//! JSON, every section is optional, and a couple of environment variables can
//! override the target for CI.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::form::FormField;
use crate::markup::MarkupContract;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{WaitOptions, Waiter};

/// Environment variable overriding [`ProbeConfig::base_url`]
pub const ENV_BASE_URL: &str = "PAGEPROBE_BASE_URL";

/// Environment variable overriding [`BrowserSettings::headless`]
pub const ENV_HEADLESS: &str = "PAGEPROBE_HEADLESS";

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Upper bounds for each kind of wait, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Element appearance
    pub element_ms: u64,
    /// Carousel transition settle
    pub transition_ms: u64,
    /// Form step outcome after a commit
    pub settle_ms: u64,
    /// Page navigation
    pub navigation_ms: u64,
    /// Terminal redirect after final submission
    pub redirect_ms: u64,
    /// Interval between polls
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_ms: 5_000,
            transition_ms: 3_000,
            settle_ms: 3_000,
            navigation_ms: 30_000,
            redirect_ms: 10_000,
            poll_interval_ms: 50,
        }
    }
}

impl Timeouts {
    /// A waiter bounded by `timeout_ms` at the configured poll interval
    #[must_use]
    pub const fn waiter(&self, timeout_ms: u64) -> Waiter {
        Waiter::with_options(WaitOptions {
            timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        })
    }

    fn validate(&self) -> ProbeResult<()> {
        let bounds = [
            ("element_ms", self.element_ms),
            ("transition_ms", self.transition_ms),
            ("settle_ms", self.settle_ms),
            ("navigation_ms", self.navigation_ms),
            ("redirect_ms", self.redirect_ms),
        ];
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::config("timeouts.poll_interval_ms must be positive"));
        }
        for (key, value) in bounds {
            if value < self.poll_interval_ms {
                return Err(ProbeError::config(format!(
                    "timeouts.{key} ({value}) is shorter than the poll interval ({})",
                    self.poll_interval_ms
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// VALIDATION RULES
// =============================================================================

/// The two messages a form field shows when it rejects input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Field the rule belongs to
    pub field: FormField,
    /// Shown when the field is left empty
    pub empty_message: String,
    /// Shown when the value has the wrong shape
    pub invalid_format_message: String,
}

impl ValidationRule {
    /// Create a rule
    pub fn new(
        field: FormField,
        empty_message: impl Into<String>,
        invalid_format_message: impl Into<String>,
    ) -> Self {
        Self {
            field,
            empty_message: empty_message.into(),
            invalid_format_message: invalid_format_message.into(),
        }
    }

    /// Case-insensitive pattern matching either message.
    ///
    /// Both messages are escaped, so punctuation in the copy is literal.
    pub fn message_pattern(&self) -> ProbeResult<Regex> {
        let source = format!(
            "(?i)(?:{}|{})",
            regex::escape(self.empty_message.trim()),
            regex::escape(self.invalid_format_message.trim())
        );
        Regex::new(&source).map_err(|e| ProbeError::config(format!("validation pattern: {e}")))
    }

    /// Rules for the built-in lead form copy
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                FormField::Zip,
                "ZIP code is required",
                "Please enter a valid 5-digit ZIP code",
            ),
            Self::new(
                FormField::Email,
                "Email is required",
                "Please enter a valid email address",
            ),
            Self::new(
                FormField::Phone,
                "Phone number is required",
                "Please enter a valid 10-digit phone number",
            ),
        ]
    }
}

// =============================================================================
// BROWSER / REPORTING PASS-THROUGH
// =============================================================================

/// Browser launch settings, consumed by the real driver only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a window
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Explicit chromium binary
    pub chromium_path: Option<PathBuf>,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            user_agent: None,
        }
    }
}

/// When the runner keeps a report of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapturePolicy {
    /// Never keep a report
    Never,
    /// Keep it when a check failed
    #[default]
    OnFailure,
    /// Keep it for every run
    Always,
}

/// Toggle labels of the disclosure panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisclosureLabels {
    /// Label while expanded
    pub expanded: String,
    /// Label while collapsed
    pub collapsed: String,
}

impl Default for DisclosureLabels {
    fn default() -> Self {
        Self {
            expanded: "Hide reviews".to_string(),
            collapsed: "Show reviews".to_string(),
        }
    }
}

// =============================================================================
// PROBE CONFIG
// =============================================================================

/// Complete configuration of a verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Scheme and host of the site under test
    pub base_url: String,
    /// Path of the product page
    pub page_path: String,
    /// Pattern the address must match after final submission
    pub terminal_url_pattern: String,
    /// Phrase the location banner contains
    pub location_phrase: String,
    /// Browser launch settings
    pub browser: BrowserSettings,
    /// Wait bounds
    pub timeouts: Timeouts,
    /// DOM contract
    pub markup: MarkupContract,
    /// Validation messages, one rule per field
    pub validation: Vec<ValidationRule>,
    /// Disclosure toggle labels
    pub labels: DisclosureLabels,
    /// Extra suite runs the runner grants a failing page (not used by components)
    pub retries: u32,
    /// Report retention policy for the runner
    pub capture: CapturePolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            page_path: "/".to_string(),
            terminal_url_pattern: r"/thank-you(?:[/?#]|$)".to_string(),
            location_phrase: "Showing offers near".to_string(),
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            markup: MarkupContract::default(),
            validation: ValidationRule::defaults(),
            labels: DisclosureLabels::default(),
            retries: 0,
            capture: CapturePolicy::default(),
        }
    }
}

impl ProbeConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML
    pub fn from_yaml_str(source: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(source)?)
    }

    /// Parse JSON
    pub fn from_json_str(source: &str) -> ProbeResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load from a file; `.json` is read as JSON, anything else as YAML
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set page path
    #[must_use]
    pub fn with_page_path(mut self, page_path: impl Into<String>) -> Self {
        self.page_path = page_path.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    /// Set wait bounds
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set markup contract
    #[must_use]
    pub fn with_markup(mut self, markup: MarkupContract) -> Self {
        self.markup = markup;
        self
    }

    /// Set terminal address pattern
    #[must_use]
    pub fn with_terminal_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.terminal_url_pattern = pattern.into();
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(flag) = lookup(ENV_HEADLESS) {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.browser.headless = true,
                "0" | "false" | "no" | "off" => self.browser.headless = false,
                other => tracing::warn!(value = other, "ignoring unrecognized {ENV_HEADLESS}"),
            }
        }
        self
    }

    /// Absolute address of a page path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            return base.to_string();
        }
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Rule for a field
    #[must_use]
    pub fn rule(&self, field: FormField) -> Option<&ValidationRule> {
        self.validation.iter().find(|rule| rule.field == field)
    }

    /// Compiled terminal address pattern
    pub fn terminal_pattern(&self) -> ProbeResult<Regex> {
        Regex::new(&self.terminal_url_pattern)
            .map_err(|e| ProbeError::config(format!("terminal_url_pattern: {e}")))
    }

    /// Reject configurations no run could succeed with
    pub fn validate(&self) -> ProbeResult<()> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://") || base.starts_with("file://"))
        {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) or file address, got {base:?}"
            )));
        }
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(ProbeError::config("browser viewport must be non-empty"));
        }
        self.timeouts.validate()?;
        self.markup.validate()?;
        self.terminal_pattern()?;
        for field in FormField::ORDER {
            let rule = self.rule(field).ok_or_else(|| {
                ProbeError::config(format!("validation rule for '{}' is missing", field.name()))
            })?;
            if rule.empty_message.trim().is_empty() || rule.invalid_format_message.trim().is_empty() {
                return Err(ProbeError::config(format!(
                    "validation messages for '{}' must be non-empty",
                    field.name()
                )));
            }
        }
        if self.validation.len() != FormField::ORDER.len() {
            return Err(ProbeError::config("validation has duplicate rules"));
        }
        if self.labels.expanded.trim().is_empty() || self.labels.collapsed.trim().is_empty() {
            return Err(ProbeError::config("disclosure labels must be non-empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod loading_tests {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_default_is_valid() {
            ProbeConfig::default().validate().unwrap();
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config = ProbeConfig::from_yaml_str(
                "base_url: https://shop.test\ntimeouts:\n  transition_ms: 900\n",
            )
            .unwrap();
            assert_eq!(config.base_url, "https://shop.test");
            assert_eq!(config.timeouts.transition_ms, 900);
            assert_eq!(config.timeouts.element_ms, 5_000);
            assert_eq!(config.validation.len(), 3);
        }

        #[test]
        fn test_yaml_round_trip() {
            let config = ProbeConfig::default().with_base_url("https://a.test");
            let again = ProbeConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
            assert_eq!(config, again);
        }

        #[test]
        fn test_load_json_by_extension() {
            let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
            write!(file, r#"{{"base_url":"https://json.test","capture":"always"}}"#).unwrap();
            let config = ProbeConfig::load(file.path()).unwrap();
            assert_eq!(config.base_url, "https://json.test");
            assert_eq!(config.capture, CapturePolicy::Always);
        }

        #[test]
        fn test_load_missing_file_is_io_error() {
            let err = ProbeConfig::load(Path::new("/nonexistent/pageprobe.yaml")).unwrap_err();
            assert!(matches!(err, ProbeError::Io(_)));
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_env_overrides() {
            let config = ProbeConfig::default().with_overrides_from(|key| match key {
                ENV_BASE_URL => Some(" https://ci.test ".to_string()),
                ENV_HEADLESS => Some("false".to_string()),
                _ => None,
            });
            assert_eq!(config.base_url, "https://ci.test");
            assert!(!config.browser.headless);
        }

        #[test]
        fn test_unrecognized_headless_value_is_ignored() {
            let config = ProbeConfig::default()
                .with_overrides_from(|key| (key == ENV_HEADLESS).then(|| "maybe".to_string()));
            assert!(config.browser.headless);
        }

        #[test]
        fn test_url_for_joins_slashes() {
            let config = ProbeConfig::default().with_base_url("https://a.test/");
            assert_eq!(config.url_for("/cars/1"), "https://a.test/cars/1");
            assert_eq!(config.url_for("cars/1"), "https://a.test/cars/1");
            assert_eq!(config.url_for(""), "https://a.test");
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_rejects_bad_base_url() {
            let config = ProbeConfig::default().with_base_url("localhost:3000");
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_rejects_timeout_below_poll_interval() {
            let timeouts = Timeouts {
                transition_ms: 10,
                ..Timeouts::default()
            };
            assert!(ProbeConfig::default().with_timeouts(timeouts).validate().is_err());
        }

        #[test]
        fn test_rejects_missing_rule() {
            let mut config = ProbeConfig::default();
            config.validation.retain(|rule| rule.field != FormField::Phone);
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_rejects_bad_terminal_pattern() {
            let config = ProbeConfig::default().with_terminal_url_pattern("(unclosed");
            assert!(matches!(config.validate(), Err(ProbeError::Config { .. })));
        }

        #[test]
        fn test_message_pattern_is_escaped_and_case_insensitive() {
            let rule = ValidationRule::new(FormField::Zip, "Required.", "Bad (zip)");
            let pattern = rule.message_pattern().unwrap();
            assert!(pattern.is_match("required."));
            assert!(pattern.is_match("BAD (ZIP)"));
            assert!(!pattern.is_match("Requiredx"));
            assert!(!pattern.is_match("Bad zip"));
        }
    }
}
