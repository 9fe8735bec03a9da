//! Result and error types for pageprobe.

use thiserror::Error;

/// Result type for pageprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// CDP error text for evaluations whose document was replaced
const CONTEXT_LOST_MARKERS: [&str; 3] = [
    "execution context was destroyed",
    "cannot find context with specified id",
    "inspected target navigated or closed",
];

/// Errors that can occur while driving or verifying a page
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A required element was absent after its wait bound
    #[error("[{component}] element not found: {locator}")]
    ElementNotFound {
        /// Component that needed the element
        component: String,
        /// Rendered locator
        locator: String,
    },

    /// A carousel never settled on the expected slide
    #[error("[slider] transition did not settle within {timeout_ms}ms: expected {expected}, observed {observed}")]
    TransitionTimeout {
        /// Expected settled state
        expected: String,
        /// Last observed state
        observed: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// A form step's input never became visible
    #[error("[form] field '{field}' was not reached within {timeout_ms}ms")]
    FieldNotReached {
        /// Field that was expected to appear
        field: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// The terminal redirect never happened
    #[error("[form] terminal page matching '{pattern}' not reached within {timeout_ms}ms (address was {observed})")]
    TerminalNotReached {
        /// Terminal URL pattern
        pattern: String,
        /// Last observed address
        observed: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// An observed value disagrees with the expected value
    #[error("[{component}] {what}: expected {expected}, got {actual}")]
    AssertionMismatch {
        /// Component reporting the mismatch
        component: String,
        /// What was compared
        what: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// A form step exposed the wrong completion control
    #[error("[form] step '{field}' expected a {expected} action but only found {found}")]
    UnexpectedCompletionAction {
        /// Field whose step was being committed
        field: String,
        /// Action the step should expose
        expected: String,
        /// Action actually exposed
        found: String,
    },

    /// An attribute the markup contract relies on had an unusable value
    #[error("malformed attribute '{attribute}' on {locator}: {value:?}")]
    MalformedAttribute {
        /// Rendered locator
        locator: String,
        /// Attribute name
        attribute: String,
        /// Raw value
        value: String,
    },

    /// Operation called in a state that cannot support it
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// The browser driver failed
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// The page's script context went away mid-read, e.g. while a redirect commits
    #[error("Page context lost: {message}")]
    ContextLost {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an element-not-found error
    #[must_use]
    pub fn not_found(component: impl Into<String>, locator: impl Into<String>) -> Self {
        Self::ElementNotFound {
            component: component.into(),
            locator: locator.into(),
        }
    }

    /// Create an assertion mismatch
    #[must_use]
    pub fn mismatch(
        component: impl Into<String>,
        what: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::AssertionMismatch {
            component: component.into(),
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Classify a failed script evaluation.
    ///
    /// Evaluations racing a navigation fail because the old document's
    /// context is gone; those become [`ProbeError::ContextLost`], anything
    /// else is a driver error.
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        if CONTEXT_LOST_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::ContextLost { message }
        } else {
            Self::Driver { message }
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for failures a later read of the same page may not repeat
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ContextLost { .. })
    }

    /// True for failures raised because a wait bound expired
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::TransitionTimeout { .. }
                | Self::FieldNotReached { .. }
                | Self::TerminalNotReached { .. }
        )
    }
}
