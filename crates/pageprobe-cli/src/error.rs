//! Error types for the CLI

use pageprobe::ProbeError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// One or more checks failed
    #[error("{failed} of {total} checks failed")]
    ChecksFailed {
        /// Failed checks
        failed: usize,
        /// Checks run
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// pageprobe library error
    #[error("{0}")]
    Probe(#[from] ProbeError),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Command needs a feature this binary was built without
    #[error("`{command}` needs the `{feature}` feature; rebuild with --features {feature}")]
    FeatureDisabled {
        /// Command that was invoked
        command: String,
        /// Missing cargo feature
        feature: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a feature-disabled error
    #[must_use]
    pub fn feature_disabled(command: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::FeatureDisabled {
            command: command.into(),
            feature: feature.into(),
        }
    }
}
