//! Validate command handler: offline prediction of the form's verdict

use pageprobe::{FieldShape, FormField, ProbeConfig};
use serde::Serialize;
use std::fmt;

use crate::error::{CliError, CliResult};

/// What the lead form would do with a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    /// Field the value was typed into
    pub field: FormField,
    /// Value as typed
    pub value: String,
    /// Whether the step would advance
    pub accepted: bool,
    /// Shape the field accepts
    #[serde(serialize_with = "shape_text")]
    pub shape: FieldShape,
    /// Message the site would show on rejection
    pub message: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn shape_text<S: serde::Serializer>(shape: &FieldShape, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(shape)
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.accepted {
            return write!(f, "{}: {:?} accepted", self.field, self.value);
        }
        write!(
            f,
            "{}: {:?} rejected (expected {})",
            self.field, self.value, self.shape
        )?;
        if let Some(message) = &self.message {
            write!(f, "; the page shows \"{message}\"")?;
        }
        Ok(())
    }
}

/// Predict the form's verdict on `value` from the field's shape and rules
pub fn predict(config: &ProbeConfig, field: FormField, value: &str) -> CliResult<Prediction> {
    let rule = config
        .rule(field)
        .ok_or_else(|| CliError::config(format!("no validation rule for '{field}'")))?;
    let shape = field.shape();
    let accepted = shape.accepts(value);
    let message = match (accepted, value.is_empty()) {
        (true, _) => None,
        (false, true) => Some(rule.empty_message.clone()),
        (false, false) => Some(rule.invalid_format_message.clone()),
    };
    Ok(Prediction {
        field,
        value: value.to_string(),
        accepted,
        shape,
        message,
    })
}
