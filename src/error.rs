// src/error.rs
//! Local validation failures raised by the datetime normalizer and the
//! payload extractors. Duplicate notifications are not errors; see
//! [`crate::dispatch::DispatchOutcome`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomationError {
    /// Input did not match `YYYY-MM-DDTHH:MM:SSZ`, had out-of-range fields,
    /// or time arithmetic left the representable range.
    #[error("malformed timestamp '{input}': {reason}")]
    MalformedTimestamp { input: String, reason: String },

    /// Shift direction was neither `add` nor `subtract`.
    #[error("invalid time modifier '{0}' (expected 'add' or 'subtract')")]
    InvalidModifier(String),

    /// A required key was absent (or not a string) in a webhook payload.
    #[error("missing field '{0}' in webhook payload")]
    MissingField(String),
}

impl AutomationError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AutomationError>;
