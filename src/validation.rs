//! Field-level validation errors
//!
//! Request DTOs collect every failing field before persistence so the
//! caller gets the full list in one response.

use serde::Serialize;

/// A single failed field check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Accumulated field errors for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("validation failed on {} field(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.0.push(FieldError {
                field,
                message: message.into(),
            });
        }
        self
    }

    /// Record an error when a required text field is blank.
    pub fn require_text(&mut self, value: &str, field: &'static str) -> &mut Self {
        self.check(
            !value.trim().is_empty(),
            field,
            format!("{} must not be empty", field),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}
