//! Field-level validation errors.
//!
//! Input DTOs derive [`validator::Validate`] for length rules; the resulting
//! [`validator::ValidationErrors`] are flattened into [`FieldErrors`] so that
//! hand-written checks (blank values, unknown references, uniqueness) can be
//! merged into the same list and reported together.

use std::fmt;

use serde::Serialize;
use validator::Validate;

use crate::error::CoreError;

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// An ordered collection of [`FieldError`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Append all errors from `other`.
    pub fn merge(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether any error was recorded for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Human-readable sentences, e.g. `"title is too short (minimum is 3 characters)"`.
    pub fn full_messages(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|e| format!("{} {}", e.field, e.message))
            .collect()
    }

    /// `Ok(())` when empty, otherwise [`CoreError::InvalidFields`].
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidFields(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join("; "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("is invalid ({})", e.code));
                    (field.clone(), message)
                })
            })
            .collect();

        // HashMap iteration order is unspecified; sort for stable output.
        fields.sort();

        let mut out = FieldErrors::new();
        for (field, message) in fields {
            out.add(field, message);
        }
        out
    }
}

/// Run the derived length rules on `input` and collect failures.
pub fn check<T: Validate>(input: &T) -> FieldErrors {
    match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    }
}

/// Record "can't be blank" when a required value is empty or whitespace.
pub fn require_present(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "can't be blank");
    }
}
