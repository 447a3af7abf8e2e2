//! Core error types for formwork.
//!
//! [`ValidationError`] is the structured payload produced by field and form
//! validation. [`FormworkError`] is the crate-wide error enum that wraps it
//! together with configuration, persistence and serialization failures.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Key under which errors not attributable to a single field are stored.
pub const COMMON_ERRORS_KEY: &str = "common";

/// Represents a validation error with optional field-level errors.
///
/// Validation errors are either simple (a single coded message) or
/// compound (per-field error lists). Simple errors keep the parameters
/// their message template was rendered with, so callers can inspect the
/// bound that was violated without parsing text.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use formwork_core::error::ValidationError;
///
/// let err = ValidationError::new("Value is required", "required");
/// assert_eq!(err.code, "required");
///
/// let mut field_errors = HashMap::new();
/// field_errors.insert("email".to_string(), vec![err]);
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.is_compound());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
    /// Parameters the message template was rendered with.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name or [`COMMON_ERRORS_KEY`].
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Creates a compound error holding a single whole-object message.
    pub fn common(message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            COMMON_ERRORS_KEY.to_string(),
            vec![Self::new(message, COMMON_ERRORS_KEY)],
        );
        Self::with_field_errors(field_errors)
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if this error carries per-field errors.
    pub fn is_compound(&self) -> bool {
        !self.field_errors.is_empty()
    }

    /// Returns the first error recorded for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&Self> {
        self.field_errors.get(field).and_then(|errors| errors.first())
    }

    /// Converts this error into a per-field map.
    ///
    /// A simple error is filed under [`COMMON_ERRORS_KEY`].
    pub fn into_field_errors(self) -> HashMap<String, Vec<Self>> {
        if self.is_compound() {
            return self.field_errors;
        }
        let mut map = HashMap::new();
        map.insert(COMMON_ERRORS_KEY.to_string(), vec![self]);
        map
    }

    /// Merges another error into this compound error.
    pub fn merge(&mut self, other: Self) {
        for (field, errors) in other.into_field_errors() {
            self.field_errors.entry(field).or_default().extend(errors);
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut fields: Vec<_> = self.field_errors.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let mut first = true;
            for (field, errors) in fields {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for formwork.
///
/// Validation failures are data; every other variant describes a
/// collaborator or programming failure that the kernel does not translate.
#[derive(Error, Debug)]
pub enum FormworkError {
    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Persistence ──────────────────────────────────────────────────

    /// A lookup expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A lookup expected exactly one result but found several.
    #[error("Multiple objects returned when one expected: {0}")]
    MultipleObjectsReturned(String),

    /// A generic storage error raised by a manager.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A schema or field was declared in a way that can never work.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// A configuration value is missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormworkError {
    /// Returns `true` for the "no matching object" persistence condition.
    pub const fn is_does_not_exist(&self) -> bool {
        matches!(self, Self::DoesNotExist(_))
    }

    /// Returns the validation payload, if this is a validation failure.
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::ValidationError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for FormworkError {
    fn from(e: ValidationError) -> Self {
        Self::ValidationError(e)
    }
}

impl From<serde_json::Error> for FormworkError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// A convenience type alias for `Result<T, FormworkError>`.
pub type FormworkResult<T> = Result<T, FormworkError>;
