//! Validators attached to fields.
//!
//! Validators run after a field has coerced its input, in the order they
//! were attached, and stop at the first failure. They receive the coerced
//! value, so a length validator sees a string and a range validator sees a
//! number regardless of what was submitted.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use formwork_core::{ValidationError, Value};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A trait for validating coerced field values.
///
/// # Examples
///
/// ```
/// use formwork_forms::validators::{MaxLengthValidator, Validator};
///
/// let v = MaxLengthValidator::new(5);
/// assert_eq!(v.name(), "MaxLengthValidator");
/// ```
#[async_trait]
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value, returning an error if invalid.
    async fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

#[allow(clippy::cast_precision_loss)]
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Validates that a string value does not exceed a maximum length.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    /// The maximum allowed length in characters.
    pub max_length: usize,
}

impl MaxLengthValidator {
    /// Creates a new `MaxLengthValidator` with the given maximum length.
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

#[async_trait]
impl Validator for MaxLengthValidator {
    async fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Value::String(s) = value {
            let length = s.chars().count();
            if length > self.max_length {
                return Err(ValidationError::new(
                    format!(
                        "Ensure this value has at most {} characters (it has {length}).",
                        self.max_length
                    ),
                    "max_length",
                )
                .with_param("max_length", self.max_length.to_string()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MaxLengthValidator"
    }
}

/// Validates that a string value meets a minimum length requirement.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
    /// The minimum required length in characters.
    pub min_length: usize,
}

impl MinLengthValidator {
    /// Creates a new `MinLengthValidator` with the given minimum length.
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

#[async_trait]
impl Validator for MinLengthValidator {
    async fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Value::String(s) = value {
            let length = s.chars().count();
            if length < self.min_length {
                return Err(ValidationError::new(
                    format!(
                        "Ensure this value has at least {} characters (it has {length}).",
                        self.min_length
                    ),
                    "min_length",
                )
                .with_param("min_length", self.min_length.to_string()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MinLengthValidator"
    }
}

/// Validates that a numeric value does not exceed a maximum.
#[derive(Debug, Clone)]
pub struct MaxValueValidator {
    /// The maximum allowed value.
    pub max_value: f64,
}

impl MaxValueValidator {
    /// Creates a new `MaxValueValidator`.
    pub const fn new(max_value: f64) -> Self {
        Self { max_value }
    }
}

#[async_trait]
impl Validator for MaxValueValidator {
    async fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Some(n) = numeric(value) {
            if n > self.max_value {
                return Err(ValidationError::new(
                    format!(
                        "Ensure this value is less than or equal to {}.",
                        self.max_value
                    ),
                    "max_value",
                )
                .with_param("max_value", self.max_value.to_string()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MaxValueValidator"
    }
}

/// Validates that a numeric value meets a minimum.
#[derive(Debug, Clone)]
pub struct MinValueValidator {
    /// The minimum allowed value.
    pub min_value: f64,
}

impl MinValueValidator {
    /// Creates a new `MinValueValidator`.
    pub const fn new(min_value: f64) -> Self {
        Self { min_value }
    }
}

#[async_trait]
impl Validator for MinValueValidator {
    async fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Some(n) = numeric(value) {
            if n < self.min_value {
                return Err(ValidationError::new(
                    format!(
                        "Ensure this value is greater than or equal to {}.",
                        self.min_value
                    ),
                    "min_value",
                )
                .with_param("min_value", self.min_value.to_string()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "MinValueValidator"
    }
}

/// Validates that a string value matches a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: regex::Regex,
    message: String,
}

impl RegexValidator {
    /// Creates a validator for the given pattern.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: regex::Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

#[async_trait]
impl Validator for RegexValidator {
    async fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Value::String(s) = value {
            if !self.regex.is_match(s) {
                return Err(ValidationError::new(self.message.clone(), "pattern")
                    .with_param("pattern", self.regex.as_str()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "RegexValidator"
    }
}

type CheckFn = dyn Fn(&Value) -> Result<(), ValidationError> + Send + Sync;
type AsyncCheckFn = dyn Fn(Value) -> BoxFuture<'static, Result<(), ValidationError>> + Send + Sync;

/// Wraps a synchronous closure as a validator.
///
/// # Examples
///
/// ```
/// use formwork_forms::validators::FnValidator;
/// use formwork_core::{ValidationError, Value};
///
/// let even = FnValidator::new("even", |value: &Value| match value {
///     Value::Int(i) if i % 2 != 0 => Err(ValidationError::new("Must be even", "even")),
///     _ => Ok(()),
/// });
/// ```
#[derive(Clone)]
pub struct FnValidator {
    name: String,
    check: Arc<CheckFn>,
}

impl FnValidator {
    /// Creates a named closure validator.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Validator for FnValidator {
    async fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        (self.check)(value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wraps an asynchronous closure as a validator.
///
/// The closure receives an owned copy of the value so the returned future
/// can outlive the borrow.
#[derive(Clone)]
pub struct AsyncFnValidator {
    name: String,
    check: Arc<AsyncCheckFn>,
}

impl AsyncFnValidator {
    /// Creates a named async closure validator.
    pub fn new<F, Fut>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ValidationError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(move |value| -> BoxFuture<'static, Result<(), ValidationError>> {
                Box::pin(check(value))
            }),
        }
    }
}

impl fmt::Debug for AsyncFnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnValidator")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl Validator for AsyncFnValidator {
    async fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        (self.check)(value.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
