//! Form trait and `BaseForm` implementation.
//!
//! A form binds an input mapping to a [`Schema`]. Validation coerces the
//! input field by field and, on success, replaces the form's data with
//! the coerced values; [`Form::is_valid`] additionally records the errors
//! of a failed run in the form's state.
//!
//! Forms that need cross-field checks implement [`Form`] themselves and
//! override [`Form::clean`], which runs after every field has passed.

use async_trait::async_trait;
use formwork_core::{Data, ValidationError};

use crate::fields::FieldMetadata;
use crate::schema::{lookup, Schema};
use crate::validation::{self, FieldErrors};

/// The mutable part of a form: its data and its last recorded errors.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    /// The bound input, replaced by coerced values after validation.
    pub data: Data,
    /// Errors recorded by the last failed [`Form::is_valid`] call.
    pub errors: FieldErrors,
}

impl FormState {
    /// Creates a state bound to `data`.
    pub fn new(data: Data) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
        }
    }
}

/// The core form trait.
///
/// Implementors supply the schema and the state; everything else has a
/// default implementation.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use formwork_core::{Data, ValidationError};
/// use formwork_forms::form::{Form, FormState};
/// use formwork_forms::schema::Schema;
///
/// struct PasswordForm {
///     schema: Schema,
///     state: FormState,
/// }
///
/// #[async_trait]
/// impl Form for PasswordForm {
///     fn schema(&self) -> &Schema {
///         &self.schema
///     }
///     fn state(&self) -> &FormState {
///         &self.state
///     }
///     fn state_mut(&mut self) -> &mut FormState {
///         &mut self.state
///     }
///     async fn clean(&self, data: &mut Data) -> Result<(), ValidationError> {
///         if data.get("password") != data.get("confirm") {
///             return Err(ValidationError::new("Passwords differ", "mismatch"));
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Form: Send + Sync {
    /// Returns the form's schema.
    fn schema(&self) -> &Schema;

    /// Returns the form's state.
    fn state(&self) -> &FormState;

    /// Returns the form's state mutably.
    fn state_mut(&mut self) -> &mut FormState;

    /// Schema-level validation hook.
    ///
    /// Runs after every field has passed, on the coerced data, which it
    /// may modify. A simple error is reported under `"common"`; a compound
    /// error keeps its per-field entries. The default does nothing.
    async fn clean(&self, _data: &mut Data) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Returns the bound data.
    fn data(&self) -> &Data {
        &self.state().data
    }

    /// Returns the errors recorded by the last [`is_valid`](Self::is_valid).
    fn errors(&self) -> &FieldErrors {
        &self.state().errors
    }

    /// Runs the full validation pipeline.
    ///
    /// On success the data is replaced by the coerced values. Errors are
    /// returned, never recorded.
    async fn validate(&mut self) -> Result<(), ValidationError> {
        let cleaned = validation::full_clean(&*self).await?;
        self.state_mut().data = cleaned;
        Ok(())
    }

    /// Validates the form and records the outcome.
    ///
    /// Returns `true` and clears the errors on success. On failure the
    /// error is stored per field; a simple error goes under `"common"`.
    async fn is_valid(&mut self) -> bool {
        match self.validate().await {
            Ok(()) => {
                self.state_mut().errors.clear();
                true
            }
            Err(error) => {
                self.state_mut().errors = error.into_field_errors();
                false
            }
        }
    }

    /// Renders every declared field's presentation form.
    ///
    /// Absent and unparsable values render as null.
    fn serialize(&self) -> serde_json::Map<String, serde_json::Value> {
        self.schema()
            .iter()
            .map(|field| {
                let value = lookup(self.data(), field.name());
                (field.name().to_string(), field.to_representation(value))
            })
            .collect()
    }

    /// Describes every field, in declaration order.
    fn get_options(&self) -> Vec<FieldMetadata> {
        self.schema().get_options()
    }
}

/// A general-purpose form implementation with no schema-level hook.
///
/// # Examples
///
/// ```
/// use formwork_core::{data_from_json, Value};
/// use formwork_forms::fields::Field;
/// use formwork_forms::form::{BaseForm, Form};
/// use formwork_forms::schema::Schema;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let schema = Schema::builder("Signup")
///     .field("age", Field::integer().min_value(18))
///     .build();
/// let mut form = BaseForm::new(schema).with_data(data_from_json(serde_json::json!({"age": "21"})));
/// assert!(form.is_valid().await);
/// assert_eq!(form.data()["age"], Value::Int(21));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct BaseForm {
    schema: Schema,
    state: FormState,
}

impl BaseForm {
    /// Creates an unbound form (empty data) for `schema`.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            state: FormState::default(),
        }
    }

    /// Binds input data.
    pub fn with_data(mut self, data: Data) -> Self {
        self.state = FormState::new(data);
        self
    }
}

#[async_trait]
impl Form for BaseForm {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn state(&self) -> &FormState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }
}
