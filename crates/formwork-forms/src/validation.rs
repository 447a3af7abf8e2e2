//! Validation pipeline for forms and models.
//!
//! 1. Field-level validation: every declared field validates its entry,
//!    in declaration order, and the coerced value is written back.
//! 2. Schema-level validation: the form's [`clean`](crate::form::Form::clean)
//!    hook sees the coerced data and may adjust it or reject it.
//!
//! Field errors accumulate rather than short-circuiting, so every failing
//! field is reported at once. The schema-level hook only runs when every
//! field passed.

use std::collections::HashMap;

use formwork_core::logging::validation_span;
use formwork_core::{Data, ValidationError, Value};
use tracing::{debug, Instrument};

use crate::form::Form;
use crate::schema::{lookup, Schema};

/// Per-field error lists keyed by field name (or `"common"`).
pub type FieldErrors = HashMap<String, Vec<ValidationError>>;

/// How input for read-only fields is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOnlyInput {
    /// Ignore submitted input and validate the default instead.
    Ignore,
    /// Validate whatever the data holds.
    Keep,
}

/// Performs field-level validation for every field in `schema`.
///
/// Returns a copy of `data` with each declared field replaced by its
/// coerced value (entries for failing fields are left as submitted) and
/// the accumulated errors. Undeclared entries are carried over unchanged.
pub async fn clean_fields(
    schema: &Schema,
    data: &Data,
    read_only: ReadOnlyInput,
) -> (Data, FieldErrors) {
    let mut cleaned = data.clone();
    let mut errors = FieldErrors::new();

    for field in schema {
        let raw = if field.read_only && read_only == ReadOnlyInput::Ignore {
            Value::Null
        } else {
            lookup(&cleaned, field.name()).clone()
        };

        match field.validate(raw).await {
            Ok(value) => {
                cleaned.insert(field.name().to_string(), value);
            }
            Err(error) => {
                debug!(
                    field = field.name(),
                    kind = field.kind.name(),
                    code = %error.code,
                    "field failed validation"
                );
                errors.insert(field.name().to_string(), vec![error]);
            }
        }
    }

    (cleaned, errors)
}

/// Validates `data` against `schema`, returning the coerced data or a
/// compound error holding every field failure.
pub async fn validate_data(
    schema: &Schema,
    data: &Data,
    read_only: ReadOnlyInput,
) -> Result<Data, ValidationError> {
    let (cleaned, errors) = clean_fields(schema, data, read_only)
        .instrument(validation_span(schema.name()))
        .await;
    if errors.is_empty() {
        Ok(cleaned)
    } else {
        Err(ValidationError::with_field_errors(errors))
    }
}

/// Performs the full pipeline for a form: field-level, then its `clean`
/// hook on the coerced data.
///
/// Does not touch the form's state; the caller decides what to keep.
pub async fn full_clean<F: Form + ?Sized>(form: &F) -> Result<Data, ValidationError> {
    clean_form_data(form, form.data(), ReadOnlyInput::Ignore).await
}

/// Like [`full_clean`], but validates `data` instead of the form's own
/// data, treating read-only fields according to `read_only`.
pub async fn clean_form_data<F: Form + ?Sized>(
    form: &F,
    data: &Data,
    read_only: ReadOnlyInput,
) -> Result<Data, ValidationError> {
    let span = validation_span(form.schema().name());
    async {
        let (mut cleaned, errors) = clean_fields(form.schema(), data, read_only).await;
        if !errors.is_empty() {
            return Err(ValidationError::with_field_errors(errors));
        }
        if let Err(error) = form.clean(&mut cleaned).await {
            debug!(code = %error.code, "schema-level validation failed");
            let mut combined = ValidationError::with_field_errors(FieldErrors::new());
            combined.merge(error);
            return Err(combined);
        }
        Ok(cleaned)
    }
    .instrument(span)
    .await
}
