//! # formwork-forms
//!
//! The schema kernel of formwork. Declares typed [`Field`]s, groups them
//! into [`Schema`]s, and runs the async validation pipeline that turns raw
//! input into coerced values. On top of that sit [`Form`] for validating
//! and serializing input, and [`ModelForm`] for forms bound to a persisted
//! [`Model`].
//!
//! ## Module Overview
//!
//! - [`fields`] - The [`Field`] type, its kinds, and their conversions
//! - [`choices`] - Enumerated option sets for choice fields
//! - [`temporal`] - Date, time and datetime parsing and formatting
//! - [`validators`] - Reusable validators attached to fields
//! - [`widgets`] - Presentation metadata for fields
//! - [`schema`] - Ordered field collections and schema inheritance
//! - [`validation`] - The field-level and schema-level pipeline
//! - [`form`] - The [`Form`] trait and [`BaseForm`]
//! - [`model`] - The [`Model`] and [`Manager`] persistence boundary
//! - [`model_form`] - Forms generated from and saved to a model

// These clippy lints are intentionally allowed for the forms crate:
// - struct_excessive_bools: Field carries the flag set every field declares
// - too_many_lines: conversion matches cover every field kind
// - return_self_not_must_use: builder pattern methods are self-documenting
// - doc_markdown: backtick requirements for documentation items are too strict
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

pub mod choices;
pub mod fields;
pub mod form;
pub mod model;
pub mod model_form;
pub mod schema;
pub mod temporal;
pub mod validation;
pub mod validators;
pub mod widgets;

pub use choices::Choices;
pub use fields::{Field, FieldDefault, FieldKind, FieldMetadata};
pub use form::{BaseForm, Form, FormState};
pub use model::{Lookup, Manager, Model, ID_FIELD};
pub use model_form::{model_form_schema, ModelForm, ModelFormFields, ModelFormOptions};
pub use schema::{Schema, SchemaBuilder};
pub use temporal::TemporalKind;
pub use validation::{FieldErrors, ReadOnlyInput};
pub use validators::Validator;
pub use widgets::{Widget, WidgetMetadata, WidgetType};
