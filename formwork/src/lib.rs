//! # formwork
//!
//! Declarative, async schema validation and serialization.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formwork` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```
//! use formwork::prelude::*;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let schema = Schema::builder("Contact")
//!     .field("name", Field::string().max_length(50))
//!     .field("age", Field::integer().min_value(0).required(false))
//!     .build();
//!
//! let mut form = BaseForm::new(schema).with_data(data_from_json(formwork::serde_json::json!({
//!     "name": "Ada",
//!     "age": "36",
//! })));
//! assert!(form.is_valid().await);
//! assert_eq!(form.data()["age"], Value::Int(36));
//! # });
//! ```

/// Core types: errors, the dynamic `Value`, settings, and logging.
pub use formwork_core as core;

/// Fields, schemas, forms, models, and model forms.
pub use formwork_forms as forms;

/// In-memory model storage.
#[cfg(feature = "db")]
pub use formwork_db as db;

/// Third-party crates used in formwork's public API.
pub use async_trait::async_trait;
pub use chrono;
pub use serde_json;
pub use tracing;

/// The types most programs need, in one import.
pub mod prelude {
    pub use formwork_core::{
        data_from_json, Data, FormworkError, FormworkResult, Settings, ValidationError, Value,
    };
    pub use formwork_forms::{
        model_form_schema, BaseForm, Choices, Field, Form, FormState, Lookup, Manager, Model,
        ModelForm, ModelFormFields, ModelFormOptions, Schema, ID_FIELD,
    };

    #[cfg(feature = "db")]
    pub use formwork_db::MemoryManager;

    pub use async_trait::async_trait;
}
