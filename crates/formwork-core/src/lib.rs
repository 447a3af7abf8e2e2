//! # formwork-core
//!
//! Core types shared by every formwork crate. This crate has no framework
//! dependencies and provides the foundation the schema kernel is built on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`value`] - The dynamic [`Value`] carried through fields and models
//! - [`settings`] - Process settings and the global configuration slot
//! - [`settings_loader`] - Loading settings from TOML and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{FormworkError, FormworkResult, ValidationError, COMMON_ERRORS_KEY};
pub use settings::Settings;
pub use value::{data_from_json, Data, Value};
