//! The persistence boundary: models and their managers.
//!
//! A [`Model`] is a document described by a static [`Schema`]. Its values
//! live in a [`Data`] mapping; the identifier assigned by storage is kept
//! under [`ID_FIELD`]. Persistence is delegated to the model's
//! [`Manager`], which formwork only ever asks to fetch one document by a
//! [`Lookup`] or to save one.

use std::fmt;

use async_trait::async_trait;
use formwork_core::{Data, FormworkResult, ValidationError, Value};

use crate::schema::{lookup, Schema};
use crate::validation::{validate_data, ReadOnlyInput};

/// Key under which a stored document's identifier is kept.
pub const ID_FIELD: &str = "_id";

/// Field/value pairs a stored document must all match.
///
/// # Examples
///
/// ```
/// use formwork_forms::model::Lookup;
///
/// let lookup = Lookup::by("slug", "hello").and("published", true);
/// assert_eq!(lookup.len(), 2);
/// assert_eq!(lookup.to_string(), "slug=hello, published=true");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup {
    criteria: Vec<(String, Value)>,
}

impl Lookup {
    /// A lookup with a single criterion.
    pub fn by(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and(field, value)
    }

    /// A lookup by stored identifier.
    pub fn id(id: impl Into<Value>) -> Self {
        Self::by(ID_FIELD, id)
    }

    /// Adds a criterion.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.criteria.push((field.into(), value.into()));
        self
    }

    /// Iterates over the criteria.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.criteria.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of criteria.
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Returns `true` if the lookup matches everything.
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .criteria
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Fetches and stores documents of one model.
///
/// Failing lookups report [`FormworkError::DoesNotExist`] or
/// [`FormworkError::MultipleObjectsReturned`]; storage failures use
/// [`FormworkError::DatabaseError`].
///
/// [`FormworkError::DoesNotExist`]: formwork_core::FormworkError::DoesNotExist
/// [`FormworkError::MultipleObjectsReturned`]: formwork_core::FormworkError::MultipleObjectsReturned
/// [`FormworkError::DatabaseError`]: formwork_core::FormworkError::DatabaseError
#[async_trait]
pub trait Manager<M: Model>: Send + Sync {
    /// Returns the single document matching `lookup`.
    async fn get(&self, lookup: &Lookup) -> FormworkResult<M>;

    /// Stores `instance`, assigning its identifier if it has none.
    async fn save(&self, instance: &mut M) -> FormworkResult<()>;
}

/// A persistable document described by a static schema.
#[async_trait]
pub trait Model: Sized + Send + Sync + 'static {
    /// The schema every instance is validated against.
    fn schema() -> &'static Schema;

    /// The manager that stores instances.
    fn objects() -> &'static dyn Manager<Self>;

    /// Builds an instance from a document.
    fn from_data(data: Data) -> Self;

    /// The instance's values.
    fn data(&self) -> &Data;

    /// The instance's values, mutably.
    fn data_mut(&mut self) -> &mut Data;

    /// The stored identifier, once saved.
    fn id(&self) -> Option<&Value> {
        self.data().get(ID_FIELD).filter(|v| !v.is_null())
    }

    /// Reads a value; absent keys read as null.
    fn get(&self, name: &str) -> &Value {
        lookup(self.data(), name)
    }

    /// Writes a value.
    fn set(&mut self, name: &str, value: Value) {
        self.data_mut().insert(name.to_string(), value);
    }

    /// Validates the instance against its schema.
    ///
    /// Override to add model-level checks or normalization; call
    /// [`validate_model`] to keep the field-level pass.
    async fn validate(&mut self) -> Result<(), ValidationError> {
        validate_model(self).await
    }

    /// Persists the instance through its manager.
    async fn save(&mut self) -> FormworkResult<()> {
        Self::objects().save(self).await
    }

    /// Renders the presentation form of every schema field.
    fn serialize(&self) -> serde_json::Map<String, serde_json::Value> {
        Self::schema()
            .iter()
            .map(|field| {
                let value = lookup(self.data(), field.name());
                (field.name().to_string(), field.to_representation(value))
            })
            .collect()
    }
}

/// Validates `instance` field by field, replacing its values with the
/// coerced ones on success.
///
/// Read-only fields keep their stored values.
pub async fn validate_model<M: Model>(instance: &mut M) -> Result<(), ValidationError> {
    let cleaned = validate_data(M::schema(), instance.data(), ReadOnlyInput::Keep).await?;
    *instance.data_mut() = cleaned;
    Ok(())
}
