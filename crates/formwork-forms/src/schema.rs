//! Ordered, named collections of fields.
//!
//! A [`Schema`] is built once, usually into a `static LazyLock`, and shared
//! by every form or model that uses it. Building a schema assigns each
//! field its name. Schemas compose: a builder can start from a parent
//! schema, and a field declared under an existing name replaces the
//! inherited one in place while new names are appended.

use std::sync::Arc;

use formwork_core::{Data, Value};

use crate::fields::{Field, FieldMetadata};

/// An ordered mapping from field name to field.
///
/// Cloning a schema is cheap and shares the field definitions.
///
/// # Examples
///
/// ```
/// use formwork_forms::fields::Field;
/// use formwork_forms::schema::Schema;
///
/// let base = Schema::builder("Base")
///     .field("title", Field::string())
///     .field("body", Field::string())
///     .build();
/// let child = Schema::builder("Child")
///     .extend(&base)
///     .field("title", Field::string().max_length(10))
///     .field("tags", Field::array())
///     .build();
///
/// let names: Vec<_> = child.names().collect();
/// assert_eq!(names, vec!["title", "body", "tags"]);
/// assert_eq!(child.get("title").unwrap().name(), "title");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    fields: Vec<Arc<Field>>,
}

impl Schema {
    /// Starts building a schema called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The schema name, used in log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field called `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<Field>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns `true` if a field called `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over the fields in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Field>> {
        self.fields.iter()
    }

    /// Iterates over the field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name())
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Describes every field, in declaration order.
    pub fn get_options(&self) -> Vec<FieldMetadata> {
        self.fields.iter().map(|f| f.get_metadata()).collect()
    }

    /// Converts declared entries of `data` into their internal form.
    ///
    /// Undeclared entries are copied unchanged; entries that do not convert
    /// are kept as given.
    pub fn to_internal(&self, data: &Data) -> Data {
        data.iter()
            .map(|(key, value)| {
                let internal = match self.get(key) {
                    Some(field) if !value.is_null() => field
                        .to_internal_value(value)
                        .unwrap_or_else(|| value.clone()),
                    _ => value.clone(),
                };
                (key.clone(), internal)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Arc<Field>;
    type IntoIter = std::slice::Iter<'a, Arc<Field>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Arc<Field>>,
}

impl SchemaBuilder {
    /// Inherits every field of `parent`, keeping their definitions shared.
    pub fn extend(mut self, parent: &Schema) -> Self {
        for field in parent.iter() {
            self.put(Arc::clone(field));
        }
        self
    }

    /// Declares `field` under `name`.
    pub fn field(mut self, name: impl Into<String>, mut field: Field) -> Self {
        field.name = name.into();
        self.put(Arc::new(field));
        self
    }

    /// Declares an already-named, shared field.
    pub fn shared(mut self, field: Arc<Field>) -> Self {
        self.put(field);
        self
    }

    fn put(&mut self, field: Arc<Field>) {
        match self.fields.iter_mut().find(|f| f.name() == field.name()) {
            Some(slot) => *slot = field,
            None => self.fields.push(field),
        }
    }

    /// Finishes the schema.
    pub fn build(self) -> Schema {
        Schema {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// Reads `name` from `data`, treating an absent key as null.
pub(crate) fn lookup<'a>(data: &'a Data, name: &str) -> &'a Value {
    data.get(name).unwrap_or(&formwork_core::value::NULL)
}
