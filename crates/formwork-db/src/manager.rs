//! In-memory document storage.
//!
//! [`MemoryManager`] holds the documents of one model in a `Vec` behind an
//! async read-write lock. It is meant for tests, prototypes and small
//! single-process tools; documents do not survive the process.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use formwork_core::{Data, FormworkError, FormworkResult, Value};
use formwork_forms::{Lookup, Manager, Model, ID_FIELD};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// A [`Manager`] that stores documents in process memory.
///
/// Saved documents are converted to their internal form with the model's
/// schema. Lookup values are converted the same way before comparison, so
/// a lookup may use rich values such as dates.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use formwork_core::Data;
/// use formwork_db::MemoryManager;
/// use formwork_forms::{Field, Lookup, Manager, Model, Schema};
///
/// struct Tag {
///     data: Data,
/// }
///
/// static SCHEMA: LazyLock<Schema> =
///     LazyLock::new(|| Schema::builder("Tag").field("name", Field::string()).build());
/// static TAGS: LazyLock<MemoryManager<Tag>> = LazyLock::new(|| MemoryManager::new("tags"));
///
/// impl Model for Tag {
///     fn schema() -> &'static Schema {
///         &SCHEMA
///     }
///     fn objects() -> &'static dyn Manager<Self> {
///         &*TAGS
///     }
///     fn from_data(data: Data) -> Self {
///         Self { data }
///     }
///     fn data(&self) -> &Data {
///         &self.data
///     }
///     fn data_mut(&mut self) -> &mut Data {
///         &mut self.data
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut tag = Tag::from_data(Data::new());
/// tag.set("name", "rust".into());
/// tag.save().await.unwrap();
///
/// let found = TAGS.get(&Lookup::by("name", "rust")).await.unwrap();
/// assert_eq!(found.id(), tag.id());
/// # });
/// ```
pub struct MemoryManager<M> {
    name: String,
    documents: RwLock<Vec<Data>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> MemoryManager<M> {
    /// Creates an empty store. `name` appears in errors and log lines.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            _model: PhantomData,
        }
    }

    /// The store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns every stored document, in insertion order.
    pub async fn all(&self) -> Vec<M> {
        self.filter(&Lookup::default()).await
    }

    /// Returns every document matching `lookup`, in insertion order.
    pub async fn filter(&self, lookup: &Lookup) -> Vec<M> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .filter(|doc| matches::<M>(doc, lookup))
            .map(|doc| M::from_data(doc.clone()))
            .collect()
    }

    /// The number of stored documents.
    pub async fn count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Removes every document matching `lookup`, returning how many were
    /// removed.
    pub async fn delete(&self, lookup: &Lookup) -> usize {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|doc| !matches::<M>(doc, lookup));
        let removed = before - documents.len();
        debug!(store = %self.name, %lookup, removed, "deleted documents");
        removed
    }

    /// Removes every document.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }
}

impl<M> fmt::Debug for MemoryManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryManager")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Returns `true` if `doc` satisfies every criterion of `lookup`.
fn matches<M: Model>(doc: &Data, lookup: &Lookup) -> bool {
    lookup.iter().all(|(name, expected)| {
        let expected = M::schema()
            .get(name)
            .and_then(|field| field.to_internal_value(expected))
            .unwrap_or_else(|| expected.clone());
        doc.get(name).unwrap_or(&Value::Null) == &expected
    })
}

#[async_trait]
impl<M: Model> Manager<M> for MemoryManager<M> {
    async fn get(&self, lookup: &Lookup) -> FormworkResult<M> {
        let documents = self.documents.read().await;
        let mut found = documents.iter().filter(|doc| matches::<M>(doc, lookup));
        match (found.next(), found.next()) {
            (Some(doc), None) => {
                trace!(store = %self.name, %lookup, "found document");
                Ok(M::from_data(doc.clone()))
            }
            (None, _) => Err(FormworkError::DoesNotExist(format!(
                "{} matching {lookup}",
                self.name
            ))),
            (Some(_), Some(_)) => Err(FormworkError::MultipleObjectsReturned(format!(
                "{} matching {lookup}",
                self.name
            ))),
        }
    }

    async fn save(&self, instance: &mut M) -> FormworkResult<()> {
        let id = match instance.id() {
            Some(id) => id.clone(),
            None => {
                let id = Value::String(uuid::Uuid::new_v4().to_string());
                instance.set(ID_FIELD, id.clone());
                id
            }
        };
        let document = M::schema().to_internal(instance.data());

        let mut documents = self.documents.write().await;
        match documents
            .iter_mut()
            .find(|doc| doc.get(ID_FIELD) == Some(&id))
        {
            Some(slot) => {
                *slot = document;
                debug!(store = %self.name, %id, "updated document");
            }
            None => {
                documents.push(document);
                debug!(store = %self.name, %id, "inserted document");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::data_from_json;
    use formwork_forms::{Field, Schema};
    use serde_json::json;
    use std::sync::LazyLock;

    static EVENT_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
        Schema::builder("Event")
            .field("title", Field::string())
            .field("day", Field::date())
            .build()
    });

    // Each test gets its own model type so that parallel tests never share
    // a store.
    macro_rules! event_model {
        ($model:ident, $store:ident) => {
            #[derive(Debug)]
            struct $model {
                data: Data,
            }

            static $store: LazyLock<MemoryManager<$model>> =
                LazyLock::new(|| MemoryManager::new(stringify!($store)));

            impl Model for $model {
                fn schema() -> &'static Schema {
                    &EVENT_SCHEMA
                }
                fn objects() -> &'static dyn Manager<Self> {
                    &*$store
                }
                fn from_data(data: Data) -> Self {
                    Self { data }
                }
                fn data(&self) -> &Data {
                    &self.data
                }
                fn data_mut(&mut self) -> &mut Data {
                    &mut self.data
                }
            }
        };
    }

    event_model!(SaveEvent, SAVE_EVENTS);
    event_model!(LookupEvent, LOOKUP_EVENTS);
    event_model!(DeleteEvent, DELETE_EVENTS);

    async fn store<M: Model>(title: &str, day: &str) -> M {
        let mut event = M::from_data(data_from_json(json!({"title": title, "day": day})));
        event.validate().await.unwrap();
        event.save().await.unwrap();
        event
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_stores_internal_form() {
        let event: SaveEvent = store("launch", "2024-05-01").await;
        let id = event.id().cloned().unwrap();
        assert!(matches!(id, Value::String(_)));
        assert!(matches!(event.get("day"), Value::Date(_)));

        let stored = SAVE_EVENTS.get(&Lookup::id(id)).await.unwrap();
        assert_eq!(stored.get("day"), &Value::from("2024-05-01"));
        assert_eq!(SAVE_EVENTS.count().await, 1);
    }

    #[tokio::test]
    async fn test_save_twice_updates_in_place() {
        let mut event: SaveEvent = store("draft", "2024-01-01").await;
        let id = event.id().cloned().unwrap();
        event.set("title", Value::from("final"));
        event.save().await.unwrap();

        let stored = SAVE_EVENTS.get(&Lookup::id(id.clone())).await.unwrap();
        assert_eq!(stored.get("title"), &Value::from("final"));
        assert_eq!(SAVE_EVENTS.filter(&Lookup::id(id)).await.len(), 1);
    }

    #[tokio::test]
    async fn test_get_outcomes() {
        let _: LookupEvent = store("a", "2023-03-03").await;
        let _: LookupEvent = store("b", "2023-03-03").await;

        let day = chrono::NaiveDate::from_ymd_opt(2023, 3, 3).unwrap();
        let err = LOOKUP_EVENTS.get(&Lookup::by("day", day)).await.unwrap_err();
        assert!(matches!(err, FormworkError::MultipleObjectsReturned(_)));

        let found = LOOKUP_EVENTS
            .get(&Lookup::by("day", "2023-03-03").and("title", "b"))
            .await
            .unwrap();
        assert_eq!(found.get("title"), &Value::from("b"));

        let err = LOOKUP_EVENTS
            .get(&Lookup::by("title", "missing"))
            .await
            .unwrap_err();
        assert!(err.is_does_not_exist());
        assert!(err.to_string().contains("LOOKUP_EVENTS matching title=missing"));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let _: DeleteEvent = store("keep", "2022-02-02").await;
        let _: DeleteEvent = store("drop", "2022-02-02").await;
        let _: DeleteEvent = store("drop", "2022-02-03").await;

        assert_eq!(DELETE_EVENTS.delete(&Lookup::by("title", "drop")).await, 2);
        let left = DELETE_EVENTS.all().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].get("title"), &Value::from("keep"));

        DELETE_EVENTS.clear().await;
        assert_eq!(DELETE_EVENTS.count().await, 0);
    }
}
