//! Model-backed forms.
//!
//! [`model_form_schema`] derives a form schema from a model's schema:
//! model fields are included according to [`ModelFormOptions`], and fields
//! the form declares itself replace model fields of the same name. Model
//! fields that are included unchanged are shared with the model schema,
//! not copied.
//!
//! [`ModelForm`] validates input against that schema and saves it through
//! the model: it copies the validated values onto the instance, checks
//! `unique` fields against storage, runs the model's own validation and
//! asks its manager to persist it.

use std::sync::Arc;

use async_trait::async_trait;
use formwork_core::{Data, FormworkError, FormworkResult, ValidationError};
use tracing::{debug, info};

use crate::form::{Form, FormState};
use crate::model::{Lookup, Model};
use crate::schema::Schema;
use crate::validation::{self, FieldErrors, ReadOnlyInput};

/// Specifies which model fields a model form includes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModelFormFields {
    /// Include every model field.
    #[default]
    All,
    /// Include only the named fields.
    Include(Vec<String>),
    /// Include every field except the named ones.
    Exclude(Vec<String>),
}

impl ModelFormFields {
    /// Returns `true` if the model field `name` is included.
    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Include(names) => names.iter().any(|n| n == name),
            Self::Exclude(names) => !names.iter().any(|n| n == name),
        }
    }
}

/// Configuration for deriving a model form schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFormOptions {
    /// Which model fields to include.
    pub fields: ModelFormFields,
    /// Model fields whose input is ignored by the form.
    pub read_only: Vec<String>,
}

impl ModelFormOptions {
    /// Options including every model field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets which fields to include.
    #[must_use]
    pub fn with_fields(mut self, fields: ModelFormFields) -> Self {
        self.fields = fields;
        self
    }

    /// Marks a model field read-only in the form.
    #[must_use]
    pub fn with_read_only(mut self, name: impl Into<String>) -> Self {
        self.read_only.push(name.into());
        self
    }
}

/// Derives the schema of a form for model `M`.
///
/// Included model fields come first, in model order; `declared` is then
/// overlaid, so a declared field replaces the model field of the same name
/// and new declared fields are appended.
///
/// # Examples
///
/// ```ignore
/// let schema = model_form_schema::<Article>(
///     "ArticleForm",
///     &ModelFormOptions::new().with_fields(ModelFormFields::Include(vec!["title".into()])),
///     &Schema::builder("ArticleForm").field("notify", Field::boolean()).build(),
/// );
/// ```
pub fn model_form_schema<M: Model>(
    name: impl Into<String>,
    options: &ModelFormOptions,
    declared: &Schema,
) -> Schema {
    let mut builder = Schema::builder(name);
    for field in M::schema() {
        if !options.fields.includes(field.name()) {
            continue;
        }
        if options.read_only.iter().any(|n| n == field.name()) {
            builder = builder.shared(Arc::new(field.as_ref().clone().read_only(true)));
        } else {
            builder = builder.shared(Arc::clone(field));
        }
    }
    builder.extend(declared).build()
}

/// A form bound to a model type, optionally editing an existing instance.
pub struct ModelForm<M: Model> {
    schema: Schema,
    state: FormState,
    instance: Option<M>,
}

impl<M: Model> ModelForm<M> {
    /// Creates an unbound form for `schema`, usually built with
    /// [`model_form_schema`].
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            state: FormState::default(),
            instance: None,
        }
    }

    /// Binds input data.
    #[must_use]
    pub fn with_data(mut self, data: Data) -> Self {
        self.state = FormState::new(data);
        self
    }

    /// Binds an existing instance to update on save.
    #[must_use]
    pub fn with_instance(mut self, instance: M) -> Self {
        self.instance = Some(instance);
        self
    }

    /// The bound instance, if any.
    pub const fn instance(&self) -> Option<&M> {
        self.instance.as_ref()
    }

    /// Consumes the form, returning the bound instance.
    pub fn into_instance(self) -> Option<M> {
        self.instance
    }

    /// Validates the input and saves it through the model.
    ///
    /// 1. Validates the form; failures are returned as
    ///    [`FormworkError::ValidationError`].
    /// 2. Builds an instance from the validated data, or copies the
    ///    validated values onto the bound instance (read-only fields are
    ///    never copied). Only fields the model declares are copied.
    /// 3. Checks every `unique` field against storage.
    /// 4. Runs the model's validation, then saves it.
    /// 5. Refreshes the form data from the saved instance.
    ///
    /// A failure after step 2 may leave the bound instance partially
    /// updated.
    pub async fn save(&mut self) -> FormworkResult<&M> {
        self.validate().await?;

        let model_schema = M::schema();
        let validated = &self.state.data;
        let instance = match self.instance.take() {
            Some(mut instance) => {
                for field in &self.schema {
                    if field.read_only || !model_schema.contains(field.name()) {
                        continue;
                    }
                    if let Some(value) = validated.get(field.name()) {
                        instance.set(field.name(), value.clone());
                    }
                }
                instance
            }
            None => M::from_data(
                validated
                    .iter()
                    .filter(|(name, _)| model_schema.contains(name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            ),
        };
        let instance = self.instance.insert(instance);

        check_unique(&self.schema, instance).await?;
        instance.validate().await?;
        instance.save().await?;
        let id = instance.id().cloned().unwrap_or_default();
        info!(schema = self.schema.name(), %id, "saved instance");

        for field in &self.schema {
            if let Some(value) = instance.data().get(field.name()) {
                self.state.data.insert(field.name().to_string(), value.clone());
            }
        }
        Ok(&*instance)
    }
}

/// Fails with `unique` for every unique field whose value is already
/// stored on a different document.
async fn check_unique<M: Model>(schema: &Schema, instance: &M) -> FormworkResult<()> {
    let mut errors = FieldErrors::new();
    for field in schema.iter().filter(|f| f.unique) {
        let value = instance.get(field.name());
        if value.is_null() {
            continue;
        }
        let lookup = Lookup::by(field.name(), value.clone());
        let conflict = match M::objects().get(&lookup).await {
            Ok(existing) => existing.id() != instance.id(),
            Err(FormworkError::DoesNotExist(_)) => false,
            Err(FormworkError::MultipleObjectsReturned(_)) => true,
            Err(e) => return Err(e),
        };
        if conflict {
            debug!(field = field.name(), %lookup, "unique value already stored");
            errors.insert(field.name().to_string(), vec![field.fail("unique", &[])]);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::with_field_errors(errors).into())
    }
}

#[async_trait]
impl<M: Model> Form for ModelForm<M> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn state(&self) -> &FormState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    /// Validates the form; with a bound instance, read-only fields take
    /// the instance's values instead of the submitted ones.
    async fn validate(&mut self) -> Result<(), ValidationError> {
        let cleaned = match &self.instance {
            Some(instance) => {
                let mut data = self.state.data.clone();
                for field in self.schema.iter().filter(|f| f.read_only) {
                    match instance.data().get(field.name()) {
                        Some(value) => data.insert(field.name().to_string(), value.clone()),
                        None => data.remove(field.name()),
                    };
                }
                validation::clean_form_data(&*self, &data, ReadOnlyInput::Keep).await?
            }
            None => validation::full_clean(&*self).await?,
        };
        self.state.data = cleaned;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use crate::model::{validate_model, Manager, ID_FIELD};
    use formwork_core::{data_from_json, Value};
    use serde_json::json;
    use std::sync::{LazyLock, Mutex};

    #[derive(Debug)]
    struct Item {
        data: Data,
    }

    static ITEM_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
        Schema::builder("Item")
            .field("string", Field::string().default("default"))
            .field("number", Field::integer())
            .field("code", Field::string().required(false).unique(true))
            .build()
    });

    /// Stores documents in a vector; enough to exercise the save path.
    struct VecManager {
        documents: Mutex<Vec<Data>>,
    }

    #[async_trait]
    impl Manager<Item> for VecManager {
        async fn get(&self, lookup: &Lookup) -> FormworkResult<Item> {
            let documents = self.documents.lock().unwrap();
            let found: Vec<&Data> = documents
                .iter()
                .filter(|doc| lookup.iter().all(|(k, v)| doc.get(k) == Some(v)))
                .collect();
            match found.as_slice() {
                [] => Err(FormworkError::DoesNotExist(lookup.to_string())),
                [doc] => Ok(Item::from_data((*doc).clone())),
                _ => Err(FormworkError::MultipleObjectsReturned(lookup.to_string())),
            }
        }

        async fn save(&self, instance: &mut Item) -> FormworkResult<()> {
            let mut documents = self.documents.lock().unwrap();
            if instance.id().is_none() {
                let id = Value::from(format!("{}", documents.len() + 1));
                instance.set(ID_FIELD, id);
            }
            let id = instance.id().cloned();
            documents.retain(|doc| doc.get(ID_FIELD) != id.as_ref());
            documents.push(instance.data().clone());
            Ok(())
        }
    }

    static ITEMS: LazyLock<VecManager> = LazyLock::new(|| VecManager {
        documents: Mutex::new(Vec::new()),
    });

    #[async_trait]
    impl Model for Item {
        fn schema() -> &'static Schema {
            &ITEM_SCHEMA
        }
        fn objects() -> &'static dyn Manager<Self> {
            &*ITEMS
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
        async fn validate(&mut self) -> Result<(), ValidationError> {
            validate_model(self).await?;
            if self.get("string") == &Value::from("random") {
                self.set("string", Value::from("42"));
            }
            Ok(())
        }
    }

    fn declared() -> Schema {
        Schema::builder("ItemForm")
            .field("float", Field::float())
            .build()
    }

    #[test]
    fn test_fields_include_filters_model_fields() {
        let options = ModelFormOptions::new()
            .with_fields(ModelFormFields::Include(vec!["string".into()]));
        let schema = model_form_schema::<Item>("ItemForm", &options, &declared());
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["string", "float"]);
    }

    #[test]
    fn test_fields_exclude() {
        let options = ModelFormOptions::new()
            .with_fields(ModelFormFields::Exclude(vec!["number".into()]));
        let schema = model_form_schema::<Item>("ItemForm", &options, &Schema::default());
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["string", "code"]);
    }

    #[test]
    fn test_included_model_field_is_shared() {
        let schema = model_form_schema::<Item>("ItemForm", &ModelFormOptions::new(), &declared());
        assert!(Arc::ptr_eq(
            schema.get("string").unwrap(),
            ITEM_SCHEMA.get("string").unwrap()
        ));
    }

    #[test]
    fn test_declared_field_overrides_model_field() {
        let declared = Schema::builder("ItemForm")
            .field("number", Field::float())
            .build();
        let schema = model_form_schema::<Item>("ItemForm", &ModelFormOptions::new(), &declared);
        assert_eq!(schema.get("number").unwrap().kind.name(), "Float");
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["string", "number", "code"]);
    }

    #[test]
    fn test_read_only_option() {
        let options = ModelFormOptions::new().with_read_only("string");
        let schema = model_form_schema::<Item>("ItemForm", &options, &Schema::default());
        assert!(schema.get("string").unwrap().read_only);
        assert!(!ITEM_SCHEMA.get("string").unwrap().read_only);
    }

    #[tokio::test]
    async fn test_save_runs_model_validation() {
        let options = ModelFormOptions::new()
            .with_fields(ModelFormFields::Include(vec!["string".into()]));
        let schema = model_form_schema::<Item>("ItemForm", &options, &declared());
        let instance = Item::from_data(data_from_json(json!({"string": "test", "number": 1})));
        let mut form = ModelForm::new(schema)
            .with_data(data_from_json(json!({"float": "1", "string": "random"})))
            .with_instance(instance);

        let saved = form.save().await.unwrap();
        assert_eq!(saved.get("string"), &Value::from("42"));
        assert!(saved.get("float").is_null());
        assert_eq!(form.serialize()["string"], json!("42"));
        assert_eq!(form.serialize()["float"], json!(1.0));
    }

    #[tokio::test]
    async fn test_save_invalid_input_is_validation_error() {
        let schema = model_form_schema::<Item>("ItemForm", &ModelFormOptions::new(), &declared());
        let mut form: ModelForm<Item> =
            ModelForm::new(schema).with_data(data_from_json(json!({"number": "x"})));
        let err = form.save().await.unwrap_err();
        let validation = err.as_validation().unwrap();
        assert_eq!(validation.field("number").unwrap().code, "invalid");
        assert!(form.instance().is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_unique_value() {
        let schema = model_form_schema::<Item>("ItemForm", &ModelFormOptions::new(), &Schema::default());
        let data = json!({"number": 1, "code": "dup-check"});

        let mut first: ModelForm<Item> =
            ModelForm::new(schema.clone()).with_data(data_from_json(data.clone()));
        first.save().await.unwrap();

        let mut second: ModelForm<Item> = ModelForm::new(schema).with_data(data_from_json(data));
        let err = second.save().await.unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().field("code").unwrap().message,
            "Value must be unique"
        );
    }

    #[tokio::test]
    async fn test_resaving_same_instance_keeps_unique_value() {
        let schema = model_form_schema::<Item>("ItemForm", &ModelFormOptions::new(), &Schema::default());
        let mut form: ModelForm<Item> = ModelForm::new(schema.clone())
            .with_data(data_from_json(json!({"number": 1, "code": "resave"})));
        form.save().await.unwrap();
        let instance = form.into_instance().unwrap();

        let mut again = ModelForm::new(schema)
            .with_data(data_from_json(json!({"number": 2, "code": "resave"})))
            .with_instance(instance);
        let saved = again.save().await.unwrap();
        assert_eq!(saved.get("number"), &Value::Int(2));
    }

    #[tokio::test]
    async fn test_read_only_required_field_uses_bound_instance_value() {
        let options = ModelFormOptions::new().with_read_only("number");
        let schema = model_form_schema::<Item>("ItemForm", &options, &Schema::default());
        let instance = Item::from_data(data_from_json(json!({"string": "old", "number": 5})));
        let mut form = ModelForm::new(schema)
            .with_data(data_from_json(json!({"string": "new", "number": 9})))
            .with_instance(instance);

        let saved = form.save().await.unwrap();
        assert_eq!(saved.get("number"), &Value::Int(5));
        assert_eq!(saved.get("string"), &Value::from("new"));
        assert_eq!(form.data()["number"], Value::Int(5));
    }

    #[tokio::test]
    async fn test_read_only_required_field_without_instance_is_required() {
        let options = ModelFormOptions::new().with_read_only("number");
        let schema = model_form_schema::<Item>("ItemForm", &options, &Schema::default());
        let mut form: ModelForm<Item> =
            ModelForm::new(schema).with_data(data_from_json(json!({"number": 9})));
        let err = form.validate().await.unwrap_err();
        assert_eq!(err.field("number").unwrap().code, "required");
    }
}
