//! Field definitions and value conversion.
//!
//! A [`Field`] describes one named value: its [`FieldKind`], whether it is
//! required, its default, its validators, its error messages and its
//! presentation hints. Every field converts between three forms of a value:
//!
//! - **raw input**, whatever the caller submitted;
//! - the **rich form** returned by [`Field::to_python`], such as a parsed
//!   date or a decoded map;
//! - the **internal form** returned by [`Field::to_internal_value`], the
//!   storage-friendly encoding (temporal values become strings in fixed
//!   formats).
//!
//! [`Field::to_representation`] renders the presentation form as JSON.
//! [`Field::validate`] runs the whole pipeline: default resolution, the
//! required check, coercion, kind-specific checks and custom validators.
//!
//! Conversions return `None` for absent or unparsable input; only
//! [`Field::clean`] and [`Field::validate`] report failures.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};

use formwork_core::{FormworkError, FormworkResult, ValidationError, Value};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::choices::Choices;
use crate::temporal::{TemporalKind, TemporalOptions};
use crate::validators::{BoxFuture, Validator};
use crate::widgets::{Widget, WidgetMetadata, WidgetType};

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid regex"));

static HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:\w(?:[\w-]{0,61}\w)?\.)+(?:[A-Za-z]{2,6}\.?|[\w-]{2,}\.?)|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})$",
    )
    .expect("valid regex")
});

/// Defines the kind of a field, including kind-specific parameters.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A boolean. Accepts booleans and the usual textual spellings.
    Boolean,
    /// A string, with optional length bounds in characters.
    String {
        /// Minimum length.
        min_length: Option<usize>,
        /// Maximum length.
        max_length: Option<usize>,
    },
    /// A 64-bit integer, with optional bounds.
    Integer {
        /// Minimum allowed value.
        min_value: Option<i64>,
        /// Maximum allowed value.
        max_value: Option<i64>,
    },
    /// A 64-bit float, with optional bounds.
    Float {
        /// Minimum allowed value.
        min_value: Option<f64>,
        /// Maximum allowed value.
        max_value: Option<f64>,
    },
    /// One value out of a [`Choices`] set.
    Choice {
        /// The accepted values.
        choices: Choices,
    },
    /// A list whose elements all belong to a [`Choices`] set.
    MultipleChoice {
        /// The accepted values.
        choices: Choices,
    },
    /// A list, optionally with every element validated by a child field.
    Array {
        /// The element field.
        field: Option<Box<Field>>,
    },
    /// An absolute URL with a scheme and a host.
    Url,
    /// A host name or an IP address literal.
    Host,
    /// Letters, digits, hyphens and underscores.
    Slug,
    /// A string matching a pattern at its start.
    Regex {
        /// The compiled pattern.
        pattern: Regex,
    },
    /// A string-keyed mapping, or a JSON object string.
    Map,
    /// Any JSON document given as a string.
    Json,
    /// A date, date-time or time.
    Temporal {
        /// Which temporal value.
        kind: TemporalKind,
        /// Formats and automatic defaults.
        options: TemporalOptions,
    },
}

impl FieldKind {
    /// A short name for the kind, used in log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::String { .. } => "String",
            Self::Integer { .. } => "Integer",
            Self::Float { .. } => "Float",
            Self::Choice { .. } => "Choice",
            Self::MultipleChoice { .. } => "MultipleChoice",
            Self::Array { .. } => "Array",
            Self::Url => "Url",
            Self::Host => "Host",
            Self::Slug => "Slug",
            Self::Regex { .. } => "Regex",
            Self::Map => "Map",
            Self::Json => "Json",
            Self::Temporal {
                kind: TemporalKind::DateTime,
                ..
            } => "DateTime",
            Self::Temporal {
                kind: TemporalKind::Date,
                ..
            } => "Date",
            Self::Temporal {
                kind: TemporalKind::Time,
                ..
            } => "Time",
        }
    }
}

/// A field default: a literal or a producer evaluated at validation time.
#[derive(Clone)]
pub enum FieldDefault {
    /// A literal value.
    Value(Value),
    /// A synchronous producer.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
    /// An asynchronous producer.
    Async(Arc<dyn Fn() -> BoxFuture<'static, Value> + Send + Sync>),
}

impl FieldDefault {
    /// Produces the default value, awaiting asynchronous producers.
    pub async fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Producer(produce) => produce(),
            Self::Async(produce) => produce().await,
        }
    }

    /// The literal value, if this default is not a producer.
    pub const fn literal(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
            Self::Async(_) => f.write_str("Async(..)"),
        }
    }
}

/// Serializable description of a field, for clients rendering their own UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMetadata {
    /// The field name.
    pub name: String,
    /// The explicit label, or the title-cased name.
    pub label: Option<String>,
    /// Help text.
    pub help_text: Option<String>,
    /// Whether the field is required.
    pub required: bool,
    /// Whether input for the field is ignored.
    pub read_only: bool,
    /// The internal form of a literal default; null otherwise.
    pub default: serde_json::Value,
    /// The widget description.
    pub widget: WidgetMetadata,
}

/// Complete definition of a field.
///
/// Fields are built with a kind constructor followed by builder setters.
/// The name is assigned by the [`Schema`](crate::schema::Schema) the field
/// is declared in.
///
/// # Examples
///
/// ```
/// use formwork_forms::fields::Field;
///
/// let title = Field::string().max_length(64).label("Title");
/// assert!(title.required);
///
/// let views = Field::integer().min_value(0).default(0);
/// assert!(!views.required);
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    /// The field kind, controlling coercion and checks.
    pub kind: FieldKind,
    /// Human-readable label.
    pub label: Option<String>,
    /// Help text displayed alongside the field.
    pub help_text: Option<String>,
    /// Whether an absent value is an error.
    pub required: bool,
    /// Whether input is ignored in favor of the default.
    pub read_only: bool,
    /// Whether saved values must be unique among stored documents.
    pub unique: bool,
    /// The value used when input is absent.
    pub default: Option<FieldDefault>,
    /// Validators run, in order, after coercion.
    pub validators: Vec<Arc<dyn Validator>>,
    /// Message templates keyed by error code.
    pub error_messages: HashMap<String, String>,
    /// Presentation override; the kind's default widget when unset.
    pub widget: Option<Widget>,
}

impl Field {
    /// Creates a required field of the given kind.
    pub fn new(kind: FieldKind) -> Self {
        let error_messages = default_messages(&kind);
        Self {
            name: String::new(),
            kind,
            label: None,
            help_text: None,
            required: true,
            read_only: false,
            unique: false,
            default: None,
            validators: Vec::new(),
            error_messages,
            widget: None,
        }
    }

    /// A boolean field.
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    /// A string field.
    pub fn string() -> Self {
        Self::new(FieldKind::String {
            min_length: None,
            max_length: None,
        })
    }

    /// An integer field.
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer {
            min_value: None,
            max_value: None,
        })
    }

    /// A float field.
    pub fn float() -> Self {
        Self::new(FieldKind::Float {
            min_value: None,
            max_value: None,
        })
    }

    /// A single-choice field.
    pub fn choice(choices: Choices) -> Self {
        Self::new(FieldKind::Choice { choices })
    }

    /// A multiple-choice field.
    pub fn multiple_choice(choices: Choices) -> Self {
        Self::new(FieldKind::MultipleChoice { choices })
    }

    /// A list field with unchecked elements.
    pub fn array() -> Self {
        Self::new(FieldKind::Array { field: None })
    }

    /// A list field whose elements are validated by `field`.
    pub fn array_of(field: Self) -> Self {
        Self::new(FieldKind::Array {
            field: Some(Box::new(field)),
        })
    }

    /// A URL field.
    pub fn url() -> Self {
        Self::new(FieldKind::Url)
    }

    /// A host field.
    pub fn host() -> Self {
        Self::new(FieldKind::Host)
    }

    /// A slug field.
    pub fn slug() -> Self {
        Self::new(FieldKind::Slug)
    }

    /// A field matching `pattern`.
    ///
    /// Fails with [`FormworkError::ImproperlyConfigured`] if the pattern
    /// does not compile.
    pub fn regex(pattern: &str) -> FormworkResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            FormworkError::ImproperlyConfigured(format!("Invalid pattern '{pattern}': {e}"))
        })?;
        Ok(Self::new(FieldKind::Regex { pattern }))
    }

    /// A map field.
    pub fn map() -> Self {
        Self::new(FieldKind::Map)
    }

    /// A JSON document field.
    pub fn json() -> Self {
        Self::new(FieldKind::Json)
    }

    /// A date-time field.
    pub fn datetime() -> Self {
        Self::temporal(TemporalKind::DateTime)
    }

    /// A date field.
    pub fn date() -> Self {
        Self::temporal(TemporalKind::Date)
    }

    /// A time field.
    pub fn time() -> Self {
        Self::temporal(TemporalKind::Time)
    }

    fn temporal(kind: TemporalKind) -> Self {
        Self::new(FieldKind::Temporal {
            kind,
            options: TemporalOptions::default(),
        })
    }

    // ── Builder setters ──────────────────────────────────────────────

    /// Sets whether this field is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets a literal default. A field with a default is not required.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self.required = false;
        self
    }

    /// Sets a default produced on every validation.
    pub fn default_with<F>(mut self, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Producer(Arc::new(produce)));
        self.required = false;
        self
    }

    /// Sets a default produced asynchronously on every validation.
    pub fn default_async<F, Fut>(mut self, produce: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Value> + Send + 'static,
    {
        self.default = Some(FieldDefault::Async(Arc::new(
            move || -> BoxFuture<'static, Value> { Box::pin(produce()) },
        )));
        self.required = false;
        self
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the help text.
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Sets whether input for this field is ignored.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets whether saved values must be unique.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Adds a validator.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Overrides the message template for an error code.
    ///
    /// Templates may reference the error's parameters as `{param}`.
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    /// Overrides the widget.
    pub fn widget(mut self, widget: Widget) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Sets the minimum length of a string field.
    pub fn min_length(mut self, length: usize) -> Self {
        match &mut self.kind {
            FieldKind::String { min_length, .. } => *min_length = Some(length),
            kind => warn!(kind = kind.name(), "min_length ignored"),
        }
        self
    }

    /// Sets the maximum length of a string field.
    pub fn max_length(mut self, length: usize) -> Self {
        match &mut self.kind {
            FieldKind::String { max_length, .. } => *max_length = Some(length),
            kind => warn!(kind = kind.name(), "max_length ignored"),
        }
        self
    }

    /// Sets the minimum of a numeric field.
    #[allow(clippy::cast_precision_loss)]
    pub fn min_value(mut self, value: impl Into<Value>) -> Self {
        match (&mut self.kind, value.into()) {
            (FieldKind::Integer { min_value, .. }, Value::Int(v)) => *min_value = Some(v),
            (FieldKind::Float { min_value, .. }, Value::Int(v)) => *min_value = Some(v as f64),
            (FieldKind::Float { min_value, .. }, Value::Float(v)) => *min_value = Some(v),
            (kind, v) => warn!(kind = kind.name(), bound = %v, "min_value ignored"),
        }
        self
    }

    /// Sets the maximum of a numeric field.
    #[allow(clippy::cast_precision_loss)]
    pub fn max_value(mut self, value: impl Into<Value>) -> Self {
        match (&mut self.kind, value.into()) {
            (FieldKind::Integer { max_value, .. }, Value::Int(v)) => *max_value = Some(v),
            (FieldKind::Float { max_value, .. }, Value::Int(v)) => *max_value = Some(v as f64),
            (FieldKind::Float { max_value, .. }, Value::Float(v)) => *max_value = Some(v),
            (kind, v) => warn!(kind = kind.name(), bound = %v, "max_value ignored"),
        }
        self
    }

    /// Adds an accepted input format to a temporal field.
    pub fn input_format(mut self, format: impl Into<String>) -> Self {
        match &mut self.kind {
            FieldKind::Temporal { options, .. } => options.input_formats.push(format.into()),
            kind => warn!(kind = kind.name(), "input_format ignored"),
        }
        self
    }

    /// Sets the presentation format of a temporal field.
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        match &mut self.kind {
            FieldKind::Temporal { options, .. } => options.output_format = Some(format.into()),
            kind => warn!(kind = kind.name(), "output_format ignored"),
        }
        self
    }

    /// Defaults a temporal field to the current time at every validation.
    pub fn auto_now(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Temporal { kind, options } => {
                options.auto_now = true;
                let kind = *kind;
                self.default = Some(FieldDefault::Producer(Arc::new(move || kind.now())));
                self.required = false;
            }
            kind => warn!(kind = kind.name(), "auto_now ignored"),
        }
        self
    }

    /// Defaults a temporal field to the time at which it was built.
    pub fn auto_now_on_create(mut self) -> Self {
        match &mut self.kind {
            FieldKind::Temporal { kind, options } => {
                options.auto_now_on_create = true;
                self.default = Some(FieldDefault::Value(kind.now()));
                self.required = false;
            }
            kind => warn!(kind = kind.name(), "auto_now_on_create ignored"),
        }
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The name assigned by the owning schema; empty for unattached fields.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The label shown to users: the explicit label or the title-cased name.
    pub fn display_label(&self) -> Option<String> {
        self.label
            .clone()
            .or_else(|| (!self.name.is_empty()).then(|| title_case(&self.name)))
    }

    /// The widget used for presentation.
    pub fn effective_widget(&self) -> Widget {
        self.widget
            .clone()
            .unwrap_or_else(|| default_widget_for_kind(&self.kind))
    }

    // ── Conversion ───────────────────────────────────────────────────

    /// Converts raw input into the rich form.
    ///
    /// Returns `None` for null or unparsable input.
    pub fn to_python(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return None;
        }
        match &self.kind {
            FieldKind::Boolean => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                    "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldKind::String { .. }
            | FieldKind::Url
            | FieldKind::Host
            | FieldKind::Slug
            | FieldKind::Regex { .. } => match value {
                Value::String(_) => Some(value.clone()),
                _ => None,
            },
            FieldKind::Integer { .. } => to_integer(value),
            FieldKind::Float { .. } => to_float(value),
            FieldKind::Choice { choices } => match value {
                Value::List(_) | Value::Map(_) => None,
                _ => Some(choices.resolve(value).unwrap_or(value).clone()),
            },
            FieldKind::MultipleChoice { choices } => value.as_list().map(|items| {
                Value::List(
                    items
                        .iter()
                        .map(|item| choices.resolve(item).unwrap_or(item).clone())
                        .collect(),
                )
            }),
            FieldKind::Array { field } => {
                let items = value.as_list()?;
                match field {
                    Some(inner) => items
                        .iter()
                        .map(|item| inner.to_python(item))
                        .collect::<Option<Vec<_>>>()
                        .map(Value::List),
                    None => Some(value.clone()),
                }
            }
            FieldKind::Map => match value {
                Value::Map(_) => Some(value.clone()),
                Value::String(s) => match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(json @ serde_json::Value::Object(_)) => Some(Value::from(json)),
                    _ => None,
                },
                _ => None,
            },
            FieldKind::Json => match value {
                Value::String(s) => serde_json::from_str::<serde_json::Value>(s)
                    .ok()
                    .map(Value::from),
                Value::List(_) | Value::Map(_) => Some(value.clone()),
                _ => None,
            },
            FieldKind::Temporal { kind, options } => kind.parse(value, &kind.formats(options)),
        }
    }

    /// Converts raw input into the internal storage form.
    ///
    /// Null yields `None`, except for `auto_now` temporal fields, which
    /// yield the current time.
    pub fn to_internal_value(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return match &self.kind {
                FieldKind::Temporal { kind, options } if options.auto_now => {
                    Some(self.store(kind.now()))
                }
                _ => None,
            };
        }
        self.to_python(value).map(|python| self.store(python))
    }

    /// Renders the presentation form as JSON.
    ///
    /// Unparsable input renders as null.
    pub fn to_representation(&self, value: &Value) -> serde_json::Value {
        self.to_python(value)
            .map_or(serde_json::Value::Null, |python| self.present(&python))
    }

    fn store(&self, python: Value) -> Value {
        match &self.kind {
            FieldKind::Temporal { kind, .. } => {
                TemporalKind::format(&python, kind.storage_format()).map_or(python, Value::String)
            }
            FieldKind::Array { field: Some(inner) } => match python {
                Value::List(items) => {
                    Value::List(items.into_iter().map(|item| inner.store(item)).collect())
                }
                other => other,
            },
            _ => python,
        }
    }

    fn present(&self, python: &Value) -> serde_json::Value {
        match &self.kind {
            FieldKind::Temporal { kind, options } => {
                let format = options
                    .output_format
                    .as_deref()
                    .unwrap_or_else(|| kind.storage_format());
                TemporalKind::format(python, format)
                    .map_or(serde_json::Value::Null, serde_json::Value::String)
            }
            FieldKind::Array { field: Some(inner) } => python.as_list().map_or(
                serde_json::Value::Null,
                |items| serde_json::Value::Array(items.iter().map(|i| inner.present(i)).collect()),
            ),
            _ => python.to_json(),
        }
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Coerces a present value into the rich form and runs the kind's checks.
    ///
    /// Elements of an array with a child field are cleaned individually;
    /// the first failing element is reported with its index.
    pub fn clean(&self, value: &Value) -> Result<Value, ValidationError> {
        if let FieldKind::Array { field } = &self.kind {
            let items = value.as_list().ok_or_else(|| self.invalid())?;
            let Some(inner) = field else {
                return Ok(value.clone());
            };
            return items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    inner.clean(item).map_err(|e| {
                        self.fail(
                            "child",
                            &[("index", index.to_string()), ("message", e.message)],
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List);
        }

        let python = self.to_python(value).ok_or_else(|| self.invalid())?;
        self.check(&python)?;
        Ok(python)
    }

    fn check(&self, value: &Value) -> Result<(), ValidationError> {
        match (&self.kind, value) {
            (
                FieldKind::String {
                    min_length,
                    max_length,
                },
                Value::String(s),
            ) => {
                let length = s.chars().count();
                if let Some(min) = min_length.filter(|min| length < *min) {
                    return Err(self.fail("min_length", &[("min_length", min.to_string())]));
                }
                if let Some(max) = max_length.filter(|max| length > *max) {
                    return Err(self.fail("max_length", &[("max_length", max.to_string())]));
                }
            }
            (
                FieldKind::Integer {
                    min_value,
                    max_value,
                },
                Value::Int(n),
            ) => {
                if let Some(min) = min_value.filter(|min| n < min) {
                    return Err(self.fail("min_value", &[("min_value", min.to_string())]));
                }
                if let Some(max) = max_value.filter(|max| n > max) {
                    return Err(self.fail("max_value", &[("max_value", max.to_string())]));
                }
            }
            (
                FieldKind::Float {
                    min_value,
                    max_value,
                },
                Value::Float(n),
            ) => {
                if let Some(min) = min_value.filter(|min| n < min) {
                    return Err(self.fail("min_value", &[("min_value", min.to_string())]));
                }
                if let Some(max) = max_value.filter(|max| n > max) {
                    return Err(self.fail("max_value", &[("max_value", max.to_string())]));
                }
            }
            (FieldKind::Choice { choices }, value) => {
                if !choices.contains(value) {
                    return Err(self.choices_error(choices));
                }
            }
            (FieldKind::MultipleChoice { choices }, Value::List(items)) => {
                if !items.iter().all(|item| choices.contains(item)) {
                    return Err(self.choices_error(choices));
                }
            }
            (FieldKind::Url, Value::String(s)) => {
                let valid = url::Url::parse(s).is_ok_and(|url| url.has_host());
                if !valid {
                    return Err(self.fail("pattern", &[]));
                }
            }
            (FieldKind::Host, Value::String(s)) => {
                if s.parse::<IpAddr>().is_err() && !HOST_RE.is_match(s) {
                    return Err(self.fail("pattern", &[]));
                }
            }
            (FieldKind::Slug, Value::String(s)) => {
                if !SLUG_RE.is_match(s) {
                    return Err(self.fail("pattern", &[]));
                }
            }
            (FieldKind::Regex { pattern }, Value::String(s)) => {
                if !pattern.find(s).is_some_and(|m| m.start() == 0) {
                    return Err(self.fail("pattern", &[("pattern", pattern.as_str().to_string())]));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Validates a value through the whole pipeline.
    ///
    /// Null input is replaced by the default, if any. A still-absent value
    /// fails with `required` on required fields and validates to null on
    /// optional ones. Present values are cleaned, then passed through each
    /// validator in order, stopping at the first failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use formwork_forms::fields::Field;
    /// use formwork_core::Value;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let field = Field::integer().max_value(10);
    /// assert_eq!(field.validate("7").await.unwrap(), Value::Int(7));
    /// assert_eq!(field.validate(11).await.unwrap_err().code, "max_value");
    /// assert_eq!(field.validate(Value::Null).await.unwrap_err().code, "required");
    /// # });
    /// ```
    pub async fn validate(&self, value: impl Into<Value> + Send) -> Result<Value, ValidationError> {
        let mut value = value.into();
        if value.is_null() {
            if let Some(default) = &self.default {
                value = default.resolve().await;
            }
        }
        if value.is_null() {
            if self.required {
                return Err(self.fail("required", &[]));
            }
            return Ok(Value::Null);
        }

        let value = self.clean(&value)?;
        for validator in &self.validators {
            if let Err(e) = validator.validate(&value).await {
                debug!(
                    field = %self.name,
                    validator = validator.name(),
                    code = %e.code,
                    "validator rejected value"
                );
                return Err(e);
            }
        }
        Ok(value)
    }

    // ── Errors ───────────────────────────────────────────────────────

    /// Builds the error for `code` from this field's message templates.
    ///
    /// Unknown codes fall back to the `invalid` template.
    pub fn fail(&self, code: &str, params: &[(&str, String)]) -> ValidationError {
        let template = self
            .error_messages
            .get(code)
            .or_else(|| self.error_messages.get("invalid"))
            .map_or("Value is invalid", String::as_str);
        let mut message = template.replace("{name}", &self.name);
        for (key, value) in params {
            message = message.replace(&format!("{{{key}}}"), value);
        }
        params.iter().fold(
            ValidationError::new(message, code),
            |error, (key, value)| error.with_param(*key, value.clone()),
        )
    }

    fn invalid(&self) -> ValidationError {
        match &self.kind {
            FieldKind::Temporal { kind, options } => {
                self.fail("invalid", &[("formats", kind.formats(options).join(", "))])
            }
            _ => self.fail("invalid", &[]),
        }
    }

    fn choices_error(&self, choices: &Choices) -> ValidationError {
        self.fail("choices", &[("choices", choices.labels().join(", "))])
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// Describes this field for clients.
    pub fn get_metadata(&self) -> FieldMetadata {
        let default = self
            .default
            .as_ref()
            .and_then(FieldDefault::literal)
            .and_then(|value| self.to_internal_value(value))
            .map_or(serde_json::Value::Null, |value| value.to_json());
        FieldMetadata {
            name: self.name.clone(),
            label: self.display_label(),
            help_text: self.help_text.clone(),
            required: self.required,
            read_only: self.read_only,
            default,
            widget: self.effective_widget().get_metadata(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Int(_) => Some(value.clone()),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            Some(Value::Int(*f as i64))
        }
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_float(value: &Value) -> Option<Value> {
    match value {
        Value::Float(f) if f.is_finite() => Some(value.clone()),
        Value::Int(i) => Some(Value::Float(*i as f64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        _ => None,
    }
}

fn title_case(name: &str) -> String {
    name.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the default widget for a field kind.
pub fn default_widget_for_kind(kind: &FieldKind) -> Widget {
    match kind {
        FieldKind::Boolean => Widget::new(WidgetType::CheckboxInput),
        FieldKind::String { .. } | FieldKind::Host | FieldKind::Slug | FieldKind::Regex { .. } => {
            Widget::text()
        }
        FieldKind::Url => Widget::new(WidgetType::UrlInput),
        FieldKind::Integer { .. } | FieldKind::Float { .. } => Widget::number(),
        FieldKind::Choice { choices } => Widget::select(choices),
        FieldKind::MultipleChoice { choices } => Widget::select_multiple(choices),
        FieldKind::Array { .. } | FieldKind::Map | FieldKind::Json => Widget::textarea(),
        FieldKind::Temporal { kind, options } => {
            let widget_type = match kind {
                TemporalKind::DateTime => WidgetType::DateTimeInput,
                TemporalKind::Date => WidgetType::DateInput,
                TemporalKind::Time => WidgetType::TimeInput,
            };
            let format = options
                .output_format
                .as_deref()
                .unwrap_or_else(|| kind.storage_format());
            Widget::new(widget_type).attr("format", format)
        }
    }
}

/// Builds the message catalogue for a kind: base messages overlaid with
/// kind-specific ones.
fn default_messages(kind: &FieldKind) -> HashMap<String, String> {
    let base = [
        ("required", "Value is required"),
        ("invalid", "Value is invalid"),
        ("unique", "Value must be unique"),
    ];
    let specific: Vec<(&str, String)> = match kind {
        FieldKind::Boolean => vec![("invalid", "Value must be a valid boolean".into())],
        FieldKind::String { .. } => vec![
            ("invalid", "Value must be a valid string".into()),
            (
                "min_length",
                "String must be at least {min_length} characters long".into(),
            ),
            (
                "max_length",
                "String must be at most {max_length} characters long".into(),
            ),
        ],
        FieldKind::Integer { .. } | FieldKind::Float { .. } => vec![
            (
                "invalid",
                if matches!(kind, FieldKind::Integer { .. }) {
                    "Value must be a valid integer".into()
                } else {
                    "Value must be a valid float".into()
                },
            ),
            (
                "min_value",
                "Number must be greater than or equal to {min_value}".into(),
            ),
            (
                "max_value",
                "Number must be less than or equal to {max_value}".into(),
            ),
        ],
        FieldKind::Choice { .. } => vec![
            ("invalid", "Value must be a single value".into()),
            ("choices", "Value must be one of: {choices}".into()),
        ],
        FieldKind::MultipleChoice { .. } => vec![
            ("invalid", "Value must be a valid array".into()),
            ("choices", "All values must be one of: {choices}".into()),
        ],
        FieldKind::Array { .. } => vec![
            ("invalid", "Value must be a valid array".into()),
            ("child", "{index}: {message}".into()),
        ],
        FieldKind::Url => vec![
            ("invalid", "Value must be a valid string".into()),
            ("pattern", "Value must be a valid URL".into()),
        ],
        FieldKind::Host => vec![
            ("invalid", "Value must be a valid string".into()),
            ("pattern", "Value must be a valid host".into()),
        ],
        FieldKind::Slug => vec![
            ("invalid", "Value must be a valid string".into()),
            ("pattern", "Value must be a valid slug".into()),
        ],
        FieldKind::Regex { .. } => vec![
            ("invalid", "Value must be a valid string".into()),
            ("pattern", "Value must match the pattern {pattern}".into()),
        ],
        FieldKind::Map => vec![("invalid", "Value must be a map".into())],
        FieldKind::Json => vec![("invalid", "Value must be a valid JSON string".into())],
        FieldKind::Temporal { kind, .. } => vec![(
            "invalid",
            format!("{} must match one of the formats: {{formats}}", kind.label()),
        )],
    };

    let mut messages: HashMap<String, String> = base
        .into_iter()
        .map(|(code, msg)| (code.to_string(), msg.to_string()))
        .collect();
    messages.extend(
        specific
            .into_iter()
            .map(|(code, msg)| (code.to_string(), msg)),
    );
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{AsyncFnValidator, FnValidator};
    use chrono::NaiveDate;

    fn named(mut field: Field, name: &str) -> Field {
        field.name = name.to_string();
        field
    }

    fn choices() -> Choices {
        Choices::new([("A", "a", "A"), ("B", "b", "B")]).unwrap()
    }

    // ── Base behavior ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_required_absent_value() {
        let err = Field::string().validate(Value::Null).await.unwrap_err();
        assert_eq!(err.code, "required");
        assert_eq!(err.message, "Value is required");
    }

    #[tokio::test]
    async fn test_optional_absent_value_is_null() {
        let field = Field::string().required(false);
        assert_eq!(field.validate(Value::Null).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_default_fills_absent_value() {
        let field = Field::string().default("fallback");
        assert!(!field.required);
        assert_eq!(
            field.validate(Value::Null).await.unwrap(),
            Value::from("fallback")
        );
    }

    #[tokio::test]
    async fn test_default_producer_runs_each_time() {
        let counter = Arc::new(std::sync::atomic::AtomicI64::new(0));
        let seen = Arc::clone(&counter);
        let field = Field::integer().default_with(move || {
            Value::Int(seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
        });
        assert_eq!(field.validate(Value::Null).await.unwrap(), Value::Int(0));
        assert_eq!(field.validate(Value::Null).await.unwrap(), Value::Int(1));
    }

    #[tokio::test]
    async fn test_async_default() {
        let field = Field::string().default_async(|| async { Value::from("later") });
        assert_eq!(
            field.validate(Value::Null).await.unwrap(),
            Value::from("later")
        );
    }

    #[tokio::test]
    async fn test_error_message_override() {
        let field = Field::string().error_message("required", "Fill in {name}");
        let field = named(field, "title");
        let err = field.validate(Value::Null).await.unwrap_err();
        assert_eq!(err.message, "Fill in title");
    }

    #[test]
    fn test_error_messages_merge_base_and_kind() {
        let field = Field::string().error_message("unique", "Taken");
        assert_eq!(field.error_messages["required"], "Value is required");
        assert_eq!(field.error_messages["invalid"], "Value must be a valid string");
        assert_eq!(field.error_messages["unique"], "Taken");
    }

    #[tokio::test]
    async fn test_validators_run_in_order_and_stop_at_first_failure() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let field = Field::string()
            .validator(FnValidator::new("first", |_: &Value| {
                Err(ValidationError::new("first failed", "first"))
            }))
            .validator(AsyncFnValidator::new("second", move |_: Value| {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(())
                }
            }));
        let err = field.validate("x").await.unwrap_err();
        assert_eq!(err.code, "first");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validators_see_coerced_value() {
        let field = Field::integer().validator(FnValidator::new("is_int", |v: &Value| {
            assert_eq!(v, &Value::Int(5));
            Ok(())
        }));
        field.validate("5").await.unwrap();
    }

    // ── Metadata ─────────────────────────────────────────────────────

    #[test]
    fn test_get_metadata() {
        let field = named(
            Field::string().default("default").help_text("help"),
            "title_text",
        );
        let meta = serde_json::to_value(field.get_metadata()).unwrap();
        assert_eq!(
            meta,
            serde_json::json!({
                "name": "title_text",
                "label": "Title Text",
                "help_text": "help",
                "required": false,
                "read_only": false,
                "default": "default",
                "widget": {"tag": "input", "attrs": {"type": "text"}},
            })
        );
    }

    #[test]
    fn test_get_metadata_unnamed_has_no_label() {
        let meta = Field::integer().get_metadata();
        assert_eq!(meta.label, None);
        assert_eq!(meta.default, serde_json::Value::Null);
        assert_eq!(meta.widget.attrs["type"], "number");
    }

    #[test]
    fn test_get_metadata_default_is_internal_form() {
        let field = Field::date().default(NaiveDate::from_ymd_opt(2015, 7, 13).unwrap());
        assert_eq!(field.get_metadata().default, serde_json::json!("2015-07-13"));
    }

    #[test]
    fn test_get_metadata_choice_widget() {
        let meta = Field::choice(choices()).get_metadata();
        assert_eq!(meta.widget.tag, "select");
        assert_eq!(meta.widget.options.unwrap().len(), 2);
    }

    #[test]
    fn test_widget_override() {
        let field = Field::string().widget(Widget::textarea());
        assert_eq!(field.get_metadata().widget.tag, "textarea");
    }

    // ── Boolean ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_boolean() {
        let field = Field::boolean();
        assert_eq!(field.validate(true).await.unwrap(), Value::Bool(true));
        assert_eq!(field.validate("off").await.unwrap(), Value::Bool(false));
        let err = field.validate("maybe").await.unwrap_err();
        assert_eq!(err.message, "Value must be a valid boolean");
    }

    // ── String ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_string_rejects_non_strings() {
        let err = Field::string().validate(10).await.unwrap_err();
        assert_eq!(err.code, "invalid");
        assert_eq!(err.message, "Value must be a valid string");
    }

    #[tokio::test]
    async fn test_string_length_bounds() {
        let field = Field::string().min_length(2).max_length(3);
        assert!(field.validate("abc").await.is_ok());

        let err = field.validate("a").await.unwrap_err();
        assert_eq!(err.code, "min_length");
        assert_eq!(err.message, "String must be at least 2 characters long");

        let err = field.validate("abcd").await.unwrap_err();
        assert_eq!(err.code, "max_length");
        assert_eq!(err.params["max_length"], "3");
    }

    #[test]
    fn test_length_setter_on_wrong_kind_is_ignored() {
        let field = Field::integer().max_length(3);
        assert!(matches!(
            field.kind,
            FieldKind::Integer {
                min_value: None,
                max_value: None
            }
        ));
    }

    // ── Numeric ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_integer_coercion() {
        let field = Field::integer();
        assert_eq!(field.validate(" 10 ").await.unwrap(), Value::Int(10));
        assert_eq!(field.validate(3.0).await.unwrap(), Value::Int(3));
        assert_eq!(field.validate("1.5").await.unwrap_err().code, "invalid");
        assert_eq!(field.validate(true).await.unwrap_err().code, "invalid");
    }

    #[tokio::test]
    async fn test_integer_bounds() {
        let field = Field::integer().min_value(11).max_value(20);
        let err = field.validate(10).await.unwrap_err();
        assert_eq!(err.code, "min_value");
        assert_eq!(err.message, "Number must be greater than or equal to 11");
        assert_eq!(field.validate(21).await.unwrap_err().code, "max_value");
        assert_eq!(field.validate("15").await.unwrap(), Value::Int(15));
    }

    #[tokio::test]
    async fn test_integer_bounds_apply_to_default() {
        let too_small = Field::integer().min_value(11).default(10);
        let err = too_small.validate(Value::Null).await.unwrap_err();
        assert_eq!(err.code, "min_value");

        let too_large = Field::integer().max_value(9).default(10);
        let err = too_large.validate(Value::Null).await.unwrap_err();
        assert_eq!(err.code, "max_value");
    }

    #[tokio::test]
    async fn test_float() {
        let field = Field::float().min_value(0.5).max_value(2);
        assert_eq!(field.validate("1.5").await.unwrap(), Value::Float(1.5));
        assert_eq!(field.validate(1).await.unwrap(), Value::Float(1.0));
        assert_eq!(field.validate(0.1).await.unwrap_err().code, "min_value");
        assert_eq!(field.validate(2.5).await.unwrap_err().code, "max_value");
        assert_eq!(
            field.validate("x").await.unwrap_err().message,
            "Value must be a valid float"
        );
    }

    // ── Choice ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_choice() {
        let field = Field::choice(choices());
        assert_eq!(field.validate("a").await.unwrap(), Value::from("a"));
        let err = field.validate("c").await.unwrap_err();
        assert_eq!(err.code, "choices");
        assert_eq!(err.message, "Value must be one of: A, B");
        assert_eq!(field.validate(vec!["a"]).await.unwrap_err().code, "invalid");
    }

    #[tokio::test]
    async fn test_choice_resolves_text_input_to_stored_value() {
        let numbers = Choices::new([("ONE", 1_i64, "One"), ("TWO", 2, "Two")]).unwrap();
        let field = Field::choice(numbers);
        assert_eq!(field.validate("2").await.unwrap(), Value::Int(2));
    }

    #[tokio::test]
    async fn test_multiple_choice() {
        let field = Field::multiple_choice(choices());
        assert_eq!(
            field.validate(vec!["a", "b"]).await.unwrap(),
            Value::from(vec!["a", "b"])
        );
        let err = field.validate(vec!["a", "z"]).await.unwrap_err();
        assert_eq!(err.code, "choices");
        let err = field.validate("a").await.unwrap_err();
        assert_eq!(err.message, "Value must be a valid array");
    }

    // ── Array ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_array_without_child_field() {
        let field = Field::array();
        let value = Value::List(vec![Value::Int(1), Value::from("x")]);
        assert_eq!(field.validate(value.clone()).await.unwrap(), value);
        assert_eq!(field.validate("x").await.unwrap_err().code, "invalid");
    }

    #[tokio::test]
    async fn test_array_child_error_reports_index() {
        let field = Field::array_of(Field::integer());
        assert_eq!(
            field.validate(vec!["1", "2"]).await.unwrap(),
            Value::from(vec![1_i64, 2])
        );
        let err = field.validate(vec!["1", "x"]).await.unwrap_err();
        assert_eq!(err.code, "child");
        assert_eq!(err.message, "1: Value must be a valid integer");
        assert_eq!(err.params["index"], "1");
    }

    #[test]
    fn test_array_of_dates_stores_strings() {
        let field = Field::array_of(Field::date());
        let internal = field
            .to_internal_value(&Value::from(vec!["2015-07-13"]))
            .unwrap();
        assert_eq!(internal, Value::from(vec!["2015-07-13"]));
        assert_eq!(
            field.to_representation(&internal),
            serde_json::json!(["2015-07-13"])
        );
    }

    // ── Url / Host / Slug / Regex ────────────────────────────────────

    #[tokio::test]
    async fn test_url() {
        let field = Field::url();
        assert!(field.validate("https://example.com/path?q=1").await.is_ok());
        let err = field.validate(":/wrong").await.unwrap_err();
        assert_eq!(err.code, "pattern");
        assert_eq!(err.message, "Value must be a valid URL");
        assert_eq!(field.validate("mailto:a@b.c").await.unwrap_err().code, "pattern");
        assert_eq!(field.validate(1).await.unwrap_err().code, "invalid");
    }

    #[tokio::test]
    async fn test_host() {
        let field = Field::host();
        assert!(field.validate("example.com").await.is_ok());
        assert!(field.validate("127.0.0.1").await.is_ok());
        assert!(field.validate("::1").await.is_ok());
        assert_eq!(field.validate("not a host").await.unwrap_err().code, "pattern");
    }

    #[tokio::test]
    async fn test_slug() {
        let field = Field::slug();
        assert!(field.validate("my-slug_1").await.is_ok());
        assert_eq!(field.validate("my slug").await.unwrap_err().code, "pattern");
    }

    #[tokio::test]
    async fn test_regex_matches_at_start() {
        let field = Field::regex(r"\d{3}").unwrap();
        assert!(field.validate("123abc").await.is_ok());
        let err = field.validate("abc123").await.unwrap_err();
        assert_eq!(err.code, "pattern");
        assert_eq!(err.message, r"Value must match the pattern \d{3}");
    }

    #[test]
    fn test_regex_invalid_pattern() {
        assert!(matches!(
            Field::regex("("),
            Err(FormworkError::ImproperlyConfigured(_))
        ));
    }

    // ── Map / Json ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_map_accepts_json_object_string() {
        let field = Field::map();
        let value = field.validate(r#"{"key": "value"}"#).await.unwrap();
        assert_eq!(value.as_map().unwrap()["key"], Value::from("value"));
        assert_eq!(
            field.validate("[1, 2]").await.unwrap_err().message,
            "Value must be a map"
        );
        assert_eq!(field.validate(1).await.unwrap_err().code, "invalid");
    }

    #[tokio::test]
    async fn test_json() {
        let field = Field::json();
        assert_eq!(
            field.validate("[1, 2]").await.unwrap(),
            Value::from(vec![1_i64, 2])
        );
        assert_eq!(field.validate("{oops").await.unwrap_err().code, "invalid");
    }

    // ── Temporal ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_datetime_conversions() {
        let field = Field::datetime();
        let value = field.validate("2015-07-13T14:08:12").await.unwrap();
        let expected = NaiveDate::from_ymd_opt(2015, 7, 13)
            .unwrap()
            .and_hms_opt(14, 8, 12)
            .unwrap();
        assert_eq!(value, Value::DateTime(expected));
        assert_eq!(
            field.to_internal_value(&value),
            Some(Value::from("2015-07-13T14:08:12"))
        );
        assert_eq!(
            field.to_representation(&value),
            serde_json::json!("2015-07-13T14:08:12")
        );
    }

    #[tokio::test]
    async fn test_date_input_and_output_formats() {
        let field = Field::date().input_format("%d.%m.%Y").output_format("%d/%m/%Y");
        let value = field.validate("13.07.2015").await.unwrap();
        assert_eq!(
            field.to_representation(&value),
            serde_json::json!("13/07/2015")
        );
        assert_eq!(
            field.get_metadata().widget.attrs["format"],
            "%d/%m/%Y"
        );
    }

    #[tokio::test]
    async fn test_time_invalid_lists_formats() {
        let field = Field::time();
        let err = field.validate("noon").await.unwrap_err();
        assert_eq!(err.code, "invalid");
        assert!(err.message.starts_with("Time must match one of the formats: "));
        assert!(err.message.contains("%H:%M:%S"));
    }

    #[test]
    fn test_unparsable_temporal_converts_to_none() {
        let field = Field::date();
        assert_eq!(field.to_python(&Value::from("nope")), None);
        assert_eq!(field.to_internal_value(&Value::from("nope")), None);
        assert_eq!(
            field.to_representation(&Value::from("nope")),
            serde_json::Value::Null
        );
    }

    #[tokio::test]
    async fn test_auto_now() {
        let field = Field::date().auto_now();
        assert!(!field.required);
        assert!(matches!(
            field.validate(Value::Null).await.unwrap(),
            Value::Date(_)
        ));
        assert!(field.to_internal_value(&Value::Null).is_some());
        assert!(Field::date().to_internal_value(&Value::Null).is_none());
    }

    #[tokio::test]
    async fn test_auto_now_on_create_is_fixed() {
        let field = Field::datetime().auto_now_on_create();
        let first = field.validate(Value::Null).await.unwrap();
        let second = field.validate(Value::Null).await.unwrap();
        assert_eq!(first, second);
        assert!(field.get_metadata().default.is_string());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("first_name"), "First Name");
        assert_eq!(title_case("url"), "Url");
    }
}
