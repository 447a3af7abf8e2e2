//! Dynamic value type carried through fields, forms and models.
//!
//! The [`Value`] enum is the common currency of the schema kernel: raw
//! input, coerced values and stored documents are all expressed with it.
//! It provides conversions from standard Rust types and from
//! `serde_json::Value`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Storage format of date-time values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Storage format of date values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Storage format of time values.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A mapping from field name to value, used for form input and documents.
///
/// An absent key is equivalent to [`Value::Null`].
pub type Data = HashMap<String, Value>;

/// A shared null, handed out for absent keys.
pub static NULL: Value = Value::Null;

/// Builds a [`Data`] mapping from a JSON object.
///
/// Anything other than an object yields an empty mapping.
///
/// # Examples
///
/// ```
/// use formwork_core::value::{data_from_json, Value};
///
/// let data = data_from_json(serde_json::json!({"title": "hello", "views": 3}));
/// assert_eq!(data["views"], Value::Int(3));
/// ```
pub fn data_from_json(json: serde_json::Value) -> Data {
    match json {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect(),
        _ => Data::new(),
    }
}

/// A dynamically typed value.
///
/// # Examples
///
/// ```
/// use formwork_core::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v.as_str(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// A date without time.
    Date(chrono::NaiveDate),
    /// A date and time without timezone.
    DateTime(chrono::NaiveDateTime),
    /// A time without date.
    Time(chrono::NaiveTime),
    /// An ordered sequence of values.
    List(Vec<Value>),
    /// A string-keyed mapping of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string slice if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a [`Value::Map`].
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// A short name for the variant, used in log lines.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Time(_) => "time",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Converts this value into JSON.
    ///
    /// Temporal values are written in their storage formats.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
            Self::DateTime(dt) => {
                serde_json::Value::String(dt.format(DATETIME_FORMAT).to_string())
            }
            Self::Time(t) => serde_json::Value::String(t.format(TIME_FORMAT).to_string()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Self::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<chrono::NaiveTime> for Value {
    fn from(v: chrono::NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(7_i32), Value::Int(7));
        assert_eq!(Value::from(1.5), Value::Float(1.5));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(
            Value::from(vec![1_i64, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_from_json_object() {
        let v = Value::from(serde_json::json!({"key": "value", "n": 2, "f": 0.5}));
        let map = v.as_map().unwrap();
        assert_eq!(map["key"], Value::String("value".into()));
        assert_eq!(map["n"], Value::Int(2));
        assert_eq!(map["f"], Value::Float(0.5));
    }

    #[test]
    fn test_to_json_uses_storage_formats() {
        let dt = NaiveDate::from_ymd_opt(2015, 7, 13)
            .unwrap()
            .and_hms_opt(14, 8, 12)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_json(), serde_json::json!("2015-07-13T14:08:12"));
        assert_eq!(Value::Date(dt.date()).to_json(), serde_json::json!("2015-07-13"));
        assert_eq!(Value::Time(dt.time()).to_json(), serde_json::json!("14:08:12"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::from(vec!["a"]).to_string(), r#"["a"]"#);
    }

    #[test]
    fn test_data_from_json() {
        let data = data_from_json(serde_json::json!({"a": "x", "b": null}));
        assert_eq!(data.len(), 2);
        assert!(data["b"].is_null());
        assert!(data_from_json(serde_json::json!([1, 2])).is_empty());
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Map(BTreeMap::new()).type_name(), "map");
    }
}
