//! Enumerated value sets for choice fields.
//!
//! A [`Choices`] is an ordered set of `(identifier, stored value, label)`
//! entries. The identifier lets code refer to a stored value by a stable
//! name, the stored value is what fields accept and persist, and the label
//! is what widgets and error messages show.

use formwork_core::{FormworkError, FormworkResult, Value};

/// A single entry of a [`Choices`] set.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceEntry {
    /// The symbolic name code uses to refer to this entry.
    pub identifier: String,
    /// The value accepted and stored by fields.
    pub value: Value,
    /// The human-readable label.
    pub label: String,
}

/// An ordered set of choice entries with unique stored values.
///
/// # Examples
///
/// ```
/// use formwork_forms::choices::Choices;
/// use formwork_core::Value;
///
/// let colors = Choices::new([("RED", "r", "Red"), ("BLUE", "b", "Blue")]).unwrap();
/// assert_eq!(colors.get("RED"), Some(&Value::from("r")));
/// assert!(colors.contains(&Value::from("b")));
/// assert_eq!(colors.labels(), vec!["Red", "Blue"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Choices {
    entries: Vec<ChoiceEntry>,
}

impl Choices {
    /// Builds a choice set from `(identifier, value, label)` triples.
    ///
    /// Fails with [`FormworkError::ImproperlyConfigured`] if two entries
    /// share an identifier or a stored value.
    pub fn new<I, K, V, L>(triples: I) -> FormworkResult<Self>
    where
        I: IntoIterator<Item = (K, V, L)>,
        K: Into<String>,
        V: Into<Value>,
        L: Into<String>,
    {
        let mut entries: Vec<ChoiceEntry> = Vec::new();
        for (identifier, value, label) in triples {
            let identifier = identifier.into();
            let value = value.into();
            if entries.iter().any(|e| e.identifier == identifier) {
                return Err(FormworkError::ImproperlyConfigured(format!(
                    "Duplicate choice identifier '{identifier}'"
                )));
            }
            if entries.iter().any(|e| e.value == value) {
                return Err(FormworkError::ImproperlyConfigured(format!(
                    "Duplicate choice value '{value}'"
                )));
            }
            entries.push(ChoiceEntry {
                identifier,
                value,
                label: label.into(),
            });
        }
        Ok(Self { entries })
    }

    /// Returns the stored value for an identifier.
    pub fn get(&self, identifier: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| &e.value)
    }

    /// Returns `true` if `value` is one of the stored values.
    pub fn contains(&self, value: &Value) -> bool {
        self.entries.iter().any(|e| &e.value == value)
    }

    /// Maps raw input onto a stored value.
    ///
    /// Exact matches win; otherwise a stored value whose text form equals
    /// the input's text form is returned, so `"1"` resolves to `1`.
    pub fn resolve(&self, value: &Value) -> Option<&Value> {
        if let Some(entry) = self.entries.iter().find(|e| &e.value == value) {
            return Some(&entry.value);
        }
        let text = value.to_string();
        self.entries
            .iter()
            .find(|e| e.value.to_string() == text)
            .map(|e| &e.value)
    }

    /// Returns the label of a stored value.
    pub fn label_for(&self, value: &Value) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.value == value)
            .map(|e| e.label.as_str())
    }

    /// The stored values, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|e| &e.value)
    }

    /// The display labels, in declaration order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, ChoiceEntry> {
        self.entries.iter()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Choices {
    type Item = &'a ChoiceEntry;
    type IntoIter = std::slice::Iter<'a, ChoiceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> Choices {
        Choices::new([("SMALL", 1_i64, "Small"), ("LARGE", 2, "Large")]).unwrap()
    }

    #[test]
    fn test_identifier_lookup() {
        let choices = sizes();
        assert_eq!(choices.get("LARGE"), Some(&Value::Int(2)));
        assert_eq!(choices.get("HUGE"), None);
    }

    #[test]
    fn test_values_and_labels_keep_order() {
        let choices = sizes();
        let values: Vec<_> = choices.values().cloned().collect();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(choices.labels(), vec!["Small", "Large"]);
        assert_eq!(choices.label_for(&Value::Int(1)), Some("Small"));
    }

    #[test]
    fn test_duplicate_value_rejected() {
        let result = Choices::new([("A", "a", "A"), ("B", "a", "B")]);
        assert!(matches!(result, Err(FormworkError::ImproperlyConfigured(_))));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let result = Choices::new([("A", "a", "A"), ("A", "b", "B")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_by_text_form() {
        let choices = sizes();
        assert_eq!(choices.resolve(&Value::from("2")), Some(&Value::Int(2)));
        assert_eq!(choices.resolve(&Value::Int(1)), Some(&Value::Int(1)));
        assert_eq!(choices.resolve(&Value::from("3")), None);
    }
}
