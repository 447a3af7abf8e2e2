//! Widgets describing how a field is presented.
//!
//! A [`Widget`] is a rendering hint: an element tag plus attributes (and
//! options for select elements). Fields pick a default widget from their
//! kind; callers may override it. Widgets can describe themselves as
//! [`WidgetMetadata`] for clients that build their own UI, or render a
//! minimal HTML element.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::choices::Choices;

/// Enumerates the built-in widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="url">`.
    UrlInput,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<input type="date">`.
    DateInput,
    /// `<input type="datetime-local">`.
    DateTimeInput,
    /// `<input type="time">`.
    TimeInput,
    /// `<textarea>`.
    Textarea,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
}

impl WidgetType {
    /// The HTML element tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Textarea => "textarea",
            Self::Select | Self::SelectMultiple => "select",
            _ => "input",
        }
    }

    /// The `type` attribute of input elements.
    pub const fn input_type(self) -> Option<&'static str> {
        match self {
            Self::TextInput => Some("text"),
            Self::NumberInput => Some("number"),
            Self::UrlInput => Some("url"),
            Self::CheckboxInput => Some("checkbox"),
            Self::DateInput => Some("date"),
            Self::DateTimeInput => Some("datetime-local"),
            Self::TimeInput => Some("time"),
            Self::Textarea | Self::Select | Self::SelectMultiple => None,
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::UrlInput => "UrlInput",
            Self::CheckboxInput => "CheckboxInput",
            Self::DateInput => "DateInput",
            Self::DateTimeInput => "DateTimeInput",
            Self::TimeInput => "TimeInput",
            Self::Textarea => "Textarea",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
        };
        write!(f, "{name}")
    }
}

/// A selectable option of a select widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetOption {
    /// The stored value, as JSON.
    pub value: serde_json::Value,
    /// The display label.
    pub label: String,
}

/// The serializable description of a widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetMetadata {
    /// The element tag.
    pub tag: String,
    /// The element attributes, including `type` for inputs.
    pub attrs: BTreeMap<String, String>,
    /// The options of select widgets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<WidgetOption>>,
}

/// A presentation hint attached to a field.
///
/// # Examples
///
/// ```
/// use formwork_forms::widgets::Widget;
///
/// let widget = Widget::text().attr("placeholder", "Title");
/// let meta = widget.get_metadata();
/// assert_eq!(meta.tag, "input");
/// assert_eq!(meta.attrs["type"], "text");
/// assert_eq!(meta.attrs["placeholder"], "Title");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    widget_type: WidgetType,
    attrs: BTreeMap<String, String>,
    options: Vec<WidgetOption>,
}

impl Widget {
    /// Creates a widget of the given type with no extra attributes.
    pub const fn new(widget_type: WidgetType) -> Self {
        Self {
            widget_type,
            attrs: BTreeMap::new(),
            options: Vec::new(),
        }
    }

    /// A text input.
    pub const fn text() -> Self {
        Self::new(WidgetType::TextInput)
    }

    /// A number input.
    pub const fn number() -> Self {
        Self::new(WidgetType::NumberInput)
    }

    /// A multi-line text area.
    pub const fn textarea() -> Self {
        Self::new(WidgetType::Textarea)
    }

    /// A select element offering the given choices.
    pub fn select(choices: &Choices) -> Self {
        Self::new(WidgetType::Select).with_choices(choices)
    }

    /// A multiple select element offering the given choices.
    pub fn select_multiple(choices: &Choices) -> Self {
        Self::new(WidgetType::SelectMultiple).with_choices(choices)
    }

    fn with_choices(mut self, choices: &Choices) -> Self {
        self.options = choices
            .iter()
            .map(|entry| WidgetOption {
                value: entry.value.to_json(),
                label: entry.label.clone(),
            })
            .collect();
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// The widget type.
    pub const fn widget_type(&self) -> WidgetType {
        self.widget_type
    }

    /// The extra attributes set on this widget.
    pub const fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Describes this widget as serializable metadata.
    pub fn get_metadata(&self) -> WidgetMetadata {
        let mut attrs = self.attrs.clone();
        if let Some(input_type) = self.widget_type.input_type() {
            attrs.insert("type".to_string(), input_type.to_string());
        }
        if self.widget_type == WidgetType::SelectMultiple {
            attrs.insert("multiple".to_string(), "multiple".to_string());
        }
        let options = matches!(
            self.widget_type,
            WidgetType::Select | WidgetType::SelectMultiple
        )
        .then(|| self.options.clone());
        WidgetMetadata {
            tag: self.widget_type.tag().to_string(),
            attrs,
            options,
        }
    }

    /// Renders the widget as an HTML element.
    ///
    /// `selected` lists the option values to mark as selected for select
    /// widgets; for other widgets only the first entry is used as the value.
    pub fn render(&self, name: &str, selected: &[String]) -> String {
        let meta = self.get_metadata();
        let name = escape(name);
        match self.widget_type {
            WidgetType::Textarea => {
                let value = selected.first().map(|v| escape(v)).unwrap_or_default();
                format!(
                    r#"<textarea name="{name}"{}>{value}</textarea>"#,
                    render_attrs(&meta.attrs)
                )
            }
            WidgetType::Select | WidgetType::SelectMultiple => {
                let mut html = format!(r#"<select name="{name}"{}>"#, render_attrs(&meta.attrs));
                for option in &self.options {
                    let value = option_text(&option.value);
                    let mark = if selected.contains(&value) {
                        " selected"
                    } else {
                        ""
                    };
                    html.push_str(&format!(
                        r#"<option value="{}"{mark}>{}</option>"#,
                        escape(&value),
                        escape(&option.label)
                    ));
                }
                html.push_str("</select>");
                html
            }
            WidgetType::CheckboxInput => {
                let checked = selected
                    .first()
                    .is_some_and(|v| matches!(v.as_str(), "true" | "1" | "on"));
                let mark = if checked { " checked" } else { "" };
                format!(r#"<input name="{name}"{}{mark} />"#, render_attrs(&meta.attrs))
            }
            _ => {
                let value = selected.first().map(|v| escape(v)).unwrap_or_default();
                format!(
                    r#"<input name="{name}" value="{value}"{} />"#,
                    render_attrs(&meta.attrs)
                )
            }
        }
    }
}

fn option_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Formats attributes as ` key="value"` pairs in key order.
fn render_attrs(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape(v)))
        .collect()
}

/// Escapes text for use inside HTML attributes and element bodies.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
