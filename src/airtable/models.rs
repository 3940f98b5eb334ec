use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of an Airtable table, as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(
        rename = "createdTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a record from an id and a JSON object of fields. Non-object
    /// values produce an empty field map.
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            created_time: None,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field rendered as text; see [`value_text`].
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name).and_then(value_text)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<Record>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaResponse {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSchema {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub options: Option<FieldOptions>,
}

impl FieldSchema {
    pub fn choices(&self) -> &[Choice] {
        self.options
            .as_ref()
            .map(|o| o.choices.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    SingleSelect,
    MultipleSelects,
    #[serde(other)]
    Other,
}

impl FieldKind {
    pub fn is_select(self) -> bool {
        matches!(self, FieldKind::SingleSelect | FieldKind::MultipleSelects)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldOptions {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub id: String,
    pub name: String,
}

/// A single `{id, fields}` entry of a PATCH request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl UpdatePayload {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PatchRequest<'a> {
    pub records: &'a [UpdatePayload],
    pub typecast: bool,
}

/// Render a cell value as text.
///
/// Strings are returned as-is (blank strings are `None`), numbers are
/// formatted, and arrays (lookups, links) are joined with `", "`.
pub fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

/// First scalar of a value: the value itself, or the first element of a
/// lookup/link array.
pub fn first_text(v: &Value) -> Option<String> {
    match v {
        Value::Array(items) => items.iter().find_map(first_text),
        other => value_text(other).map(|s| s.trim().to_string()),
    }
}

/// Numeric cell value. Accepts numbers and numeric strings (with either a
/// decimal point or a decimal comma). Single-element lookups are unwrapped.
pub fn value_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        Value::Array(items) if items.len() == 1 => value_f64(&items[0]),
        _ => None,
    }
}

/// Airtable omits unchecked checkboxes entirely, so anything that isn't an
/// explicit truthy value counts as `false`.
pub fn value_truthy(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            let s = s.trim().to_ascii_lowercase();
            !s.is_empty() && !matches!(s.as_str(), "0" | "false" | "no" | "off")
        }
        Some(Value::Array(items)) => items.iter().any(|i| value_truthy(Some(i))),
        _ => false,
    }
}
