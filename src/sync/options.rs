use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::error::SyncError;
use crate::airtable::models::TableSchema;

/// Reference to a select option by its server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRef {
    pub id: String,
}

/// Look up select options by display text.
pub trait OptionResolver {
    fn resolve(&self, field: &str, text: &str) -> Option<OptionRef>;
}

/// Lookup key for a choice label: all whitespace removed, case-folded.
pub fn normalize_choice(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Per select field, normalized choice label → option id.
#[derive(Debug, Clone, Default)]
pub struct OptionMap {
    fields: HashMap<String, HashMap<String, String>>,
}

impl OptionMap {
    /// Build the map for `table_name` from the base schema. Only
    /// single/multiple select fields are included.
    pub fn from_schema(tables: &[TableSchema], table_name: &str) -> Result<Self, SyncError> {
        let table = tables
            .iter()
            .find(|t| t.name == table_name)
            .ok_or_else(|| SyncError::TableNotFound(table_name.to_string()))?;

        let mut fields = HashMap::new();
        for field in table.fields.iter().filter(|f| f.kind.is_select()) {
            let choices: HashMap<String, String> = field
                .choices()
                .iter()
                .map(|c| (normalize_choice(&c.name), c.id.clone()))
                .collect();
            fields.insert(field.name.clone(), choices);
        }
        Ok(Self { fields })
    }

    /// Insert a single choice; used to seed maps without a schema.
    pub fn with_choice(mut self, field: &str, label: &str, id: &str) -> Self {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(normalize_choice(label), id.to_string());
        self
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn choice_count(&self) -> usize {
        self.fields.values().map(HashMap::len).sum()
    }

    /// Stable, sorted view for printing.
    pub fn to_sorted(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.fields
            .iter()
            .map(|(field, choices)| {
                let sorted = choices
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (field.clone(), sorted)
            })
            .collect()
    }
}

impl OptionResolver for OptionMap {
    fn resolve(&self, field: &str, text: &str) -> Option<OptionRef> {
        let key = normalize_choice(text);
        if key.is_empty() {
            return None;
        }
        self.fields
            .get(field)
            .and_then(|choices| choices.get(&key))
            .map(|id| OptionRef { id: id.clone() })
    }
}
