use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;

use super::fields::{mtb, spt, FLAG_PASS_THROUGH, TEXT_PASS_THROUGH};
use super::options::OptionResolver;
use crate::airtable::models::{first_text, value_truthy, Record, UpdatePayload};
use crate::normalization::{
    classify, derive_variant, extract_allergens, extract_allergens_dedup, Category, ProductType,
};

/// What to write for a select field whose derived text has no matching option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedSelectPolicy {
    /// Leave the field out of the payload.
    #[default]
    Omit,
    /// Write the plain text and let the remote side coerce it.
    #[serde(rename = "text")]
    RawText,
}

impl FromStr for UnmatchedSelectPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "omit" | "strict" => Ok(Self::Omit),
            "text" | "raw" | "lenient" => Ok(Self::RawText),
            other => Err(anyhow::anyhow!(
                "unknown unmatched-select policy '{other}' (expected omit|text)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub unmatched_select: UnmatchedSelectPolicy,
    /// Prepended to the record's short id to form `imagePath`.
    pub image_prefix: String,
    pub dedup_allergens: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            unmatched_select: UnmatchedSelectPolicy::Omit,
            image_prefix: "/images/products/".to_string(),
            dedup_allergens: false,
        }
    }
}

/// Master records keyed by base-product id.
pub type MasterIndex = HashMap<String, Record>;

/// What [`index_masters`] dropped or overwrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Records without a `baseProductId`.
    pub unkeyed: usize,
    /// Keys carried by more than one record, in first-seen order.
    pub duplicate_keys: Vec<String>,
}

/// Index master records by `baseProductId`. Records without a key are
/// counted and dropped; on duplicate keys the later record wins.
pub fn index_masters(records: Vec<Record>) -> (MasterIndex, IndexSummary) {
    let mut index = MasterIndex::with_capacity(records.len());
    let mut summary = IndexSummary::default();
    for record in records {
        match record.field(mtb::BASE_PRODUCT_ID).and_then(first_text) {
            Some(key) if !key.is_empty() => {
                if index.contains_key(&key) && !summary.duplicate_keys.contains(&key) {
                    summary.duplicate_keys.push(key.clone());
                }
                index.insert(key, record);
            }
            _ => summary.unkeyed += 1,
        }
    }
    (index, summary)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingLink,
    UnknownMaster(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingLink => write!(f, "no base product linked"),
            SkipReason::UnknownMaster(id) => write!(f, "base product '{id}' not found"),
        }
    }
}

/// Joins product records to their master record and builds update payloads.
pub struct Reconciler<'a, R: OptionResolver + ?Sized> {
    options: &'a R,
    settings: &'a ReconcileOptions,
}

impl<'a, R: OptionResolver + ?Sized> Reconciler<'a, R> {
    pub fn new(options: &'a R, settings: &'a ReconcileOptions) -> Self {
        Self { options, settings }
    }

    /// Build the payload for one product record, or say why it was skipped.
    pub fn reconcile(
        &self,
        source: &Record,
        masters: &MasterIndex,
    ) -> Result<UpdatePayload, SkipReason> {
        let link = source
            .field(spt::BASE_PRODUCT_ID)
            .and_then(first_text)
            .filter(|s| !s.is_empty())
            .ok_or(SkipReason::MissingLink)?;
        let master = masters
            .get(&link)
            .ok_or_else(|| SkipReason::UnknownMaster(link.clone()))?;

        Ok(self.build_payload(source, master))
    }

    fn build_payload(&self, source: &Record, master: &Record) -> UpdatePayload {
        let internal_name = source.text(spt::INTERNAL_NAME).unwrap_or_default();
        let mut payload = UpdatePayload::new(&source.id);

        let variant = derive_variant(&internal_name, |field| master.field(field));
        self.set_select(&mut payload, spt::PACKAGE_SIZE, variant.package_size);
        payload.set(spt::SELLING_PRICE, variant.price.map_or(Value::Null, Value::from));
        payload.set(
            spt::WEIGHT_GRAMS,
            variant.weight_grams.map_or(Value::Null, Value::from),
        );

        let group = master.text(mtb::BASE_PRODUCT_GROUP);
        let class = classify(variant.package_size, group.as_deref());
        self.set_select(
            &mut payload,
            spt::PRODUCT_TYPE,
            class.product_type.map(ProductType::label),
        );
        self.set_select(&mut payload, spt::CATEGORY, class.category.map(Category::label));

        let ingredients = master.text(mtb::INGREDIENTS);
        let allergens = if self.settings.dedup_allergens {
            extract_allergens_dedup(ingredients.as_deref())
        } else {
            extract_allergens(ingredients.as_deref())
        };
        payload.set(
            spt::ALLERGENS,
            Value::Array(allergens.into_iter().map(|name| json!({ "name": name })).collect()),
        );

        for (from, to) in TEXT_PASS_THROUGH {
            payload.set(to, master.text(from).map_or(Value::Null, Value::String));
        }
        for (from, to) in FLAG_PASS_THROUGH {
            payload.set(to, Value::Bool(value_truthy(master.field(from))));
        }

        let short_id = source
            .text(spt::SHORT_ID)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| source.id.clone());
        payload.set(
            spt::IMAGE_PATH,
            Value::String(format!("{}{}.jpg", self.settings.image_prefix, short_id)),
        );
        payload.set(
            spt::MARKETING_NAME,
            if internal_name.is_empty() {
                Value::Null
            } else {
                Value::String(internal_name)
            },
        );

        payload
    }

    /// Unset text clears the field. Matched text becomes `{id}`; unmatched
    /// text follows the configured policy.
    fn set_select(&self, payload: &mut UpdatePayload, field: &str, text: Option<&str>) {
        let Some(text) = text else {
            payload.set(field, Value::Null);
            return;
        };
        match self.options.resolve(field, text) {
            Some(option) => payload.set(field, json!({ "id": option.id })),
            None => match self.settings.unmatched_select {
                UnmatchedSelectPolicy::Omit => {}
                UnmatchedSelectPolicy::RawText => {
                    payload.set(field, Value::String(text.to_string()))
                }
            },
        }
    }
}
