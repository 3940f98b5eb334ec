use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::airtable::models::value_f64;

/// Trailing variant code: hyphen, optional whitespace, then `z<digits>` or
/// `nb<digits>` at the very end of the (trimmed) internal name.
pub const VARIANT_PATTERN: &str = r"-\s*(z\d+|nb\d+)$";

static VARIANT_RE: OnceLock<Regex> = OnceLock::new();

fn variant_re() -> &'static Regex {
    VARIANT_RE.get_or_init(|| Regex::new(VARIANT_PATTERN).expect("variant pattern compiles"))
}

/// Known package variants, selected by the suffix of a product's internal name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantSuffix {
    Z450,
    Z1000,
    Nb175,
    Nb365,
}

/// Fixed outputs for one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantRule {
    pub package_size: &'static str,
    /// Master-record field holding the unit price for this package.
    pub price_field: &'static str,
    pub weight_grams: u32,
}

impl VariantSuffix {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "z450" => Some(Self::Z450),
            "z1000" => Some(Self::Z1000),
            "nb175" => Some(Self::Nb175),
            "nb365" => Some(Self::Nb365),
            _ => None,
        }
    }

    pub fn rule(self) -> VariantRule {
        match self {
            Self::Z450 => VariantRule {
                package_size: "450g Bag",
                price_field: "Verkoop 450g (€/kg)",
                weight_grams: 600,
            },
            Self::Z1000 => VariantRule {
                package_size: "1000g Bag",
                price_field: "Verkoop 1kg (€/kg)",
                weight_grams: 1250,
            },
            Self::Nb175 => VariantRule {
                package_size: "175g Jar",
                price_field: "Nut Butter 175g (€/potje)",
                weight_grams: 400,
            },
            Self::Nb365 => VariantRule {
                package_size: "365g Jar",
                price_field: "Nut Butter 365g (€/pot)",
                weight_grams: 750,
            },
        }
    }
}

/// Raw code at the end of `name`, if any (e.g. `"z450"`, or `"z999"` which
/// has no rule).
pub fn parse_variant_code(name: &str) -> Option<&str> {
    variant_re()
        .captures(name.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn parse_variant(name: &str) -> Option<VariantSuffix> {
    parse_variant_code(name).and_then(VariantSuffix::from_code)
}

/// Derived package/price/weight outputs. All `None` when the name carries no
/// recognized variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantOutputs {
    pub package_size: Option<&'static str>,
    pub price: Option<f64>,
    pub weight_grams: Option<u32>,
}

/// Apply the variant rule for `internal_name`, reading the price through
/// `price_of` (usually a lookup into the master record's fields).
pub fn derive_variant<'a, F>(internal_name: &str, price_of: F) -> VariantOutputs
where
    F: FnOnce(&str) -> Option<&'a Value>,
{
    let Some(suffix) = parse_variant(internal_name) else {
        return VariantOutputs::default();
    };
    let rule = suffix.rule();
    VariantOutputs {
        package_size: Some(rule.package_size),
        price: price_of(rule.price_field).and_then(value_f64),
        weight_grams: Some(rule.weight_grams),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_suffixes_map_to_exact_rules() {
        let cases = [
            ("Cashews-z450", "450g Bag", "Verkoop 450g (€/kg)", 600),
            ("Cashews-z1000", "1000g Bag", "Verkoop 1kg (€/kg)", 1250),
            ("Peanut Butter-nb175", "175g Jar", "Nut Butter 175g (€/potje)", 400),
            ("Peanut Butter-nb365", "365g Jar", "Nut Butter 365g (€/pot)", 750),
        ];
        for (name, size, field, grams) in cases {
            let rule = parse_variant(name).expect(name).rule();
            assert_eq!(rule.package_size, size);
            assert_eq!(rule.price_field, field);
            assert_eq!(rule.weight_grams, grams);
        }
    }

    #[test]
    fn allows_whitespace_after_hyphen_and_trailing_space() {
        assert_eq!(parse_variant("Almonds - z1000"), Some(VariantSuffix::Z1000));
        assert_eq!(parse_variant("Almonds-nb365  "), Some(VariantSuffix::Nb365));
    }

    #[test]
    fn suffix_must_be_at_the_end() {
        assert_eq!(parse_variant("Almonds-z450 special"), None);
        assert_eq!(parse_variant("Almonds z450"), None);
        assert_eq!(parse_variant("Almonds-Z450"), None);
        assert_eq!(parse_variant(""), None);
    }

    #[test]
    fn unknown_codes_parse_but_have_no_rule() {
        assert_eq!(parse_variant_code("Walnuts-z999"), Some("z999"));
        assert_eq!(parse_variant("Walnuts-z999"), None);
    }

    #[test]
    fn unrecognized_names_yield_all_null_outputs() {
        let fields = json!({"Verkoop 450g (€/kg)": 12.5});
        for name in ["Walnuts", "Walnuts-z999", "Walnuts-nb"] {
            let out = derive_variant(name, |f| fields.get(f));
            assert_eq!(out, VariantOutputs::default(), "{name}");
        }
    }

    #[test]
    fn reads_price_from_rule_field() {
        let fields = json!({"Verkoop 450g (€/kg)": 12.5, "Verkoop 1kg (€/kg)": "11,25"});
        let out = derive_variant("Product-z450", |f| fields.get(f));
        assert_eq!(out.package_size, Some("450g Bag"));
        assert_eq!(out.price, Some(12.5));
        assert_eq!(out.weight_grams, Some(600));

        let out = derive_variant("Product-z1000", |f| fields.get(f));
        assert_eq!(out.price, Some(11.25));

        let out = derive_variant("Product-nb175", |f| fields.get(f));
        assert_eq!(out.package_size, Some("175g Jar"));
        assert_eq!(out.price, None);
    }
}
