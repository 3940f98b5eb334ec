use regex::Regex;
use std::sync::OnceLock;

/// Runs of capitals (interior whitespace allowed) between word boundaries.
/// Ingredient lists mark allergens in ALL CAPS.
pub const ALLERGEN_PATTERN: &str = r"\b[A-Z][A-Z\s]*\b";

static ALLERGEN_RE: OnceLock<Regex> = OnceLock::new();

fn allergen_re() -> &'static Regex {
    ALLERGEN_RE.get_or_init(|| Regex::new(ALLERGEN_PATTERN).expect("allergen pattern compiles"))
}

/// Extract allergen names from a free-text ingredient list, in order of
/// appearance. Duplicates are kept.
pub fn extract_allergens(ingredients: Option<&str>) -> Vec<String> {
    let Some(text) = ingredients else {
        return Vec::new();
    };
    allergen_re()
        .find_iter(text)
        .map(|m| capitalize(&m.as_str().trim().to_lowercase()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Same as [`extract_allergens`] with repeated names dropped (first wins).
pub fn extract_allergens_dedup(ingredients: Option<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in extract_allergens(ingredients) {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_caps_tokens_in_title_case() {
        assert_eq!(
            extract_allergens(Some("SOYA, almonds, MILK powder")),
            vec!["Soya", "Milk"]
        );
    }

    #[test]
    fn keeps_interior_spaces() {
        assert_eq!(
            extract_allergens(Some("roasted TREE NUTS, salt")),
            vec!["Tree nuts"]
        );
    }

    #[test]
    fn ignores_capitalised_words() {
        assert!(extract_allergens(Some("Almonds, Cashews (roasted)")).is_empty());
    }

    #[test]
    fn keeps_duplicates_unless_asked() {
        let text = Some("PEANUTS, sugar, PEANUTS oil");
        assert_eq!(extract_allergens(text), vec!["Peanuts", "Peanuts"]);
        assert_eq!(extract_allergens_dedup(text), vec!["Peanuts"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_allergens(None).is_empty());
        assert!(extract_allergens(Some("")).is_empty());
    }
}
