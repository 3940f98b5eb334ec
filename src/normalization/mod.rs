//! Fixed business rules that turn product text into catalog attributes.

pub mod allergen;
pub mod classify;
pub mod variant;

pub use allergen::{extract_allergens, extract_allergens_dedup};
pub use classify::{classify, Category, Classification, ProductType};
pub use variant::{derive_variant, parse_variant, VariantOutputs, VariantRule, VariantSuffix};
