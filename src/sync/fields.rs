//! Field names of the two Airtable tables.

/// Sellable Product Table (per-variant records that get updated).
pub mod spt {
    pub const INTERNAL_NAME: &str = "internalName";
    pub const BASE_PRODUCT_ID: &str = "baseProductId";
    pub const SHORT_ID: &str = "shortId";

    pub const PACKAGE_SIZE: &str = "packageSize";
    pub const SELLING_PRICE: &str = "sellingPrice";
    pub const WEIGHT_GRAMS: &str = "weightGrams";
    pub const PRODUCT_TYPE: &str = "productType";
    pub const CATEGORY: &str = "category";
    pub const ALLERGENS: &str = "allergens";
    pub const SUPPLIER_NAME: &str = "supplierName";
    pub const INGREDIENTS: &str = "ingredients";
    pub const ORIGIN: &str = "origin";
    pub const PRODUCT_URL: &str = "productUrl";
    pub const IMAGE_PATH: &str = "imagePath";
    pub const MARKETING_NAME: &str = "marketingName";
}

/// Master pricing/purchasing table (one row per base product, read-only).
pub mod mtb {
    pub const BASE_PRODUCT_ID: &str = "baseProductId";
    pub const SUPPLIER: &str = "Supplier";
    pub const INGREDIENTS: &str = "Ingredients";
    pub const ORIGIN: &str = "Origin";
    pub const URL: &str = "URL";
    pub const BASE_PRODUCT_GROUP: &str = "Base Product Group";
}

/// Text attributes copied from the master record: (master field, product field).
pub const TEXT_PASS_THROUGH: [(&str, &str); 4] = [
    (mtb::SUPPLIER, spt::SUPPLIER_NAME),
    (mtb::INGREDIENTS, spt::INGREDIENTS),
    (mtb::ORIGIN, spt::ORIGIN),
    (mtb::URL, spt::PRODUCT_URL),
];

/// Checkbox attributes copied from the master record: (master field, product field).
pub const FLAG_PASS_THROUGH: [(&str, &str); 6] = [
    ("Organic", "organic"),
    ("Raw", "raw"),
    ("Roasted", "roasted"),
    ("Salted", "salted"),
    ("Vegan", "vegan"),
    ("Gluten Free", "glutenFree"),
];
