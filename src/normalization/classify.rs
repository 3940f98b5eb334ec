/// Product type derived from the package size label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    NutBag,
    NutButterJar,
}

impl ProductType {
    pub fn from_package_size(package_size: &str) -> Option<Self> {
        if package_size.contains("Bag") {
            Some(Self::NutBag)
        } else if package_size.contains("Jar") {
            Some(Self::NutButterJar)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NutBag => "Nut Bag",
            Self::NutButterJar => "Nut Butter Jar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    NutButters,
    Mixes,
    WholeNuts,
}

impl Category {
    /// Rules are evaluated in order; the first match wins.
    pub fn classify(product_type: Option<ProductType>, group_text: Option<&str>) -> Self {
        if product_type == Some(ProductType::NutButterJar) {
            return Self::NutButters;
        }
        let is_mix = group_text.is_some_and(|g| g.to_lowercase().contains("mix"));
        if is_mix {
            Self::Mixes
        } else {
            Self::WholeNuts
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NutButters => "Nut Butters",
            Self::Mixes => "Mixes",
            Self::WholeNuts => "Whole Nuts",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub product_type: Option<ProductType>,
    pub category: Option<Category>,
}

/// Classify a record. Without a package size nothing can be derived; with
/// one, a category is always produced.
pub fn classify(package_size: Option<&str>, group_text: Option<&str>) -> Classification {
    let Some(size) = package_size else {
        return Classification::default();
    };
    let product_type = ProductType::from_package_size(size);
    Classification {
        product_type,
        category: Some(Category::classify(product_type, group_text)),
    }
}
