//! Built-in demo products.

use serde::Serialize;

use super::{ProductContent, ProductImage};

/// A built-in product used to quickly populate the editor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: &'static str,
    pub image_url: &'static str,
    pub content: ProductContent,
}

struct PresetDef {
    name: &'static str,
    brand: &'static str,
    price: &'static str,
    specifications: &'static str,
    description: &'static str,
    features: &'static [&'static str],
    image_url: &'static str,
}

const PRESETS: &[PresetDef] = &[
    PresetDef {
        name: "iPhone 15 Pro",
        brand: "Apple",
        price: "$999",
        specifications: "6.1\" Super Retina XDR|A17 Pro chip|128GB|48MP camera",
        description: "Certified refurbished, 12-month warranty",
        features: &["Titanium design", "USB-C"],
        image_url: "https://picsum.photos/seed/iphone15pro/800/800",
    },
    PresetDef {
        name: "Galaxy S24",
        brand: "Samsung",
        price: "$799",
        specifications: "6.2\" Dynamic AMOLED|Snapdragon 8 Gen 3|256GB|50MP camera",
        description: "Unlocked, includes screen protector",
        features: &["Galaxy AI", "IP68"],
        image_url: "https://picsum.photos/seed/galaxys24/800/800",
    },
    PresetDef {
        name: "MacBook Air M3",
        brand: "Apple",
        price: "$1,099",
        specifications: "13.6\" Liquid Retina|M3 chip|8GB RAM|256GB SSD",
        description: "Battery health 100%, original charger",
        features: &["18h battery", "Fanless"],
        image_url: "https://picsum.photos/seed/macbookairm3/800/800",
    },
    PresetDef {
        name: "Pixel 8",
        brand: "Google",
        price: "$549",
        specifications: "6.2\" Actua display|Tensor G3|128GB|50MP camera",
        description: "Screen replaced with OEM part",
        features: &["7 years of updates"],
        image_url: "https://picsum.photos/seed/pixel8/800/800",
    },
];

impl PresetDef {
    fn build(&self) -> Preset {
        Preset {
            name: self.name,
            image_url: self.image_url,
            content: ProductContent {
                name: self.name.to_string(),
                brand: self.brand.to_string(),
                price: self.price.to_string(),
                specifications: self.specifications.to_string(),
                image: Some(ProductImage::Url(self.image_url.to_string())),
                description: Some(self.description.to_string()),
                features: self.features.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}

/// All built-in presets, in display order.
pub fn list_presets() -> Vec<Preset> {
    PRESETS.iter().map(PresetDef::build).collect()
}

/// Look up a preset by name (case-insensitive).
pub fn preset_by_name(name: &str) -> Option<Preset> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(PresetDef::build)
}
