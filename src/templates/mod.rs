//! # Saved Templates
//!
//! Named snapshots of the editing session (content + settings) that can be
//! listed, reloaded and deleted.
//!
//! Every mutation is atomic: a failed `add` or `remove` leaves the store
//! exactly as it was. Ids are UUID v7, so they sort by creation time.

mod file;
mod memory;

pub use file::{CURRENT_SCHEMA_VERSION, DEFAULT_QUOTA_BYTES, FileTemplateStore};
pub use memory::MemoryTemplateStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{ProductContent, ProductImage, TemplateSettings};

/// A stored snapshot of the editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTemplate {
    pub id: Uuid,
    pub name: String,
    pub content: ProductContent,
    pub settings: TemplateSettings,
    pub created_at: DateTime<Utc>,
    /// Copy of the product image at save time.
    #[serde(default)]
    pub thumbnail: Option<ProductImage>,
}

impl SavedTemplate {
    pub fn new(name: &str, content: &ProductContent, settings: &TemplateSettings) -> Self {
        let name = match name.trim() {
            "" if !content.name.trim().is_empty() => content.name.trim().to_string(),
            "" => "Untitled template".to_string(),
            n => n.to_string(),
        };
        Self {
            id: Uuid::now_v7(),
            name,
            content: content.clone(),
            settings: settings.clone(),
            created_at: Utc::now(),
            thumbnail: content.image.clone().filter(ProductImage::is_encoded),
        }
    }
}

/// Storage for saved templates.
pub trait TemplateStore: Send + Sync {
    /// All templates, oldest first.
    fn list(&self) -> Result<Vec<SavedTemplate>>;

    fn get(&self, id: Uuid) -> Result<Option<SavedTemplate>>;

    /// Snapshot `content` and `settings` under `name`.
    fn add(
        &self,
        name: &str,
        content: &ProductContent,
        settings: &TemplateSettings,
    ) -> Result<SavedTemplate>;

    /// Delete by id. Returns `false` if no template had that id.
    fn remove(&self, id: Uuid) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_falls_back_to_product_name() {
        let content = ProductContent {
            name: "Pixel 8".to_string(),
            ..Default::default()
        };
        let t = SavedTemplate::new("  ", &content, &TemplateSettings::default());
        assert_eq!(t.name, "Pixel 8");

        let t = SavedTemplate::new("", &ProductContent::default(), &TemplateSettings::default());
        assert_eq!(t.name, "Untitled template");
    }

    #[test]
    fn test_thumbnail_only_for_encoded_images() {
        let mut content = ProductContent {
            image: Some(ProductImage::Url("https://img/x.png".to_string())),
            ..Default::default()
        };
        let t = SavedTemplate::new("a", &content, &TemplateSettings::default());
        assert!(t.thumbnail.is_none());

        content.image = Some(ProductImage::png(vec![1, 2, 3]));
        let t = SavedTemplate::new("a", &content, &TemplateSettings::default());
        assert_eq!(t.thumbnail, content.image);
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let a = SavedTemplate::new("a", &ProductContent::default(), &TemplateSettings::default());
        let b = SavedTemplate::new("b", &ProductContent::default(), &TemplateSettings::default());
        assert!(a.id < b.id);
    }
}
