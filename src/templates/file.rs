//! JSON-file template store.
//!
//! On-disk layout:
//!
//! ```json
//! { "version": 1, "templates": [ { "id": "...", "name": "...", ... } ] }
//! ```
//!
//! Version 0 files are a bare JSON list of templates. They are read
//! transparently and rewritten in the current layout on the next mutation.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{SavedTemplate, TemplateStore};
use crate::error::{AdForgeError, Result};
use crate::model::{ProductContent, TemplateSettings};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Default size limit for the store file (5 MiB).
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    templates: Vec<SavedTemplate>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Current(StoreDocument),
    Legacy(Vec<SavedTemplate>),
}

pub struct FileTemplateStore {
    path: PathBuf,
    quota_bytes: usize,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_quota(path, DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(path: impl Into<PathBuf>, quota_bytes: usize) -> Self {
        Self {
            path: path.into(),
            quota_bytes,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| AdForgeError::Storage("template store lock poisoned".to_string()))
    }

    fn read(&self) -> Result<StoreDocument> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no template file yet");
                return Ok(StoreDocument {
                    version: CURRENT_SCHEMA_VERSION,
                    templates: Vec::new(),
                });
            }
            Err(e) => {
                return Err(AdForgeError::Storage(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let parsed: OnDisk = serde_json::from_str(&text).map_err(|e| {
            AdForgeError::Storage(format!("corrupt template file {}: {}", self.path.display(), e))
        })?;

        match parsed {
            OnDisk::Current(doc) if doc.version > CURRENT_SCHEMA_VERSION => {
                Err(AdForgeError::Storage(format!(
                    "template file version {} is newer than supported version {}",
                    doc.version, CURRENT_SCHEMA_VERSION
                )))
            }
            OnDisk::Current(doc) => Ok(doc),
            OnDisk::Legacy(templates) => {
                info!(count = templates.len(), "migrating version 0 template file");
                Ok(StoreDocument {
                    version: CURRENT_SCHEMA_VERSION,
                    templates,
                })
            }
        }
    }

    /// Replace the file contents, or fail without touching it.
    fn write(&self, templates: Vec<SavedTemplate>) -> Result<()> {
        let doc = StoreDocument {
            version: CURRENT_SCHEMA_VERSION,
            templates,
        };
        let json = serde_json::to_vec(&doc)?;
        if json.len() > self.quota_bytes {
            warn!(needed = json.len(), limit = self.quota_bytes, "template store quota exceeded");
            return Err(AdForgeError::StorageQuota {
                needed: json.len(),
                limit: self.quota_bytes,
            });
        }

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let storage_err =
            |e: std::io::Error| AdForgeError::Storage(format!("cannot write {}: {}", self.path.display(), e));

        std::fs::create_dir_all(dir).map_err(storage_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(storage_err)?;
        tmp.write_all(&json).map_err(storage_err)?;
        tmp.as_file().sync_all().map_err(storage_err)?;
        tmp.persist(&self.path).map_err(|e| storage_err(e.error))?;
        Ok(())
    }
}

impl TemplateStore for FileTemplateStore {
    fn list(&self) -> Result<Vec<SavedTemplate>> {
        let _lock = self.locked()?;
        Ok(self.read()?.templates)
    }

    fn get(&self, id: Uuid) -> Result<Option<SavedTemplate>> {
        let _lock = self.locked()?;
        Ok(self.read()?.templates.into_iter().find(|t| t.id == id))
    }

    fn add(
        &self,
        name: &str,
        content: &ProductContent,
        settings: &TemplateSettings,
    ) -> Result<SavedTemplate> {
        let _lock = self.locked()?;
        let mut templates = self.read()?.templates;
        let template = SavedTemplate::new(name, content, settings);
        templates.push(template.clone());
        self.write(templates)?;
        info!(id = %template.id, name = %template.name, "template saved");
        Ok(template)
    }

    fn remove(&self, id: Uuid) -> Result<bool> {
        let _lock = self.locked()?;
        let mut templates = self.read()?.templates;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Ok(false);
        }
        self.write(templates)?;
        info!(%id, "template deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProductImage, Theme};
    use pretty_assertions::assert_eq;

    fn content(name: &str) -> ProductContent {
        ProductContent {
            name: name.to_string(),
            price: "$1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_two_delete_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(dir.path().join("templates.json"));

        let a = store.add("A", &content("a"), &TemplateSettings::default()).unwrap();
        let b = store.add("B", &content("b"), &TemplateSettings::default()).unwrap();
        assert!(store.remove(a.id).unwrap());

        let left = store.list().unwrap();
        assert_eq!(left, vec![b.clone()]);
        assert_eq!(store.get(b.id).unwrap(), Some(b));
        assert_eq!(store.get(a.id).unwrap(), None);
    }

    #[test]
    fn test_remove_unknown_id_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTemplateStore::new(dir.path().join("t.json"));
        assert!(!store.remove(Uuid::now_v7()).unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        let settings = TemplateSettings {
            theme: Theme::Bold,
            ..Default::default()
        };
        let saved = FileTemplateStore::new(&path).add("Bold", &content("x"), &settings).unwrap();

        let reopened = FileTemplateStore::new(&path);
        assert_eq!(reopened.list().unwrap(), vec![saved]);

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
    }

    #[test]
    fn test_legacy_list_is_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        let legacy = SavedTemplate::new("old", &content("old"), &TemplateSettings::default());
        std::fs::write(&path, serde_json::to_string(&vec![legacy.clone()]).unwrap()).unwrap();

        let store = FileTemplateStore::new(&path);
        assert_eq!(store.list().unwrap(), vec![legacy.clone()]);

        store.add("new", &content("new"), &TemplateSettings::default()).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["templates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_quota_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        let store = FileTemplateStore::with_quota(&path, 4096);
        store.add("small", &content("small"), &TemplateSettings::default()).unwrap();
        let before = std::fs::read(&path).unwrap();

        let big = ProductContent {
            image: Some(ProductImage::png(vec![7u8; 8192])),
            ..content("big")
        };
        let err = store.add("big", &big, &TemplateSettings::default()).unwrap_err();
        assert!(matches!(err, AdForgeError::StorageQuota { limit: 4096, .. }));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileTemplateStore::new(&path);
        assert!(matches!(store.list(), Err(AdForgeError::Storage(_))));
    }

    #[test]
    fn test_newer_version_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"version": 9, "templates": []}"#).unwrap();
        assert!(FileTemplateStore::new(&path).list().is_err());
    }
}
