//! In-memory template store for tests and throwaway servers.

use std::sync::Mutex;
use uuid::Uuid;

use super::{SavedTemplate, TemplateStore};
use crate::error::{AdForgeError, Result};
use crate::model::{ProductContent, TemplateSettings};

#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: Mutex<Vec<SavedTemplate>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, Vec<SavedTemplate>>> {
        self.templates
            .lock()
            .map_err(|_| AdForgeError::Storage("template store lock poisoned".to_string()))
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn list(&self) -> Result<Vec<SavedTemplate>> {
        Ok(self.locked()?.clone())
    }

    fn get(&self, id: Uuid) -> Result<Option<SavedTemplate>> {
        Ok(self.locked()?.iter().find(|t| t.id == id).cloned())
    }

    fn add(
        &self,
        name: &str,
        content: &ProductContent,
        settings: &TemplateSettings,
    ) -> Result<SavedTemplate> {
        let template = SavedTemplate::new(name, content, settings);
        self.locked()?.push(template.clone());
        Ok(template)
    }

    fn remove(&self, id: Uuid) -> Result<bool> {
        let mut templates = self.locked()?;
        let before = templates.len();
        templates.retain(|t| t.id != id);
        Ok(templates.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_two_delete_first() {
        let store = MemoryTemplateStore::new();
        let settings = TemplateSettings::default();
        let a = store.add("A", &ProductContent::default(), &settings).unwrap();
        let b = store.add("B", &ProductContent::default(), &settings).unwrap();

        assert!(store.remove(a.id).unwrap());
        assert!(!store.remove(a.id).unwrap());
        assert_eq!(store.list().unwrap(), vec![b]);
    }
}
