//! Unsaved edits kept across interruptions, scoped by entity kind and id.

use crate::error::Result;
use crate::store::{load_json, save_json, KeyValueStore, StoreKey};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DraftKey {
    /// A task being composed for a project.
    NewTask { project_id: String },
    /// Edits to an existing task.
    EditTask { project_id: String, task_id: String },
    /// Free-text description fed to plan generation.
    ProjectPrompt,
}

impl DraftKey {
    pub fn storage_key(&self) -> String {
        match self {
            DraftKey::NewTask { project_id } => format!("nexus_draft_new_{project_id}"),
            DraftKey::EditTask {
                project_id,
                task_id,
            } => format!("nexus_draft_edit_{project_id}_{task_id}"),
            DraftKey::ProjectPrompt => "nexus_create_project_draft".to_string(),
        }
    }
}

pub struct Drafts<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Drafts<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Drafts { store }
    }

    pub fn save<T: Serialize>(&self, key: &DraftKey, value: &T) -> Result<()> {
        save_json(self.store, &StoreKey::Draft(key.clone()), value)
    }

    /// Load a draft. Unreadable drafts are treated as absent.
    pub fn load<T: DeserializeOwned>(&self, key: &DraftKey) -> Option<T> {
        match load_json(self.store, &StoreKey::Draft(key.clone())) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("discarding unreadable draft {}: {e}", key.storage_key());
                None
            }
        }
    }

    pub fn clear(&self, key: &DraftKey) -> Result<()> {
        self.store.remove(&StoreKey::Draft(key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn keys_are_scoped_by_entity() {
        let new = DraftKey::NewTask {
            project_id: "p1".into(),
        };
        let edit = DraftKey::EditTask {
            project_id: "p1".into(),
            task_id: "t9".into(),
        };
        assert_eq!(new.storage_key(), "nexus_draft_new_p1");
        assert_eq!(edit.storage_key(), "nexus_draft_edit_p1_t9");
    }

    #[test]
    fn save_load_clear() {
        let store = MemoryStore::new();
        let drafts = Drafts::new(&store);
        let key = DraftKey::ProjectPrompt;
        assert_eq!(drafts.load::<String>(&key), None);

        drafts.save(&key, &"build a shop".to_string()).unwrap();
        assert_eq!(drafts.load::<String>(&key).as_deref(), Some("build a shop"));

        drafts.clear(&key).unwrap();
        assert_eq!(drafts.load::<String>(&key), None);
    }

    #[test]
    fn corrupt_draft_loads_as_none() {
        let store = MemoryStore::new();
        let key = DraftKey::NewTask {
            project_id: "p".into(),
        };
        store
            .set(&StoreKey::Draft(key.clone()), "{broken")
            .unwrap();
        assert_eq!(Drafts::new(&store).load::<String>(&key), None);
    }
}
