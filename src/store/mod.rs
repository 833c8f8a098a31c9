//! Preset persistence
//!
//! Presets live in a plain key-value store, one JSON document per site host.
//! Every change is a read-modify-write of that whole document.

pub mod file;
pub mod transfer;

pub use file::FileStore;
pub use transfer::{EXPORT_MARKER, EXPORT_VERSION, ExportDocument, ImportedQuiz, export_file_name, parse_import};

use crate::error::{AutofillError, Result};
use crate::quiz::model::PresetStore;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Mutex;

/// Key prefix of the preset document for a host
pub const PRESETS_KEY_PREFIX: &str = "ttf_presets_";

/// Key prefix of the selected quiz for a host
pub const SELECTED_QUIZ_KEY_PREFIX: &str = "ttf_selected_quiz_";

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| AutofillError::Storage(format!("Store poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|e| AutofillError::Storage(format!("Store poisoned: {}", e)))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|e| AutofillError::Storage(format!("Store poisoned: {}", e)))?
            .remove(key);
        Ok(())
    }
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Presets of one site host
pub struct PresetRepository<'a> {
    store: &'a dyn KeyValueStore,
    host: String,
}

impl<'a> PresetRepository<'a> {
    pub fn new(store: &'a dyn KeyValueStore, host: impl Into<String>) -> Self {
        Self {
            store,
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Storage key of the preset document
    pub fn key(&self) -> String {
        format!("{}{}", PRESETS_KEY_PREFIX, self.host)
    }

    fn selected_key(&self) -> String {
        format!("{}{}", SELECTED_QUIZ_KEY_PREFIX, self.host)
    }

    /// Load the presets; missing data is an empty store, unreadable data an error
    pub fn load(&self) -> Result<PresetStore> {
        let key = self.key();
        match self.store.get(&key)? {
            None => Ok(PresetStore::new()),
            Some(raw) if raw.trim().is_empty() => Ok(PresetStore::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| AutofillError::CorruptStore {
                key,
                reason: e.to_string(),
            }),
        }
    }

    /// Load the presets, treating any failure as an empty store
    pub fn load_or_empty(&self) -> PresetStore {
        self.load().unwrap_or_else(|e| {
            warn!("{}; starting from an empty preset store", e);
            PresetStore::new()
        })
    }

    /// Persist the whole store
    pub fn save(&self, presets: &PresetStore) -> Result<()> {
        let json = serde_json::to_string(presets)?;
        self.store.set(&self.key(), &json).inspect_err(|e| {
            warn!("Failed to save presets for {}: {}", self.host, e);
        })?;
        debug!("Saved {} quiz presets for {}", presets.len(), self.host);
        Ok(())
    }

    /// Load, change and save the store; nothing is written if `change` fails
    pub fn update<T>(&self, change: impl FnOnce(&mut PresetStore) -> Result<T>) -> Result<T> {
        let mut presets = self.load()?;
        let value = change(&mut presets)?;
        self.save(&presets)?;
        Ok(value)
    }

    /// Quiz selected in an earlier session
    pub fn selected_quiz(&self) -> Result<Option<String>> {
        Ok(self.store.get(&self.selected_key())?.filter(|quiz| !quiz.is_empty()))
    }

    /// Remember the selected quiz, or forget it with `None`
    pub fn set_selected_quiz(&self, quiz: Option<&str>) -> Result<()> {
        match quiz {
            Some(quiz) => self.store.set(&self.selected_key(), quiz),
            None => self.store.remove(&self.selected_key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::model::{AnswerRecord, QuestionId};

    fn qid(n: u32) -> QuestionId {
        QuestionId::from_digits(&n.to_string()).unwrap()
    }

    #[test]
    fn test_hosts_are_separate() {
        let store = MemoryStore::new();
        let a = PresetRepository::new(&store, "lms.a.edu");
        let b = PresetRepository::new(&store, "lms.b.edu");
        assert_eq!(a.key(), "ttf_presets_lms.a.edu");

        a.update(|presets| {
            presets.upsert_question("Quiz", qid(1), AnswerRecord::manual("x", 1), 1);
            Ok(())
        })
        .unwrap();

        assert_eq!(a.load().unwrap().len(), 1);
        assert!(b.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_store() {
        let store = MemoryStore::new();
        store.set("ttf_presets_host", "{not json").unwrap();
        let repo = PresetRepository::new(&store, "host");

        assert!(matches!(repo.load(), Err(AutofillError::CorruptStore { .. })));
        assert!(repo.load_or_empty().is_empty());

        let result = repo.update(|presets| {
            presets.upsert_question("Quiz", qid(1), AnswerRecord::manual("x", 1), 1);
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(store.get("ttf_presets_host").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let store = MemoryStore::new();
        let repo = PresetRepository::new(&store, "host");
        let result: Result<()> = repo.update(|presets| {
            presets.upsert_question("Quiz", qid(1), AnswerRecord::manual("x", 1), 1);
            Err(AutofillError::QuizNameMissing)
        });
        assert!(result.is_err());
        assert_eq!(store.get(&repo.key()).unwrap(), None);
    }

    #[test]
    fn test_selected_quiz() {
        let store = MemoryStore::new();
        let repo = PresetRepository::new(&store, "host");
        assert_eq!(repo.selected_quiz().unwrap(), None);

        repo.set_selected_quiz(Some("Ethics")).unwrap();
        assert_eq!(repo.selected_quiz().unwrap().as_deref(), Some("Ethics"));

        repo.set_selected_quiz(None).unwrap();
        assert_eq!(repo.selected_quiz().unwrap(), None);
    }
}
