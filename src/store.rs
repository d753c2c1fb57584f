use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use colored::*;
use serde_json::Value;

use crate::persona::Persona;
use crate::snapshot::StatSnapshot;

/// Composite storage key: namespace plus persona, never ad hoc string
/// concatenation at call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    namespace: String,
    persona: Persona,
}

impl StorageKey {
    pub fn new(namespace: &str, persona: Persona) -> Self {
        StorageKey {
            namespace: namespace.to_string(),
            persona,
        }
    }

    fn file_name(&self) -> String {
        format!("{}_{}.json", self.namespace, self.persona.key_name())
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.persona.key_name())
    }
}

/// Narrow persistence interface: a pure get/set/remove byte store with
/// last-write-wins semantics and no transactional guarantees.
pub trait KvStore: Send {
    fn get(&self, key: &StorageKey) -> Result<Option<Value>>;
    fn set(&self, key: &StorageKey, value: &Value) -> Result<()>;
    fn remove(&self, key: &StorageKey) -> Result<()>;
}

/// JSON-file-per-key store under the application data directory.
pub struct FileKvStore {
    data_dir: PathBuf,
}

impl FileKvStore {
    pub fn new(data_dir: PathBuf) -> Self {
        FileKvStore { data_dir }
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.data_dir.join(key.file_name())
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &StorageKey) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value =
            serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", key))?;
        Ok(Some(value))
    }

    fn set(&self, key: &StorageKey, value: &Value) -> Result<()> {
        let content =
            serde_json::to_string_pretty(value).context("Failed to serialize value")?;
        std::fs::write(self.path_for(key), content)
            .with_context(|| format!("Failed to write {}", key))?;
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", key))?;
        }
        Ok(())
    }
}

/// In-memory store for tests and degraded operation.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &StorageKey) -> Result<Option<Value>> {
        Ok(self
            .entries
            .lock()
            .ok()
            .and_then(|map| map.get(&key.file_name()).cloned()))
    }

    fn set(&self, key: &StorageKey, value: &Value) -> Result<()> {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.file_name(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &StorageKey) -> Result<()> {
        if let Ok(mut map) = self.entries.lock() {
            map.remove(&key.file_name());
        }
        Ok(())
    }
}

/// Loads the persisted snapshot for a key. A missing, unreadable, or
/// malformed snapshot yields None, which callers treat as a first run.
pub fn load_snapshot(store: &dyn KvStore, key: &StorageKey) -> Option<StatSnapshot> {
    let value = match store.get(key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            eprintln!("{} {:#}", "Discarding unreadable snapshot:".yellow(), e);
            return None;
        }
    };
    match serde_json::from_value::<StatSnapshot>(value) {
        Ok(mut snapshot) => {
            snapshot.stats.clamp_all();
            Some(snapshot)
        }
        Err(e) => {
            eprintln!(
                "{} {} ({})",
                "Malformed snapshot for".yellow(),
                key,
                e
            );
            None
        }
    }
}

/// Persists the snapshot. Storage failure is logged and swallowed; the
/// simulation keeps running in memory only.
pub fn save_snapshot(store: &dyn KvStore, key: &StorageKey, snapshot: &StatSnapshot) {
    let value = match serde_json::to_value(snapshot) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{} {}", "Failed to serialize snapshot:".yellow(), e);
            return;
        }
    };
    if let Err(e) = store.set(key, &value) {
        eprintln!("{} {:#}", "Failed to persist snapshot:".yellow(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryKvStore::new();
        let key = StorageKey::new("gotchi_v1", Persona::Mika);
        let snapshot = StatSnapshot::fresh(Utc::now());

        save_snapshot(&store, &key, &snapshot);
        let loaded = load_snapshot(&store, &key).unwrap();
        assert_eq!(loaded, snapshot);

        store.remove(&key).unwrap();
        assert!(load_snapshot(&store, &key).is_none());
    }

    #[test]
    fn test_personas_do_not_collide() {
        let store = MemoryKvStore::new();
        let mika_key = StorageKey::new("gotchi_v1", Persona::Mika);
        let kana_key = StorageKey::new("gotchi_v1", Persona::Kana);

        let mut mika = StatSnapshot::fresh(Utc::now());
        mika.streak_count = 3;
        let kana = StatSnapshot::fresh(Utc::now());

        save_snapshot(&store, &mika_key, &mika);
        save_snapshot(&store, &kana_key, &kana);

        assert_eq!(load_snapshot(&store, &mika_key).unwrap().streak_count, 3);
        assert_eq!(load_snapshot(&store, &kana_key).unwrap().streak_count, 0);
    }

    #[test]
    fn test_malformed_snapshot_falls_back_to_fresh() {
        let store = MemoryKvStore::new();
        let key = StorageKey::new("gotchi_v1", Persona::Mika);
        store
            .set(&key, &serde_json::json!({ "hunger": "not a number" }))
            .unwrap();
        assert!(load_snapshot(&store, &key).is_none());
    }

    #[test]
    fn test_out_of_range_persisted_stats_are_reclamped() {
        let store = MemoryKvStore::new();
        let key = StorageKey::new("gotchi_v1", Persona::Kana);
        let mut snapshot = StatSnapshot::fresh(Utc::now());
        snapshot.stats.hunger = 50.0;
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["stats"]["hunger"] = serde_json::json!(400.0);
        store.set(&key, &value).unwrap();

        let loaded = load_snapshot(&store, &key).unwrap();
        assert_eq!(loaded.stats.hunger, 100.0);
    }
}
