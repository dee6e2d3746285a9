use crate::errors::PersistenceError;
use serde_json::{Map, Value};
use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use tokio::fs;
use tracing::{debug, error};

pub type Entries = Map<String, Value>;

pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, keys: &[&str]) -> impl Future<Output = Result<Entries, PersistenceError>> + Send;

    /// Writes every entry or none of them.
    fn set(&self, entries: Entries) -> impl Future<Output = Result<(), PersistenceError>> + Send;

    fn keys(&self) -> impl Future<Output = Result<Vec<String>, PersistenceError>> + Send;
}

pub struct JsonFileStore {
    path: PathBuf,
    entries: tokio::sync::Mutex<Entries>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let entries = load_entries(&path).await;
        debug!(path = %path.display(), keys = entries.len(), "opened state file");
        Ok(Self {
            path,
            entries: tokio::sync::Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load_entries(path: &Path) -> Entries {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(entries)) => entries,
            Ok(_) => {
                error!("state file is not a JSON object, starting empty");
                Entries::new()
            }
            Err(err) => {
                error!("failed to parse state file: {err}");
                Entries::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Entries::new(),
        Err(err) => {
            error!("failed to read state file: {err}");
            Entries::new()
        }
    }
}

async fn persist_entries(path: &Path, entries: &Entries) -> Result<(), PersistenceError> {
    let payload = serde_json::to_vec_pretty(entries)?;
    fs::write(path, payload).await?;
    Ok(())
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries, PersistenceError> {
        let entries = self.entries.lock().await;
        Ok(select(&entries, keys))
    }

    async fn set(&self, updates: Entries) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.extend(updates);
        persist_entries(&self.path, &next).await.inspect_err(|err| {
            error!(path = %self.path.display(), "failed to write state file: {err}");
        })?;
        *entries = next;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Entries>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Entries) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
            fail_writes: Arc::default(),
        }
    }

    pub fn snapshot(&self) -> Entries {
        self.lock().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Entries, PersistenceError> {
        Ok(select(&self.lock(), keys))
    }

    async fn set(&self, updates: Entries) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected("writes disabled".into()));
        }
        self.lock().extend(updates);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.lock().keys().cloned().collect())
    }
}

fn select(entries: &Entries, keys: &[&str]) -> Entries {
    keys.iter()
        .filter_map(|key| entries.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("week_tracker_{name}_{}_{nanos}.json", std::process::id()))
    }

    fn entries(value: Value) -> Entries {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let path = temp_path("reopen");
        let store = JsonFileStore::open(&path).await.unwrap();
        store
            .set(entries(json!({ "currentWeek": "2024-01-08" })))
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let found = reopened.get(&["currentWeek", "weekData"]).await.unwrap();
        assert_eq!(found.get("currentWeek"), Some(&json!("2024-01-08")));
        assert!(!found.contains_key("weekData"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"{not json").unwrap();
        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn memory_store_rejects_writes_when_failing() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let result = store.set(entries(json!({ "a": 1 }))).await;
        assert!(matches!(result, Err(PersistenceError::Rejected(_))));
        assert!(store.snapshot().is_empty());
    }
}
