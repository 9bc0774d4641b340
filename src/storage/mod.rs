use log::warn;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;

pub mod bridge;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access backing store: {0}")]
    Io(#[from] io::Error),
    #[error("malformed value for key {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct StoreChange {
    pub key: String,
    pub new_value: Option<String>,
    origin: String,
}

#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    values: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<StoreChange>,
    dir: Option<PathBuf>,
}

impl SharedStore {
    pub fn in_memory() -> Self {
        Self::from_parts(HashMap::new(), None)
    }

    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut values = HashMap::new();
        for entry in fs::read_dir(&dir)?.flatten() {
            let path = entry.path();
            if path.extension() != Some(OsStr::new("json")) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(OsStr::to_str) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(value) => {
                    values.insert(key.to_string(), value);
                }
                Err(err) => {
                    warn!("skipping unreadable store entry {}: {err}", path.display());
                }
            }
        }

        Ok(Self::from_parts(values, Some(dir)))
    }

    fn from_parts(values: HashMap<String, String>, dir: Option<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                values: Mutex::new(values),
                changes,
                dir,
            }),
        }
    }

    pub fn attach(&self) -> StoreContext {
        StoreContext {
            store: self.clone(),
            context_id: crate::model::record_id(),
            session: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .values
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String, origin: &str) -> Result<(), StorageError> {
        self.inner
            .values
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.clone());

        let _ = self.inner.changes.send(StoreChange {
            key: key.to_string(),
            new_value: Some(value.clone()),
            origin: origin.to_string(),
        });

        if let Some(dir) = &self.inner.dir {
            write_entry(dir, key, &value)?;
        }
        Ok(())
    }

    fn remove(&self, key: &str, origin: &str) -> Result<(), StorageError> {
        self.inner
            .values
            .lock()
            .expect("store mutex poisoned")
            .remove(key);

        let _ = self.inner.changes.send(StoreChange {
            key: key.to_string(),
            new_value: None,
            origin: origin.to_string(),
        });

        if let Some(dir) = &self.inner.dir {
            let path = entry_path(dir, key);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

pub struct StoreContext {
    store: SharedStore,
    context_id: String,
    session: Mutex<HashMap<String, String>>,
}

impl StoreContext {
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        self.store.set(key, value.into(), &self.context_id)
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key, &self.context_id)
    }

    pub fn session_get(&self, key: &str) -> Option<String> {
        self.session
            .lock()
            .expect("session mutex poisoned")
            .get(key)
            .cloned()
    }

    pub fn session_set(&self, key: &str, value: impl Into<String>) {
        self.session
            .lock()
            .expect("session mutex poisoned")
            .insert(key.to_string(), value.into());
    }

    pub fn session_remove(&self, key: &str) {
        self.session
            .lock()
            .expect("session mutex poisoned")
            .remove(key);
    }

    pub fn subscribe(&self) -> ChangeStream {
        ChangeStream {
            rx: self.store.inner.changes.subscribe(),
            context_id: self.context_id.clone(),
        }
    }
}

pub struct ChangeStream {
    rx: broadcast::Receiver<StoreChange>,
    context_id: String,
}

impl ChangeStream {
    pub async fn next(&mut self) -> Option<StoreChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.origin == self.context_id => continue,
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("change stream lagged, skipped {skipped} store changes");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn write_entry(dir: &Path, key: &str, value: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let final_path = entry_path(dir, key);
    let tmp_path = dir.join(format!("{key}.json.tmp"));

    fs::write(&tmp_path, value)?;
    match fs::rename(&tmp_path, &final_path) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if final_path.exists() {
                fs::remove_file(&final_path)?;
                fs::rename(&tmp_path, &final_path)?;
                Ok(())
            } else {
                Err(rename_err)
            }
        }
    }
}
