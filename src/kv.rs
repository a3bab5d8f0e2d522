use crate::errors::StoreError;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, warn};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    fn get_json<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T
    where
        Self: Sized,
    {
        let Some(raw) = self.get(key).filter(|raw| !raw.is_empty()) else {
            return fallback;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, "stored value is not valid JSON, using fallback: {err}");
                fallback
            }
        }
    }

    fn set_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let payload = serde_json::to_string(value)?;
        self.set(key, payload)
    }
}

fn stored_size<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> usize {
    entries.map(|(key, value)| key.len() + value.len()).sum()
}

fn check_quota(quota: Option<usize>, needed: usize) -> Result<(), StoreError> {
    match quota {
        Some(limit) if needed > limit => Err(StoreError::QuotaExceeded { needed, limit }),
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let others = stored_size(self.entries.iter().filter(|(k, _)| k.as_str() != key));
        check_quota(self.quota, others + key.len() + value.len())?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Every key lives in one JSON object file, rewritten through a temp file and
/// a rename on each write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl FileStore {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Self {
            path,
            entries,
            quota: None,
        }
    }

    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(&mut self, next: BTreeMap<String, String>) -> Result<(), StoreError> {
        check_quota(self.quota, stored_size(next.iter()))?;
        if let Err(err) = write_entries(&self.path, &next) {
            error!(path = %self.path.display(), "failed to persist store: {err}");
            return Err(err);
        }
        self.entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value);
        self.commit(next)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next)
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse store file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read store file: {err}");
            BTreeMap::new()
        }
    }
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, payload)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
