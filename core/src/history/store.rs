use crate::prelude::{AnalysisError, AnalysisResult};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Small string key-value store persisted as one JSON object.
///
/// Clones share the same data. Every write is flushed to disk before returning.
#[derive(Debug, Clone)]
pub struct LocalStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug)]
struct StoreInner {
    path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl LocalStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> AnalysisResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => serde_json::from_str(&contents)?,
            Ok(_) => Map::new(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self::from_inner(Some(path), values))
    }

    pub fn in_memory() -> Self {
        Self::from_inner(None, Map::new())
    }

    fn from_inner(path: Option<PathBuf>, values: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner { path, values })),
        }
    }

    fn with_inner<T, F: FnOnce(&mut StoreInner) -> AnalysisResult<T>>(
        &self,
        f: F,
    ) -> AnalysisResult<T> {
        let mut guard = self.inner.lock().map_err(|_| {
            AnalysisError::Store(io::Error::new(io::ErrorKind::Other, "store lock poisoned"))
        })?;
        f(&mut guard)
    }

    pub fn get(&self, key: &str) -> AnalysisResult<Option<String>> {
        self.with_inner(|inner| {
            Ok(inner
                .values
                .get(key)
                .and_then(|value| value.as_str())
                .map(str::to_string))
        })
    }

    pub fn set(&self, key: &str, value: &str) -> AnalysisResult<()> {
        self.with_inner(|inner| {
            inner
                .values
                .insert(key.to_string(), Value::String(value.to_string()));
            inner.flush()
        })
    }

    pub fn remove(&self, key: &str) -> AnalysisResult<()> {
        self.with_inner(|inner| {
            inner.values.remove(key);
            inner.flush()
        })
    }
}

impl StoreInner {
    fn flush(&self) -> AnalysisResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}
