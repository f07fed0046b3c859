//! Key-value persistence with a synced-preferences scope and a local-cache
//! scope. Values are JSON.

use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Small user preferences (filter state).
    Sync,
    /// Event caches and sync bookkeeping.
    Local,
}

impl Scope {
    fn file_name(&self) -> &'static str {
        match self {
            Scope::Sync => "sync.json",
            Scope::Local => "local.json",
        }
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Values for the keys that exist; missing keys are absent from the map.
    async fn get(&self, scope: Scope, keys: &[&str]) -> Result<HashMap<String, Value>>;
    async fn set(&self, scope: Scope, items: HashMap<String, Value>) -> Result<()>;
    async fn remove(&self, scope: Scope, keys: &[&str]) -> Result<()>;
    async fn clear(&self, scope: Scope) -> Result<()>;
}

/// Reads one key and decodes it. Undecodable values are logged and treated
/// as absent.
pub async fn load<T: DeserializeOwned>(storage: &dyn Storage, scope: Scope, key: &str) -> Result<Option<T>> {
    let mut values = storage.get(scope, &[key]).await?;
    let Some(value) = values.remove(key) else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(e) => {
            warn!("Ignoring undecodable value for '{}': {}", key, e);
            Ok(None)
        }
    }
}

pub async fn save<T: Serialize + ?Sized>(storage: &dyn Storage, scope: Scope, key: &str, value: &T) -> Result<()> {
    let mut items = HashMap::new();
    items.insert(key.to_string(), serde_json::to_value(value)?);
    storage.set(scope, items).await
}

type ScopeMaps = HashMap<Scope, HashMap<String, Value>>;

fn poisoned<T>(_: T) -> ScraperError {
    ScraperError::Storage("storage lock poisoned".into())
}

/// In-memory storage for tests and dry runs.
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    scopes: Arc<Mutex<ScopeMaps>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get(&self, scope: Scope, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let scopes = self.scopes.lock().map_err(poisoned)?;
        let Some(map) = scopes.get(&scope) else {
            return Ok(HashMap::new());
        };
        Ok(keys
            .iter()
            .filter_map(|k| map.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, scope: Scope, items: HashMap<String, Value>) -> Result<()> {
        let mut scopes = self.scopes.lock().map_err(poisoned)?;
        scopes.entry(scope).or_default().extend(items);
        Ok(())
    }

    async fn remove(&self, scope: Scope, keys: &[&str]) -> Result<()> {
        let mut scopes = self.scopes.lock().map_err(poisoned)?;
        if let Some(map) = scopes.get_mut(&scope) {
            for key in keys {
                map.remove(*key);
            }
        }
        Ok(())
    }

    async fn clear(&self, scope: Scope) -> Result<()> {
        let mut scopes = self.scopes.lock().map_err(poisoned)?;
        scopes.remove(&scope);
        Ok(())
    }
}

/// One JSON object file per scope under a data directory. Writes go through
/// a temp file and a rename.
pub struct JsonFileStorage {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, scope: Scope) -> PathBuf {
        self.dir.join(scope.file_name())
    }

    async fn read_scope(&self, scope: Scope) -> Result<Map<String, Value>> {
        let path = self.path(scope);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(ScraperError::Storage(format!(
                "{} does not hold a JSON object",
                path.display()
            ))),
        }
    }

    async fn write_scope(&self, scope: Scope, map: Map<String, Value>) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(scope);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&Value::Object(map))?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn get(&self, scope: Scope, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let mut map = self.read_scope(scope).await?;
        Ok(keys
            .iter()
            .filter_map(|k| map.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    async fn set(&self, scope: Scope, items: HashMap<String, Value>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_scope(scope).await?;
        map.extend(items);
        self.write_scope(scope, map).await
    }

    async fn remove(&self, scope: Scope, keys: &[&str]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_scope(scope).await?;
        for key in keys {
            map.remove(*key);
        }
        self.write_scope(scope, map).await
    }

    async fn clear(&self, scope: Scope) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path(scope)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
