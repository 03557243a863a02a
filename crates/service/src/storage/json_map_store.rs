use std::{collections::HashMap, hash::Hash, path::{Path, PathBuf}, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::warn;

use crate::errors::CacheError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file. Every mutation rewrites the file
/// before returning. There is no cross-process locking; the last writer wins.
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if
    /// missing; a file that is not valid JSON starts empty. Other read errors
    /// are returned.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, CacheError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| CacheError::Io(e.to_string()))?;
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(file = %file_path.display(), error = %e, "discarding unreadable store file");
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                write_map(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(CacheError::Io(format!("{}: {e}", file_path.display()))),
        };

        Ok(Self { inner: Arc::new(RwLock::new(map)), file_path })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    async fn save(&self) -> Result<(), CacheError> {
        let map = self.inner.read().await;
        write_map(&self.file_path, &*map).await
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or update a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), CacheError> {
        let mut map = self.inner.write().await;
        map.insert(key, value);
        drop(map);
        self.save().await
    }

    /// Remove a key and persist; returns whether it existed.
    pub async fn remove(&self, key: &K) -> Result<bool, CacheError> {
        let mut map = self.inner.write().await;
        let existed = map.remove(key).is_some();
        drop(map);
        if existed {
            self.save().await?;
        }
        Ok(existed)
    }

    /// Keep entries matching the predicate, persisting once; returns how many were dropped.
    pub async fn retain<F>(&self, mut keep: F) -> Result<usize, CacheError>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|k, v| keep(k, v));
        let removed = before - map.len();
        drop(map);
        self.save().await?;
        Ok(removed)
    }

    /// Delete the backing file and start over with an empty map.
    pub async fn reset(&self) -> Result<(), CacheError> {
        let mut map = self.inner.write().await;
        match fs::remove_file(&self.file_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::Io(e.to_string())),
        }
        map.clear();
        write_map(&self.file_path, &*map).await
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

async fn write_map<T: serde::Serialize>(path: &Path, map: &T) -> Result<(), CacheError> {
    let data = serde_json::to_vec(map).map_err(|e| CacheError::Serde(e.to_string()))?;
    fs::write(path, data).await.map_err(|e| CacheError::Io(e.to_string()))
}
