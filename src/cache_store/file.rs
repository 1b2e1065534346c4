// One pretty-printed JSON file per key. Writes go to a temp file and are renamed into place.

use super::CacheStore;
use crate::error::CacheError;
use crate::models::CacheEntry;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    /// Create the cache directory if missing.
    pub fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `agents<key>.json`, e.g. `agents_7Days.json`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("agents{safe}.json"))
    }

    async fn read(&self, path: &Path) -> Result<Option<CacheEntry>, CacheError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    #[instrument(skip(self), fields(store = "file", operation = "cache_get"))]
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.path_for(key);
        match self.read(&path).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache file unreadable; treating as miss");
                None
            }
        }
    }

    #[instrument(skip(self, entry), fields(store = "file", operation = "cache_set", total_count = entry.result.total_count))]
    async fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(entry)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
