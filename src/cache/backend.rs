//! Key-value storage backends for cached analyses

use crate::error::{MatcherError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::RwLock;

const RECORD_EXTENSION: &str = "json";

/// Distinguishes temp files of concurrent writers within this process
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Whole-value key-value storage. Implementations never mutate a value in place.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    /// True if the key existed.
    async fn remove(&self, key: &str) -> Result<bool>;
    async fn keys(&self) -> Result<Vec<String>>;
}

/// One `<key>.json` file per record.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(MatcherError::Storage(format!("Invalid storage key: {}", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, RECORD_EXTENSION)))
    }

    /// A temp path no other writer, in this or another process, is using.
    fn tmp_path_for(&self, key: &str) -> PathBuf {
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{}.{}.{}.tmp", key, std::process::id(), seq))
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MatcherError::Io(e)),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        // each writer renames its own complete file into place; the last rename wins
        let tmp = self.tmp_path_for(key);
        fs::write(&tmp, value).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(MatcherError::Io(e));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MatcherError::Io(e)),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MatcherError::Io(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process storage for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.records
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.records.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("cache"));

        assert!(storage.keys().await.unwrap().is_empty());
        assert!(storage.get("example.com_abc").await.unwrap().is_none());

        storage.put("example.com_abc", b"{}").await.unwrap();
        assert_eq!(storage.get("example.com_abc").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.keys().await.unwrap(), vec!["example.com_abc".to_string()]);

        assert!(storage.remove("example.com_abc").await.unwrap());
        assert!(!storage.remove("example.com_abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_storage_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.put("../escape", b"x").await.is_err());
        assert!(storage.get("a/b").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_storage_concurrent_writers_to_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(FileStorage::new(dir.path()));

        let mut handles = Vec::new();
        for writer in 0..8u8 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                let value = vec![writer; 256 * 1024];
                let mut failures = 0;
                for _ in 0..20 {
                    if storage.put("example.com_key", &value).await.is_err() {
                        failures += 1;
                    }
                }
                failures
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 0);
        }

        // the surviving record is one writer's complete value
        let stored = storage.get("example.com_key").await.unwrap().unwrap();
        assert_eq!(stored.len(), 256 * 1024);
        assert!(stored.iter().all(|b| *b == stored[0]));
        assert_eq!(storage.keys().await.unwrap(), vec!["example.com_key".to_string()]);

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().path().extension().map_or(false, |x| x == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::default();
        storage.put("k", b"v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(storage.remove("k").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
