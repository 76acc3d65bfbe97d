//! Persistent analysis store keyed by job URL, resume identity and description

use crate::cache::backend::{FileStorage, MemoryStorage, StorageBackend};
use crate::cache::key::{key_belongs_to_job, CacheKey, ResumeIdentity};
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Layout version written into every record
pub const RECORD_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub saved_at: DateTime<Utc>,
    pub version: String,
}

/// One stored analysis.
///
/// `timestamp` is when the key was first written; `metadata.saved_at` is
/// the latest write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedAnalysis {
    /// Storage key the record was read from; not part of the stored layout
    #[serde(skip)]
    pub key: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub analysis_data: serde_json::Value,
    pub metadata: RecordMetadata,
}

/// What `exists` reports without handing back the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryInfo {
    pub key: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub version: String,
}

impl From<&CachedAnalysis> for CacheEntryInfo {
    fn from(record: &CachedAnalysis) -> Self {
        Self {
            key: record.key.clone(),
            url: record.url.clone(),
            timestamp: record.timestamp,
            saved_at: record.metadata.saved_at,
            version: record.metadata.version.clone(),
        }
    }
}

/// Saves, loads and enumerates analyses.
///
/// Backend I/O failures are logged and reported as `false`/`None`/empty.
/// Writes replace whole records; concurrent writers to the same key race
/// and the last one wins.
#[derive(Clone)]
pub struct AnalysisStore {
    backend: Arc<dyn StorageBackend>,
}

impl AnalysisStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// JSON files under `dir`, one per record.
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(dir)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::default()))
    }

    /// Write (or overwrite) the record for this URL / resume / description.
    pub async fn save<T: Serialize>(
        &self,
        url: &str,
        payload: &T,
        resume: Option<&ResumeIdentity>,
        job_description: Option<&str>,
    ) -> bool {
        let key = CacheKey::compute(url, resume, job_description).as_string();

        let analysis_data = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to serialize analysis for {}: {}", url, e);
                return false;
            }
        };

        let now = Utc::now();
        let timestamp = self
            .read_record(&key)
            .await
            .map(|existing| existing.timestamp)
            .unwrap_or(now);

        let record = CachedAnalysis {
            key: key.clone(),
            url: url.to_string(),
            timestamp,
            analysis_data,
            metadata: RecordMetadata {
                saved_at: now,
                version: RECORD_VERSION.to_string(),
            },
        };

        let bytes = match serde_json::to_vec_pretty(&record) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode cache record {}: {}", key, e);
                return false;
            }
        };

        match self.backend.put(&key, &bytes).await {
            Ok(()) => {
                debug!("Saved analysis under {}", key);
                true
            }
            Err(e) => {
                error!("Failed to save analysis {}: {}", key, e);
                false
            }
        }
    }

    /// Record for exactly this URL / resume / description, `None` on a miss.
    pub async fn load(
        &self,
        url: &str,
        resume: Option<&ResumeIdentity>,
        job_description: Option<&str>,
    ) -> Option<CachedAnalysis> {
        let key = CacheKey::compute(url, resume, job_description).as_string();
        let record = self.read_record(&key).await;
        debug!(
            "Cache {} for {}",
            if record.is_some() { "hit" } else { "miss" },
            key
        );
        record
    }

    /// Newest record for this URL and resume, under any job description.
    pub async fn exists(&self, url: &str, resume: Option<&ResumeIdentity>) -> Option<CacheEntryInfo> {
        let key = CacheKey::compute(url, resume, None);
        let mut records = self.read_matching(|k| key.covers_any_description(k)).await;
        sort_newest_first(&mut records);
        records.first().map(CacheEntryInfo::from)
    }

    /// Remove every record for this URL and resume, whatever the description.
    /// True iff something was removed.
    pub async fn delete(&self, url: &str, resume: Option<&ResumeIdentity>) -> bool {
        let key = CacheKey::compute(url, resume, None);
        let keys = self.matching_keys(|k| key.covers_any_description(k)).await;
        self.remove_keys(&keys).await > 0
    }

    /// Remove every record of this posting, for any resume. Returns the count.
    pub async fn clear_for_job(&self, url: &str) -> usize {
        let keys = self.matching_keys(|k| key_belongs_to_job(k, url)).await;
        self.remove_keys(&keys).await
    }

    /// All analyses of one posting, newest first.
    pub async fn list_for_job(&self, url: &str) -> Vec<CachedAnalysis> {
        let mut records = self.read_matching(|k| key_belongs_to_job(k, url)).await;
        sort_newest_first(&mut records);
        records
    }

    /// Every readable record, newest first. Corrupt records are skipped.
    pub async fn list_all(&self) -> Vec<CachedAnalysis> {
        let mut records = self.read_matching(|_| true).await;
        sort_newest_first(&mut records);
        records
    }

    async fn read_record(&self, key: &str) -> Option<CachedAnalysis> {
        let bytes = match self.backend.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read cache record {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice::<CachedAnalysis>(&bytes) {
            Ok(mut record) => {
                record.key = key.to_string();
                Some(record)
            }
            Err(e) => {
                warn!("Skipping malformed cache record {}: {}", key, e);
                None
            }
        }
    }

    async fn matching_keys(&self, filter: impl Fn(&str) -> bool) -> Vec<String> {
        match self.backend.keys().await {
            Ok(keys) => keys.into_iter().filter(|k| filter(k.as_str())).collect(),
            Err(e) => {
                error!("Failed to enumerate cache records: {}", e);
                Vec::new()
            }
        }
    }

    async fn read_matching(&self, filter: impl Fn(&str) -> bool) -> Vec<CachedAnalysis> {
        let mut records = Vec::new();
        for key in self.matching_keys(filter).await {
            if let Some(record) = self.read_record(&key).await {
                records.push(record);
            }
        }
        records
    }

    async fn remove_keys(&self, keys: &[String]) -> usize {
        let mut removed = 0;
        for key in keys {
            match self.backend.remove(key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => error!("Failed to delete cache record {}: {}", key, e),
            }
        }
        removed
    }
}

fn sort_newest_first(records: &mut [CachedAnalysis]) {
    records.sort_by(|a, b| {
        b.metadata
            .saved_at
            .cmp(&a.metadata.saved_at)
            .then_with(|| a.key.cmp(&b.key))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://jobs.example.com/posting/42";

    fn id(name: &str, size: u64) -> ResumeIdentity {
        ResumeIdentity::new(name, size)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = AnalysisStore::in_memory();
        let payload = json!({"matchPercentage": 80, "matchedSkills": ["rust"]});

        assert!(store.save(URL, &payload, Some(&id("r1.pdf", 100)), Some("desc")).await);
        let record = store.load(URL, Some(&id("r1.pdf", 100)), Some("desc")).await.unwrap();

        assert_eq!(record.analysis_data, payload);
        assert_eq!(record.url, URL);
        assert_eq!(record.metadata.version, RECORD_VERSION);
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let store = AnalysisStore::in_memory();
        assert!(store.load(URL, None, None).await.is_none());
        assert!(store.exists(URL, None).await.is_none());
        assert!(!store.delete(URL, None).await);
    }

    #[tokio::test]
    async fn test_resume_segmentation() {
        let store = AnalysisStore::in_memory();
        store.save(URL, &json!("A"), Some(&id("r1.pdf", 100)), None).await;
        store.save(URL, &json!("B"), Some(&id("r2.pdf", 200)), None).await;

        let a = store.load(URL, Some(&id("r1.pdf", 100)), None).await.unwrap();
        let b = store.load(URL, Some(&id("r2.pdf", 200)), None).await.unwrap();
        assert_eq!(a.analysis_data, json!("A"));
        assert_eq!(b.analysis_data, json!("B"));
    }

    #[tokio::test]
    async fn test_overwrite_keeps_first_timestamp() {
        let store = AnalysisStore::in_memory();
        store.save(URL, &json!(1), None, None).await;
        let first = store.load(URL, None, None).await.unwrap();

        store.save(URL, &json!(2), None, None).await;
        let second = store.load(URL, None, None).await.unwrap();

        assert_eq!(second.analysis_data, json!(2));
        assert_eq!(second.timestamp, first.timestamp);
        assert!(second.metadata.saved_at >= first.metadata.saved_at);
        assert_eq!(store.list_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_exists_and_delete_ignore_description() {
        let store = AnalysisStore::in_memory();
        let resume = id("r1.pdf", 100);
        store.save(URL, &json!(1), Some(&resume), Some("desc v1")).await;
        store.save(URL, &json!(2), Some(&id("r2.pdf", 5)), Some("desc v1")).await;

        let info = store.exists(URL, Some(&resume)).await.unwrap();
        assert_eq!(info.url, URL);
        assert!(store.exists(URL, None).await.is_none());

        assert!(store.delete(URL, Some(&resume)).await);
        assert!(store.exists(URL, Some(&resume)).await.is_none());
        assert!(store.exists(URL, Some(&id("r2.pdf", 5))).await.is_some());
    }

    #[tokio::test]
    async fn test_list_for_job_and_clear() {
        let store = AnalysisStore::in_memory();
        let other = "https://jobs.example.com/posting/43";
        store.save(URL, &json!(1), Some(&id("a", 1)), None).await;
        store.save(URL, &json!(2), Some(&id("b", 2)), Some("d")).await;
        store.save(other, &json!(3), None, None).await;

        let listed = store.list_for_job(URL).await;
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.url == URL));
        assert!(listed[0].metadata.saved_at >= listed[1].metadata.saved_at);

        assert_eq!(store.clear_for_job(URL).await, 2);
        assert!(store.list_for_job(URL).await.is_empty());
        assert_eq!(store.list_all().await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_to_one_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnalysisStore::file(dir.path());
        let resume = id("r1.pdf", 100);

        let mut handles = Vec::new();
        for writer in 0..8 {
            let store = store.clone();
            let resume = resume.clone();
            handles.push(tokio::spawn(async move {
                let mut saved = 0;
                for round in 0..15 {
                    let payload = json!({"writer": writer, "round": round});
                    if store.save(URL, &payload, Some(&resume), Some("desc")).await {
                        saved += 1;
                    }
                }
                saved
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 15);
        }

        let records = store.list_all().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].analysis_data["writer"].is_number());
    }

    #[tokio::test]
    async fn test_list_all_skips_malformed_records() {
        let backend = Arc::new(MemoryStorage::default());
        let store = AnalysisStore::new(backend.clone());
        store.save(URL, &json!({"ok": true}), None, None).await;
        backend.put("garbage", b"{not json").await.unwrap();

        let all = store.list_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].analysis_data, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_record_layout() {
        let backend = Arc::new(MemoryStorage::default());
        let store = AnalysisStore::new(backend.clone());
        store.save(URL, &json!({"x": 1}), None, None).await;

        let key = CacheKey::compute(URL, None, None).as_string();
        let raw: serde_json::Value =
            serde_json::from_slice(&backend.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(raw["url"], URL);
        assert_eq!(raw["analysisData"], json!({"x": 1}));
        assert!(raw["timestamp"].is_string());
        assert!(raw["metadata"]["savedAt"].is_string());
        assert_eq!(raw["metadata"]["version"], RECORD_VERSION);
        assert!(raw.get("key").is_none());
    }
}
