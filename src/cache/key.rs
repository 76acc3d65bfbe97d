//! Deterministic cache keys for analysis results
//!
//! Key layout: `{host}_{url hash}[_r{resume hash}][_d{description hash}]`.
//! The `{host}_{url hash}` prefix groups every analysis of one posting.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

const URL_HASH_LEN: usize = 16;
const SHORT_HASH_LEN: usize = 8;
const RESUME_TAG: &str = "_r";
const DESCRIPTION_TAG: &str = "_d";

/// Which resume was used: filename plus size, not a content hash.
///
/// Two uploads with identical text but a different name or size are
/// different identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeIdentity {
    pub filename: String,
    pub file_size_bytes: u64,
}

impl ResumeIdentity {
    pub fn new(filename: impl Into<String>, file_size_bytes: u64) -> Self {
        Self {
            filename: filename.into(),
            file_size_bytes,
        }
    }

    /// Identity of a file on disk (base name + byte length).
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self::new(filename, metadata.len()))
    }

    fn fingerprint(&self) -> String {
        format!("{}_{}", self.filename, self.file_size_bytes)
    }
}

/// A computed storage key. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    prefix: String,
    resume: Option<String>,
    description: Option<String>,
}

impl CacheKey {
    pub fn compute(
        url: &str,
        resume: Option<&ResumeIdentity>,
        job_description: Option<&str>,
    ) -> Self {
        Self {
            prefix: job_prefix(url),
            resume: resume.map(|id| short_hash(&id.fingerprint())),
            description: job_description.map(short_hash),
        }
    }

    /// The `{host}_{url hash}` part shared by every analysis of one posting.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key without the description segment; records for this URL and resume
    /// either equal it or extend it with a description segment.
    pub fn without_description(&self) -> String {
        match &self.resume {
            Some(resume) => format!("{}{}{}", self.prefix, RESUME_TAG, resume),
            None => self.prefix.clone(),
        }
    }

    pub fn as_string(&self) -> String {
        let mut key = self.without_description();
        if let Some(description) = &self.description {
            key.push_str(DESCRIPTION_TAG);
            key.push_str(description);
        }
        key
    }

    /// True if `key` belongs to the same URL and resume, whatever its description.
    pub fn covers_any_description(&self, key: &str) -> bool {
        let base = self.without_description();
        key == base
            || key
                .strip_prefix(base.as_str())
                .map_or(false, |rest| rest.starts_with(DESCRIPTION_TAG))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Deterministic key for `(url, resume, job description)`.
pub fn compute_key(
    url: &str,
    resume: Option<&ResumeIdentity>,
    job_description: Option<&str>,
) -> String {
    CacheKey::compute(url, resume, job_description).as_string()
}

/// Prefix shared by all analyses of a posting.
pub fn job_prefix(url: &str) -> String {
    let url = url.trim();
    let hash = hex_digest(url);
    format!("{}_{}", hostname(url), &hash[..URL_HASH_LEN])
}

/// True if `key` was computed for the posting at `url`.
pub fn key_belongs_to_job(key: &str, url: &str) -> bool {
    let prefix = job_prefix(url);
    key == prefix
        || key
            .strip_prefix(prefix.as_str())
            .map_or(false, |rest| rest.starts_with('_'))
}

/// Lowercased host, reduced to characters safe in a file name.
fn hostname(url: &str) -> String {
    let host = reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_else(|| "unknown".to_string());

    host.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn hex_digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

fn short_hash(input: &str) -> String {
    hex_digest(input)[..SHORT_HASH_LEN].to_string()
}
