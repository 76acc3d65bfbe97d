//! Analysis result caching

pub mod backend;
pub mod key;
pub mod store;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use key::{compute_key, CacheKey, ResumeIdentity};
pub use store::{AnalysisStore, CacheEntryInfo, CachedAnalysis, RECORD_VERSION};
