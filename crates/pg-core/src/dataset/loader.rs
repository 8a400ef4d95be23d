//! Dataset refresh
//!
//! Fetching is the only suspending operation in the crate and lives here,
//! away from the lookup path. Every failure ends in one of two safe states:
//! the seed snapshot (nothing ever loaded) or the previously loaded snapshot.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use super::format::{parse_dataset, seed_snapshot, LoadStats, DEFAULT_DATASET_URL};
use super::store::{DatasetSnapshot, DatasetStore};

/// Default bound on a single fetch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for dataset loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetLoadError {
    #[error("Dataset transport failed: {0}")]
    Transport(String),
    #[error("Dataset payload is not a JSON array of records: {0}")]
    Parse(String),
    #[error("Dataset fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl From<serde_json::Error> for DatasetLoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<std::io::Error> for DatasetLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Something a dataset payload can be fetched from.
pub trait DatasetSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Fetch the raw payload.
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, DatasetLoadError>> + Send;
}

/// In-memory payload.
#[derive(Debug, Clone)]
pub struct StaticSource {
    bytes: Vec<u8>,
}

impl StaticSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }
}

impl DatasetSource for StaticSource {
    fn describe(&self) -> String {
        format!("<memory:{} bytes>", self.bytes.len())
    }

    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, DatasetLoadError>> + Send {
        let bytes = self.bytes.clone();
        async move { Ok(bytes) }
    }
}

/// Payload read from a local file.
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct FileSource {
    path: std::path::PathBuf,
}

#[cfg(feature = "async")]
impl FileSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(feature = "async")]
impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, DatasetLoadError>> + Send {
        let path = self.path.clone();
        async move {
            tokio::fs::read(&path).await.map_err(|e| {
                DatasetLoadError::Transport(format!("Failed to read '{}': {}", path.display(), e))
            })
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Loader settings, deserializable from a JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Dataset location (URL or path)
    pub source: String,
    /// Bound on a single fetch, in seconds
    pub timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_DATASET_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LoaderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Result of applying a load attempt to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New snapshot published
    Loaded(LoadStats),
    /// Load failed before any successful load; seed published
    SeedFallback(DatasetLoadError),
    /// Load failed; previously loaded snapshot left active
    RetainedPrevious(DatasetLoadError),
}

impl RefreshOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn error(&self) -> Option<&DatasetLoadError> {
        match self {
            Self::Loaded(_) => None,
            Self::SeedFallback(e) | Self::RetainedPrevious(e) => Some(e),
        }
    }
}

/// Builds snapshots from sources.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    timeout: Duration,
}

impl DatasetLoader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a snapshot from an already fetched payload.
    pub fn parse(&self, bytes: &[u8]) -> Result<(DatasetSnapshot, LoadStats), DatasetLoadError> {
        parse_dataset(bytes)
    }

    /// Fetch and parse under the configured timeout.
    ///
    /// On expiry the fetch future is dropped, which cancels it.
    #[cfg(feature = "async")]
    pub async fn load<S: DatasetSource>(
        &self,
        source: &S,
    ) -> Result<(DatasetSnapshot, LoadStats), DatasetLoadError> {
        let bytes = tokio::time::timeout(self.timeout, source.fetch())
            .await
            .map_err(|_| DatasetLoadError::Timeout(self.timeout))??;
        self.parse(&bytes)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

/// Publish a load result, or fall back per the snapshot lifecycle.
pub fn apply_load_result(
    store: &DatasetStore,
    result: Result<(DatasetSnapshot, LoadStats), DatasetLoadError>,
) -> RefreshOutcome {
    match result {
        Ok((snapshot, stats)) => {
            let generation = store.publish(snapshot);
            log::info!(
                "Phishing dataset loaded: {} entries ({} dropped, {} overwritten, generation {})",
                stats.entries(),
                stats.dropped,
                stats.overwritten,
                generation
            );
            RefreshOutcome::Loaded(stats)
        }
        Err(e) => {
            if store.publish_fallback(seed_snapshot()) {
                log::warn!("Failed to load phishing dataset, using seed dataset: {}", e);
                RefreshOutcome::SeedFallback(e)
            } else {
                log::warn!("Failed to refresh phishing dataset, keeping previous snapshot: {}", e);
                RefreshOutcome::RetainedPrevious(e)
            }
        }
    }
}

#[cfg(all(test, feature = "async"))]
mod tests {
    use super::*;
    use crate::dataset::store::SnapshotOrigin;

    struct FailingSource;

    impl DatasetSource for FailingSource {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, DatasetLoadError>> + Send {
            async { Err(DatasetLoadError::Transport("connection refused".to_string())) }
        }
    }

    struct SlowSource;

    impl DatasetSource for SlowSource {
        fn describe(&self) -> String {
            "slow".to_string()
        }

        fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, DatasetLoadError>> + Send {
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(b"[]".to_vec())
            }
        }
    }

    #[tokio::test]
    async fn test_load_static() {
        let loader = DatasetLoader::default();
        let source = StaticSource::new(r#"[{"phish_id": 1, "url": "a.example.com"}]"#);
        let (snapshot, stats) = loader.load(&source).await.unwrap();
        assert_eq!(stats.accepted, 1);
        assert!(snapshot.get("a.example.com").is_some());
    }

    #[tokio::test]
    async fn test_load_transport_error() {
        let err = DatasetLoader::default().load(&FailingSource).await.unwrap_err();
        assert!(matches!(err, DatasetLoadError::Transport(_)));
    }

    #[tokio::test]
    async fn test_load_timeout() {
        let loader = DatasetLoader::new(Duration::from_millis(20));
        let err = loader.load(&SlowSource).await.unwrap_err();
        assert_eq!(err, DatasetLoadError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_file_source_missing() {
        let source = FileSource::new("/nonexistent/phishguard/data.json");
        let err = DatasetLoader::default().load(&source).await.unwrap_err();
        assert!(matches!(err, DatasetLoadError::Transport(_)));
    }

    #[tokio::test]
    async fn test_file_source_reads() {
        let path = std::env::temp_dir().join(format!("pg-core-loader-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"phish_id": 2, "url": "file.example.com"}]"#).unwrap();
        let result = DatasetLoader::default().load(&FileSource::new(&path)).await;
        std::fs::remove_file(&path).ok();
        let (snapshot, _) = result.unwrap();
        assert!(snapshot.get("file.example.com").is_some());
    }

    #[test]
    fn test_apply_failure_without_load_publishes_seed() {
        let store = DatasetStore::new();
        let outcome = apply_load_result(&store, Err(DatasetLoadError::Parse("bad".to_string())));
        assert!(matches!(outcome, RefreshOutcome::SeedFallback(_)));
        assert_eq!(store.snapshot().origin(), SnapshotOrigin::Seed);
        assert!(store.lookup("malicious-bank-site.com").is_some());
    }

    #[test]
    fn test_apply_failure_after_load_retains() {
        let store = DatasetStore::new();
        let loaded = parse_dataset(br#"[{"phish_id": 7, "url": "known.example.com"}]"#).unwrap();
        assert!(apply_load_result(&store, Ok(loaded)).is_loaded());

        let outcome = apply_load_result(&store, Err(DatasetLoadError::Timeout(Duration::from_secs(1))));
        assert!(matches!(outcome, RefreshOutcome::RetainedPrevious(DatasetLoadError::Timeout(_))));
        assert_eq!(store.lookup("known.example.com").unwrap().id, "7");
        assert!(store.lookup("malicious-bank-site.com").is_none());
    }

    #[test]
    fn test_loader_config_defaults() {
        let config: LoaderConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.source, DEFAULT_DATASET_URL);
        assert_eq!(DatasetLoader::from_config(&config).timeout(), Duration::from_secs(5));
    }
}
