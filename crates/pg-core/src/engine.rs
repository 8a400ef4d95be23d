//! Classification Engine
//!
//! This is the hot path - every top-level navigation goes through here.
//! Lookups never block and never fail: anything that goes wrong resolves
//! to "no threat detected" so a broken classifier cannot block browsing.

use std::sync::Arc;

use crate::dataset::{
    apply_load_result, DatasetLoadError, DatasetLoader, DatasetSnapshot, DatasetStore, LoadStats,
    MatchKind, RefreshOutcome,
};
#[cfg(feature = "async")]
use crate::dataset::DatasetSource;
use crate::heuristics::{HeuristicMatcher, HeuristicRule};
use crate::types::ThreatRecord;
use crate::url::{extract_hostname, InvalidUrlError};

// =============================================================================
// Classification
// =============================================================================

/// Detailed result of classifying a URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A pattern rule fired
    Heuristic {
        rule: HeuristicRule,
        record: ThreatRecord,
    },
    /// The dataset knows the host or one of its parents
    Dataset {
        matched: MatchKind,
        record: ThreatRecord,
    },
    /// Nothing matched
    Clean { hostname: String },
    /// No hostname could be extracted
    InvalidUrl(InvalidUrlError),
}

impl Classification {
    /// The verdict, if any.
    pub fn threat(&self) -> Option<&ThreatRecord> {
        match self {
            Self::Heuristic { record, .. } | Self::Dataset { record, .. } => Some(record),
            Self::Clean { .. } | Self::InvalidUrl(_) => None,
        }
    }

    pub fn into_threat(self) -> Option<ThreatRecord> {
        match self {
            Self::Heuristic { record, .. } | Self::Dataset { record, .. } => Some(record),
            Self::Clean { .. } | Self::InvalidUrl(_) => None,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The layered URL classifier.
///
/// One instance is constructed per process and shared by reference (or
/// `Arc`) with every caller; it is `Send + Sync`.
pub struct ClassificationEngine {
    heuristics: HeuristicMatcher,
    store: DatasetStore,
    loader: DatasetLoader,
}

impl ClassificationEngine {
    /// Engine with the empty snapshot and the default loader.
    pub fn new() -> Self {
        Self::with_loader(DatasetLoader::default())
    }

    pub fn with_loader(loader: DatasetLoader) -> Self {
        Self {
            heuristics: HeuristicMatcher::new(),
            store: DatasetStore::new(),
            loader,
        }
    }

    /// Engine that starts from an existing snapshot.
    pub fn with_snapshot(snapshot: DatasetSnapshot) -> Self {
        Self {
            heuristics: HeuristicMatcher::new(),
            store: DatasetStore::with_snapshot(snapshot),
            loader: DatasetLoader::default(),
        }
    }

    /// Classify a URL. Returns the verdict, or `None` when no threat is
    /// detected or the URL has no hostname.
    pub fn check_url(&self, url: &str) -> Option<ThreatRecord> {
        self.classify_url(url).into_threat()
    }

    /// Classify a hostname that has already been extracted and lowercased.
    pub fn check_hostname(&self, hostname: &str) -> Option<ThreatRecord> {
        self.classify_hostname(hostname).into_threat()
    }

    pub fn classify_url(&self, url: &str) -> Classification {
        match extract_hostname(url) {
            Ok(hostname) => self.classify_hostname(&hostname),
            Err(e) => {
                log::debug!("URL check skipped for {:?}: {}", url, e);
                Classification::InvalidUrl(e)
            }
        }
    }

    /// Heuristics first, then the dataset.
    pub fn classify_hostname(&self, hostname: &str) -> Classification {
        if let Some((rule, record)) = self.heuristics.match_host_with_rule(hostname) {
            return Classification::Heuristic { rule, record };
        }

        match self.store.lookup_with_kind(hostname) {
            Some((record, matched)) => Classification::Dataset { matched, record },
            None => Classification::Clean {
                hostname: hostname.to_string(),
            },
        }
    }

    /// The currently active snapshot.
    pub fn snapshot(&self) -> Arc<DatasetSnapshot> {
        self.store.snapshot()
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    /// Fetch `source` and publish the result, or fall back.
    #[cfg(feature = "async")]
    pub async fn refresh<S: DatasetSource>(&self, source: &S) -> RefreshOutcome {
        log::debug!("Refreshing phishing dataset from {}", source.describe());
        let result = self.loader.load(source).await;
        self.apply_load_result(result)
    }

    /// Publish a payload the host already fetched.
    pub fn refresh_from_bytes(&self, bytes: &[u8]) -> RefreshOutcome {
        self.apply_load_result(self.loader.parse(bytes))
    }

    /// Apply a load attempt made elsewhere (e.g. a host-side fetch that failed).
    pub fn apply_load_result(
        &self,
        result: Result<(DatasetSnapshot, LoadStats), DatasetLoadError>,
    ) -> RefreshOutcome {
        apply_load_result(&self.store, result)
    }
}

impl Default for ClassificationEngine {
    fn default() -> Self {
        Self::new()
    }
}
