//! Copy-on-write dataset snapshots
//!
//! A snapshot is built wholesale and never mutated after it is published.
//! The store holds the single shared pointer to the active snapshot; readers
//! load it without locking and keep whatever snapshot they loaded even if a
//! refresh swaps in a new one mid-lookup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::types::ThreatRecord;
use crate::url::walk_host_suffixes;

// =============================================================================
// Snapshot
// =============================================================================

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotOrigin {
    /// Process start, nothing loaded yet
    Empty,
    /// Built-in fallback after a failed first load
    Seed,
    /// Product of a successful load
    Loaded,
}

impl SnapshotOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Seed => "seed",
            Self::Loaded => "loaded",
        }
    }
}

/// How a lookup matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// Hostname is a key
    Exact,
    /// Hostname is a subdomain of this key
    Suffix(String),
}

/// Immutable hostname -> record mapping.
#[derive(Debug)]
pub struct DatasetSnapshot {
    records: HashMap<String, ThreatRecord>,
    origin: SnapshotOrigin,
}

impl DatasetSnapshot {
    pub fn new(records: HashMap<String, ThreatRecord>, origin: SnapshotOrigin) -> Self {
        Self { records, origin }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new(), SnapshotOrigin::Empty)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    /// Exact key lookup only.
    #[inline]
    pub fn get(&self, host: &str) -> Option<&ThreatRecord> {
        self.records.get(host)
    }

    pub fn records(&self) -> impl Iterator<Item = &ThreatRecord> {
        self.records.values()
    }

    /// Exact match, then the most specific parent domain present.
    pub fn lookup(&self, hostname: &str) -> Option<&ThreatRecord> {
        self.lookup_with_kind(hostname).map(|(record, _)| record)
    }

    /// Like [`lookup`](Self::lookup) but also reports which key matched.
    ///
    /// Suffixes are visited longest first, so the first hit is the longest
    /// matching key. Two distinct keys that are both suffixes of one hostname
    /// always differ in length, so no further tie-break is needed.
    pub fn lookup_with_kind(&self, hostname: &str) -> Option<(&ThreatRecord, MatchKind)> {
        if let Some(record) = self.records.get(hostname) {
            return Some((record, MatchKind::Exact));
        }

        walk_host_suffixes(hostname)
            .skip(1)
            .find_map(|suffix| {
                self.records
                    .get(suffix)
                    .map(|record| (record, MatchKind::Suffix(suffix.to_string())))
            })
    }
}

impl Default for DatasetSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Store
// =============================================================================

/// Holder of the active snapshot.
pub struct DatasetStore {
    active: ArcSwap<DatasetSnapshot>,
    /// Bumped on every publish
    generation: AtomicU64,
}

impl DatasetStore {
    /// Start with the empty snapshot.
    pub fn new() -> Self {
        Self::with_snapshot(DatasetSnapshot::empty())
    }

    pub fn with_snapshot(snapshot: DatasetSnapshot) -> Self {
        Self {
            active: ArcSwap::from_pointee(snapshot),
            generation: AtomicU64::new(0),
        }
    }

    /// The currently active snapshot.
    #[inline]
    pub fn snapshot(&self) -> Arc<DatasetSnapshot> {
        self.active.load_full()
    }

    #[inline(always)]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Look up against the active snapshot.
    pub fn lookup(&self, hostname: &str) -> Option<ThreatRecord> {
        let snapshot = self.active.load();
        snapshot.lookup(hostname).cloned()
    }

    pub fn lookup_with_kind(&self, hostname: &str) -> Option<(ThreatRecord, MatchKind)> {
        let snapshot = self.active.load();
        snapshot
            .lookup_with_kind(hostname)
            .map(|(record, kind)| (record.clone(), kind))
    }

    /// Atomically replace the active snapshot.
    pub fn publish(&self, snapshot: DatasetSnapshot) -> u64 {
        self.active.store(Arc::new(snapshot));
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Publish `fallback` unless the active snapshot came from a successful
    /// load. Returns whether it was published.
    ///
    /// The check and the swap happen in one RCU step, so a load that lands
    /// concurrently is never replaced by the fallback.
    pub fn publish_fallback(&self, fallback: DatasetSnapshot) -> bool {
        let fallback = Arc::new(fallback);
        let previous = self.active.rcu(|current| {
            if current.origin() == SnapshotOrigin::Loaded {
                Arc::clone(current)
            } else {
                Arc::clone(&fallback)
            }
        });

        let published = previous.origin() != SnapshotOrigin::Loaded;
        if published {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        published
    }

    /// Has any successful load been published?
    pub fn has_loaded(&self) -> bool {
        self.active.load().origin() == SnapshotOrigin::Loaded
    }
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::format::{parse_dataset, seed_snapshot};

    fn snapshot(json: &str) -> DatasetSnapshot {
        parse_dataset(json.as_bytes()).unwrap().0
    }

    #[test]
    fn test_exact_match() {
        let snap = snapshot(r#"[{"phish_id": 1, "url": "malicious-bank-site.com"}]"#);
        let (record, kind) = snap.lookup_with_kind("malicious-bank-site.com").unwrap();
        assert_eq!(record.id, "1");
        assert_eq!(kind, MatchKind::Exact);
    }

    #[test]
    fn test_suffix_match() {
        let snap = snapshot(r#"[{"phish_id": 1, "url": "malicious-bank-site.com"}]"#);
        let (record, kind) = snap.lookup_with_kind("accounts.malicious-bank-site.com").unwrap();
        assert_eq!(record.id, "1");
        assert_eq!(kind, MatchKind::Suffix("malicious-bank-site.com".to_string()));
        assert!(snap.lookup("a.b.c.malicious-bank-site.com").is_some());
    }

    #[test]
    fn test_suffix_requires_label_boundary() {
        let snap = snapshot(r#"[{"phish_id": 1, "url": "bank-site.com"}]"#);
        assert!(snap.lookup("malicious-bank-site.com").is_none());
        assert!(snap.lookup("xbank-site.com").is_none());
        assert!(snap.lookup("site.com").is_none());
    }

    #[test]
    fn test_longest_suffix_wins() {
        let snap = snapshot(
            r#"[
                {"phish_id": "short", "url": "example.com"},
                {"phish_id": "long", "url": "evil.example.com"}
            ]"#,
        );
        assert_eq!(snap.lookup("login.evil.example.com").unwrap().id, "long");
        assert_eq!(snap.lookup("other.example.com").unwrap().id, "short");

        // Insertion order does not matter.
        let reversed = snapshot(
            r#"[
                {"phish_id": "long", "url": "evil.example.com"},
                {"phish_id": "short", "url": "example.com"}
            ]"#,
        );
        assert_eq!(reversed.lookup("login.evil.example.com").unwrap().id, "long");
    }

    #[test]
    fn test_exact_beats_suffix() {
        let snap = snapshot(
            r#"[
                {"phish_id": "parent", "url": "example.com"},
                {"phish_id": "child", "url": "www.example.com"}
            ]"#,
        );
        assert_eq!(snap.lookup("www.example.com").unwrap().id, "child");
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = DatasetSnapshot::empty();
        assert_eq!(snap.origin(), SnapshotOrigin::Empty);
        assert!(snap.lookup("example.com").is_none());
        assert!(snap.lookup("").is_none());
    }

    #[test]
    fn test_store_publish() {
        let store = DatasetStore::new();
        assert_eq!(store.generation(), 0);
        assert!(!store.has_loaded());
        assert!(store.lookup("malicious-bank-site.com").is_none());

        let generation = store.publish(snapshot(r#"[{"phish_id": 9, "url": "malicious-bank-site.com"}]"#));
        assert_eq!(generation, 1);
        assert!(store.has_loaded());
        assert_eq!(store.lookup("malicious-bank-site.com").unwrap().id, "9");
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = DatasetStore::new();
        store.publish(snapshot(r#"[{"phish_id": 1, "url": "gone.example.com"}]"#));

        let held = store.snapshot();
        store.publish(snapshot("[]"));

        assert!(held.lookup("gone.example.com").is_some());
        assert!(store.lookup("gone.example.com").is_none());
    }

    #[test]
    fn test_fallback_only_before_first_load() {
        let store = DatasetStore::new();
        assert!(store.publish_fallback(seed_snapshot()));
        assert_eq!(store.snapshot().origin(), SnapshotOrigin::Seed);

        // A seed may replace a seed.
        assert!(store.publish_fallback(seed_snapshot()));
        assert_eq!(store.generation(), 2);

        store.publish(snapshot(r#"[{"phish_id": 1, "url": "kept.example.com"}]"#));
        assert!(!store.publish_fallback(seed_snapshot()));
        assert_eq!(store.generation(), 3);
        assert_eq!(store.snapshot().origin(), SnapshotOrigin::Loaded);
        assert!(store.lookup("kept.example.com").is_some());
        assert!(store.lookup("malicious-bank-site.com").is_none());
    }

    #[test]
    fn test_concurrent_lookups_during_publish() {
        let store = DatasetStore::new();
        store.publish(snapshot(
            r#"[
                {"phish_id": "x", "url": "x.example.com", "target": "Original"},
                {"phish_id": "y", "url": "y.example.com"}
            ]"#,
        ));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..2_000 {
                        // Either the complete old record or nothing.
                        if let Some(record) = store.lookup("x.example.com") {
                            assert_eq!(record.id, "x");
                            assert_eq!(record.target, "Original");
                        }
                        assert!(store.lookup("y.example.com").is_some());
                    }
                });
            }

            scope.spawn(|| {
                for _ in 0..50 {
                    store.publish(snapshot(r#"[{"phish_id": "y", "url": "y.example.com"}]"#));
                }
            });
        });

        assert!(store.lookup("x.example.com").is_none());
        assert!(store.lookup("y.example.com").is_some());
    }
}
