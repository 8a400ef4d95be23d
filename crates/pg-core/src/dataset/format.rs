//! Dataset wire format
//!
//! The feed is a JSON array of PhishTank-style records. Records are mapped
//! one at a time so that a single malformed entry never rejects the feed.

use std::collections::HashMap;

use serde_json::Value;

use super::loader::DatasetLoadError;
use super::store::{DatasetSnapshot, SnapshotOrigin};
use crate::types::{Online, ThreatRecord, Verified, UNKNOWN_TARGET};
use crate::url::normalize_dataset_host;

/// Maintained phishing feed used when no source is configured.
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/Chary149/PhishingData/92290c/data.json";

// =============================================================================
// Raw Records
// =============================================================================

/// `phish_id` is numeric in some feeds and textual in others.
#[derive(Debug, Clone, PartialEq)]
pub enum RawId {
    Number(serde_json::Number),
    Text(String),
}

impl RawId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

/// One feed entry as it appears on the wire. Unknown fields are ignored.
///
/// Only `url` decides whether an entry is usable. Any other field with an
/// unexpected JSON type reads as absent.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub phish_id: Option<RawId>,
    pub url: String,
    pub phish_detail_url: Option<String>,
    pub submission_time: Option<String>,
    pub verified: Option<String>,
    pub verification_time: Option<String>,
    pub online: Option<String>,
    pub target: Option<String>,
}

impl RawRecord {
    /// Read an entry. Returns `None` unless it is an object with a string `url`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            url: text("url")?,
            phish_id: object.get("phish_id").and_then(RawId::from_value),
            phish_detail_url: text("phish_detail_url"),
            submission_time: text("submission_time"),
            verified: text("verified"),
            verification_time: text("verification_time"),
            online: text("online"),
            target: text("target"),
        })
    }

    /// Map onto a `ThreatRecord`. Returns `None` if the `url` holds no host.
    pub fn into_record(self) -> Option<ThreatRecord> {
        let url = normalize_dataset_host(&self.url)?;
        let id = self.phish_id.map(RawId::into_string).unwrap_or_else(|| url.clone());
        let target = self
            .target
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TARGET.to_string());

        Some(ThreatRecord {
            id,
            verified: Verified::from_dataset(self.verified.as_deref()),
            online: Online::from_dataset(self.online.as_deref()),
            url,
            detail_url: non_empty(self.phish_detail_url),
            submission_time: non_empty(self.submission_time),
            verification_time: non_empty(self.verification_time),
            target,
            risk_level: None,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Snapshot Building
// =============================================================================

/// Counters for a single load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Entries in the payload
    pub total: usize,
    /// Entries that became records
    pub accepted: usize,
    /// Entries dropped for a missing `url` or a malformed shape
    pub dropped: usize,
    /// Accepted entries that replaced an earlier entry with the same key
    pub overwritten: usize,
}

impl LoadStats {
    /// Distinct hosts in the resulting snapshot.
    pub fn entries(&self) -> usize {
        self.accepted - self.overwritten
    }
}

/// Parse a JSON payload into a new snapshot.
pub fn parse_dataset(bytes: &[u8]) -> Result<(DatasetSnapshot, LoadStats), DatasetLoadError> {
    let values: Vec<Value> = serde_json::from_slice(bytes)?;
    Ok(build_snapshot(values))
}

/// Build a snapshot from raw JSON entries, last write wins on duplicate keys.
pub fn build_snapshot(values: Vec<Value>) -> (DatasetSnapshot, LoadStats) {
    let mut stats = LoadStats {
        total: values.len(),
        ..LoadStats::default()
    };
    let mut records: HashMap<String, ThreatRecord> = HashMap::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        let record = match RawRecord::from_value(value).and_then(RawRecord::into_record) {
            Some(record) => record,
            None => {
                log::debug!("Dropping dataset entry {}: no usable url", index);
                stats.dropped += 1;
                continue;
            }
        };

        stats.accepted += 1;
        if records.insert(record.url.clone(), record).is_some() {
            stats.overwritten += 1;
        }
    }

    (DatasetSnapshot::new(records, SnapshotOrigin::Loaded), stats)
}

// =============================================================================
// Seed Dataset
// =============================================================================

/// Built-in record published when the first load fails.
pub fn seed_record() -> ThreatRecord {
    ThreatRecord {
        id: "1".to_string(),
        url: "malicious-bank-site.com".to_string(),
        detail_url: Some("http://openphish.com/phish_detail.html?id=1".to_string()),
        submission_time: Some("2024-01-01T10:00:00Z".to_string()),
        verification_time: Some("2024-01-01T11:00:00Z".to_string()),
        verified: Verified::Yes,
        online: Online::Yes,
        target: "Banking".to_string(),
        risk_level: None,
    }
}

/// Snapshot containing only the seed record.
pub fn seed_snapshot() -> DatasetSnapshot {
    let record = seed_record();
    let mut records = HashMap::with_capacity(1);
    records.insert(record.url.clone(), record);
    DatasetSnapshot::new(records, SnapshotOrigin::Seed)
}
