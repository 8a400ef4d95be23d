use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use pg_core::dataset::{parse_dataset, DatasetSnapshot, LoadStats, LoaderConfig};
use pg_core::{Online, Verified};

pub fn read_dataset(path: &Path) -> Result<(DatasetSnapshot, LoadStats, usize), String> {
    let bytes = fs::read(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let (snapshot, stats) = parse_dataset(&bytes)
        .map_err(|e| format!("Invalid dataset '{}': {}", path.display(), e))?;
    Ok((snapshot, stats, bytes.len()))
}

pub fn read_config(path: &Path) -> Result<LoaderConfig, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("Invalid config '{}': {}", path.display(), e))
}

/// Per-field breakdown of a snapshot.
#[derive(Debug, Default)]
pub struct DatasetSummary {
    pub entries: usize,
    pub verified: usize,
    pub unverified: usize,
    pub online: usize,
    pub by_target: BTreeMap<String, usize>,
}

impl DatasetSummary {
    pub fn from_snapshot(snapshot: &DatasetSnapshot) -> Self {
        let mut summary = Self {
            entries: snapshot.len(),
            ..Self::default()
        };
        for record in snapshot.records() {
            match record.verified {
                Verified::Yes => summary.verified += 1,
                Verified::No | Verified::Heuristic => summary.unverified += 1,
            }
            if record.online == Online::Yes {
                summary.online += 1;
            }
            *summary.by_target.entry(record.target.clone()).or_insert(0) += 1;
        }
        summary
    }

    /// Targets by descending count, ties by name.
    pub fn top_targets(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut targets: Vec<(&str, usize)> = self
            .by_target
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        targets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        targets.truncate(limit);
        targets
    }
}
