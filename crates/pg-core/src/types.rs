//! Verdict types shared by the matcher, the dataset and the bindings.
//!
//! The serialized form is what collaborators (the navigation interceptor and
//! the in-page protection layer) receive, so field names are camelCase and
//! enum values lowercase.

use serde::{Deserialize, Serialize};

/// Identifier used for every record produced by pattern matching.
pub const HEURISTIC_ID: &str = "heuristic";

/// Target reported when the impersonated brand is not known.
pub const UNKNOWN_TARGET: &str = "Unknown";

// =============================================================================
// Enums
// =============================================================================

/// Provenance of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Verified {
    /// Confirmed by the dataset maintainers
    Yes,
    /// Reported but not confirmed
    No,
    /// Produced by a pattern rule, never by the dataset
    Heuristic,
}

impl Verified {
    /// Map a dataset `verified` field. Anything other than `"yes"` is `No`.
    pub fn from_dataset(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("yes") => Self::Yes,
            _ => Self::No,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Heuristic => "heuristic",
        }
    }
}

/// Whether the dataset believes the site is currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Online {
    Yes,
    No,
}

impl Online {
    /// Map a dataset `online` field. Anything other than `"yes"` is `No`.
    pub fn from_dataset(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("yes") => Self::Yes,
            _ => Self::No,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// =============================================================================
// Threat Record
// =============================================================================

/// A verdict about a hostname.
///
/// Records are immutable once they are part of a published snapshot; the
/// engine hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ThreatRecord {
    /// Dataset identifier, or `"heuristic"`
    pub id: String,
    /// Hostname the record is keyed by
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_time: Option<String>,
    pub verified: Verified,
    pub online: Online,
    /// Impersonated brand or organization
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl ThreatRecord {
    /// Synthetic record for a hostname flagged by a pattern rule.
    pub fn heuristic(hostname: &str) -> Self {
        Self {
            id: HEURISTIC_ID.to_string(),
            url: hostname.to_string(),
            detail_url: None,
            submission_time: None,
            verification_time: None,
            verified: Verified::Heuristic,
            online: Online::Yes,
            target: UNKNOWN_TARGET.to_string(),
            risk_level: Some(RiskLevel::Medium),
        }
    }

    /// Was this verdict produced by pattern matching?
    #[inline]
    pub fn is_heuristic(&self) -> bool {
        self.verified == Verified::Heuristic
    }
}
