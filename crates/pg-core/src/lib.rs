//! PhishGuard Core Library
//!
//! This crate provides the classification engine that decides, before a page
//! loads, whether a URL points at a known or suspected phishing host.
//!
//! # Architecture
//!
//! Classification is layered. A fixed, ordered set of heuristic hostname
//! rules runs first and short-circuits; otherwise the hostname is looked up
//! (exactly, then by parent domain) in an immutable dataset snapshot. The
//! snapshot is replaced wholesale on refresh through a lock-free pointer
//! swap, so lookups never wait on a refresh and never see a partial dataset.
//!
//! # Modules
//!
//! - `types`: Verdict types (`ThreatRecord`)
//! - `url`: Hostname extraction and suffix walking
//! - `heuristics`: Ordered hostname pattern rules
//! - `dataset`: Feed format, snapshot store and refresh path
//! - `engine`: The `ClassificationEngine` entry point
//!
//! # Example
//!
//! ```
//! use pg_core::ClassificationEngine;
//!
//! let engine = ClassificationEngine::new();
//! engine.refresh_from_bytes(br#"[{"phish_id": 1, "url": "malicious-bank-site.com"}]"#);
//!
//! assert!(engine.check_url("https://accounts.malicious-bank-site.com/").is_some());
//! assert!(engine.check_url("https://example.com/").is_none());
//! assert!(engine.check_url("not a url").is_none());
//! ```

pub mod dataset;
pub mod engine;
pub mod heuristics;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use dataset::{DatasetLoadError, DatasetLoader, DatasetSnapshot, DatasetStore, RefreshOutcome};
pub use engine::{Classification, ClassificationEngine};
pub use heuristics::{HeuristicMatcher, HeuristicRule};
pub use types::{Online, RiskLevel, ThreatRecord, Verified};
pub use crate::url::{extract_hostname, InvalidUrlError};
