//! Canonical identifier classification.
//!
//! An identifier is canonical when it is five hyphen-separated hex groups of
//! 8-4-4-4-12 digits (any case). Everything else, including the path-derived
//! ids written by older versions, is legacy and eligible for purge.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static CANONICAL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\z")
        .expect("canonical id pattern compiles")
});

/// Classification outcome for a memory identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityClass {
    /// Matches the canonical grouped-hex form.
    Valid,
    /// Legacy or malformed identifier.
    Invalid,
}

/// Classify a single identifier.
pub fn classify(id: &str) -> IdentityClass {
    if CANONICAL_ID.is_match(id) {
        IdentityClass::Valid
    } else {
        IdentityClass::Invalid
    }
}

/// Shorthand for `classify(id) == IdentityClass::Valid`.
pub fn is_canonical(id: &str) -> bool {
    classify(id) == IdentityClass::Valid
}

/// Split identifiers into `(valid, invalid)` sets.
pub fn partition<I, S>(ids: I) -> (BTreeSet<String>, BTreeSet<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut valid = BTreeSet::new();
    let mut invalid = BTreeSet::new();
    for id in ids {
        let id = id.as_ref();
        match classify(id) {
            IdentityClass::Valid => valid.insert(id.to_string()),
            IdentityClass::Invalid => invalid.insert(id.to_string()),
        };
    }
    (valid, invalid)
}

/// Valid/invalid counts over a set of identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl IdentityReport {
    /// Tally classifications for the given identifiers.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = Self::default();
        for id in ids {
            report.total += 1;
            match classify(id.as_ref()) {
                IdentityClass::Valid => report.valid += 1,
                IdentityClass::Invalid => report.invalid += 1,
            }
        }
        report
    }
}
