//! Coverage fingerprints.
//!
//! The engine never measures coverage itself. It only needs one value per
//! class that changes whenever the tests covering that class change.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use xxhash_rust::xxh3::Xxh3;

use crate::bytecode::ClassName;
use crate::core::{Error, Result};

/// A 64-bit content hash, written as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Hash a byte string with xxh3.
    pub fn of(bytes: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_64(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| Error::malformed_history(format!("bad fingerprint {s:?}: {e}")))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of per-class coverage fingerprints.
pub trait CoverageDatabase {
    /// Fingerprint of the coverage of `class`. Uncovered classes return
    /// `Fingerprint(0)`.
    fn coverage_id(&self, class: &ClassName) -> Fingerprint;
}

/// Coverage as a map of class -> covered block -> covering tests.
///
/// Blocks are opaque keys chosen by whoever measured coverage (for example
/// `"add(II)I#0"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageFingerprints {
    classes: BTreeMap<ClassName, BTreeMap<String, BTreeSet<String>>>,
}

impl CoverageFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `test` executes `block` of `class`.
    pub fn record(
        &mut self,
        class: impl Into<ClassName>,
        block: impl Into<String>,
        test: impl Into<String>,
    ) {
        self.classes
            .entry(class.into())
            .or_default()
            .entry(block.into())
            .or_default()
            .insert(test.into());
    }

    /// Tests that cover any block of `class`.
    pub fn covering_tests(&self, class: &ClassName) -> BTreeSet<&str> {
        self.classes
            .get(class)
            .into_iter()
            .flat_map(|blocks| blocks.values())
            .flat_map(|tests| tests.iter().map(String::as_str))
            .collect()
    }

    pub fn is_covered(&self, class: &ClassName) -> bool {
        self.classes.contains_key(class)
    }

    /// Load coverage from its JSON encoding.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl CoverageDatabase for CoverageFingerprints {
    fn coverage_id(&self, class: &ClassName) -> Fingerprint {
        let Some(blocks) = self.classes.get(class) else {
            return Fingerprint::default();
        };

        // BTree ordering makes the byte stream independent of insertion order.
        let mut hasher = Xxh3::new();
        for (block, tests) in blocks {
            hasher.update(block.as_bytes());
            hasher.update(&[0]);
            for test in tests {
                hasher.update(test.as_bytes());
                hasher.update(&[1]);
            }
            hasher.update(&[2]);
        }
        Fingerprint(hasher.digest())
    }
}

/// Coverage that knows nothing: every class fingerprints as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCoverage;

impl CoverageDatabase for NoCoverage {
    fn coverage_id(&self, _class: &ClassName) -> Fingerprint {
        Fingerprint::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ClassName {
        ClassName::new(s)
    }

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let fp = Fingerprint(0xab);
        assert_eq!(fp.to_string(), "00000000000000ab");
        assert_eq!("00000000000000ab".parse::<Fingerprint>().unwrap(), fp);
        assert!("xyz".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn test_fingerprint_serializes_as_string() {
        let json = serde_json::to_string(&Fingerprint(10)).unwrap();
        assert_eq!(json, "\"000000000000000a\"");
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Fingerprint(10));
    }

    #[test]
    fn test_uncovered_class_is_zero() {
        let coverage = CoverageFingerprints::new();
        assert_eq!(coverage.coverage_id(&name("a/B")), Fingerprint(0));
        assert!(!coverage.is_covered(&name("a/B")));
    }

    #[test]
    fn test_coverage_id_ignores_insertion_order() {
        let mut a = CoverageFingerprints::new();
        a.record("a/B", "add#0", "t1");
        a.record("a/B", "add#0", "t2");
        a.record("a/B", "sub#0", "t1");

        let mut b = CoverageFingerprints::new();
        b.record("a/B", "sub#0", "t1");
        b.record("a/B", "add#0", "t2");
        b.record("a/B", "add#0", "t1");

        assert_eq!(a.coverage_id(&name("a/B")), b.coverage_id(&name("a/B")));
    }

    #[test]
    fn test_coverage_id_changes_with_tests() {
        let mut a = CoverageFingerprints::new();
        a.record("a/B", "add#0", "t1");
        let before = a.coverage_id(&name("a/B"));
        a.record("a/B", "add#0", "t2");
        assert_ne!(before, a.coverage_id(&name("a/B")));
    }

    #[test]
    fn test_block_and_test_names_do_not_run_together() {
        let mut a = CoverageFingerprints::new();
        a.record("a/B", "ab", "c");
        let mut b = CoverageFingerprints::new();
        b.record("a/B", "a", "bc");
        assert_ne!(a.coverage_id(&name("a/B")), b.coverage_id(&name("a/B")));
    }

    #[test]
    fn test_covering_tests() {
        let mut coverage = CoverageFingerprints::new();
        coverage.record("a/B", "add#0", "t1");
        coverage.record("a/B", "sub#0", "t2");
        coverage.record("a/B", "sub#0", "t1");
        let tests: Vec<&str> = coverage.covering_tests(&name("a/B")).into_iter().collect();
        assert_eq!(tests, vec!["t1", "t2"]);
    }

    #[test]
    fn test_no_coverage() {
        assert_eq!(NoCoverage.coverage_id(&name("x")), Fingerprint(0));
    }
}
