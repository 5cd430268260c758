//! Incremental history.
//!
//! A run records, per class, a fingerprint of its compiled content and of the
//! coverage of its tests, plus the detection status of every mutation it
//! ran. The next run loads that snapshot and reuses results for classes
//! whose fingerprints did not move.

mod coverage;
mod incremental;
mod output;
mod store;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::bytecode::{ClassFile, ClassName};
use crate::core::Result;

pub use coverage::{CoverageDatabase, CoverageFingerprints, Fingerprint, NoCoverage};
pub use incremental::{Decision, IncrementalAnalyzer, IncrementalSummary};
pub use output::{FileOutput, HistoryOutput, NullOutput, SharedBuffer};
pub use store::{
    HistoricResult, HistoryDocument, HistoryStore, JsonHistoryStore, HISTORY_VERSION,
};

/// Identity of a compiled class.
///
/// `hierarchical_hash` also covers every known superclass, so a change in a
/// parent invalidates its subclasses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassIdentity {
    pub name: ClassName,
    pub content_hash: Fingerprint,
    pub hierarchical_hash: Fingerprint,
}

impl ClassIdentity {
    pub fn new(
        name: impl Into<ClassName>,
        content_hash: Fingerprint,
        hierarchical_hash: Fingerprint,
    ) -> Self {
        Self {
            name: name.into(),
            content_hash,
            hierarchical_hash,
        }
    }

    /// Identify every class in `classes`.
    ///
    /// Superclasses outside the slice do not contribute to the hierarchical
    /// hash.
    pub fn of_classes(classes: &[ClassFile]) -> Result<Vec<Self>> {
        let mut content = HashMap::with_capacity(classes.len());
        for class in classes {
            content.insert(&class.name, Fingerprint(class.content_hash()?));
        }
        let parents: HashMap<&ClassName, &ClassName> = classes
            .iter()
            .filter_map(|class| class.superclass.as_ref().map(|parent| (&class.name, parent)))
            .collect();

        Ok(classes
            .iter()
            .map(|class| {
                let own = content[&class.name];
                let mut hasher = Xxh3::new();
                hasher.update(&own.0.to_le_bytes());

                let mut seen = HashSet::from([&class.name]);
                let mut current = &class.name;
                while let Some(parent) = parents.get(current).copied() {
                    if !seen.insert(parent) {
                        break;
                    }
                    if let Some(hash) = content.get(parent) {
                        hasher.update(&hash.0.to_le_bytes());
                    }
                    current = parent;
                }

                Self::new(class.name.clone(), own, Fingerprint(hasher.digest()))
            })
            .collect())
    }
}

/// What the history remembers about one class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassHistory {
    pub id: ClassIdentity,
    /// Fingerprint of the coverage of the class's tests.
    pub coverage: Fingerprint,
}

impl ClassHistory {
    pub fn new(id: ClassIdentity, coverage: Fingerprint) -> Self {
        Self { id, coverage }
    }

    pub fn name(&self) -> &ClassName {
        &self.id.name
    }
}
