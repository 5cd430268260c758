//! Incremental analysis: decide which candidates can reuse a stored result.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::bytecode::ClassName;
use crate::mutation::{
    MutationDetails, MutationIdentifier, MutationResult, MutationStatusTestPair, OperatorId,
};

use super::{ClassHistory, HistoryStore};

/// What to do with one candidate mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The stored result still holds.
    Reuse(MutationResult),
    /// The mutant has to be run.
    Run(MutationDetails),
}

impl Decision {
    pub fn details(&self) -> &MutationDetails {
        match self {
            Self::Reuse(result) => &result.details,
            Self::Run(details) => details,
        }
    }

    pub fn is_reuse(&self) -> bool {
        matches!(self, Self::Reuse(_))
    }
}

/// Counts from one [`IncrementalAnalyzer::analyze`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncrementalSummary {
    pub reused: usize,
    pub to_run: usize,
    /// Classes that are new or whose fingerprints moved.
    pub changed_classes: usize,
}

/// Compares the current run against the historic snapshot of a store.
///
/// A stored result is reused only when its class history is exactly equal to
/// the historic one, the operator set is exactly the historic one, and the
/// stored status is one a rerun would reproduce.
pub struct IncrementalAnalyzer<'a> {
    historic_classes: &'a HashMap<ClassName, ClassHistory>,
    historic_results: &'a HashMap<MutationIdentifier, MutationStatusTestPair>,
    operators_unchanged: bool,
}

impl<'a> IncrementalAnalyzer<'a> {
    /// Analyzer for a run using `operators`.
    pub fn new<S: HistoryStore + ?Sized>(store: &'a S, operators: &[OperatorId]) -> Self {
        let mut current = operators.to_vec();
        current.sort();
        current.dedup();
        let operators_unchanged = current.as_slice() == store.historic_operators();
        if !operators_unchanged {
            debug!("Operator set changed since the last run; no results will be reused");
        }

        Self {
            historic_classes: store.historic_class_path(),
            historic_results: store.historic_results(),
            operators_unchanged,
        }
    }

    pub fn operators_unchanged(&self) -> bool {
        self.operators_unchanged
    }

    /// Whether `current` matches the historic entry for the same class.
    pub fn is_unchanged(&self, current: &ClassHistory) -> bool {
        self.historic_classes.get(current.name()) == Some(current)
    }

    /// Decide, in candidate order, what to do with each candidate.
    pub fn analyze(
        &self,
        classes: &[ClassHistory],
        candidates: &[MutationDetails],
    ) -> (Vec<Decision>, IncrementalSummary) {
        let unchanged: HashMap<&ClassName, bool> = classes
            .iter()
            .map(|class| (class.name(), self.is_unchanged(class)))
            .collect();

        let mut summary = IncrementalSummary {
            changed_classes: unchanged.values().filter(|same| !**same).count(),
            ..IncrementalSummary::default()
        };

        let decisions: Vec<Decision> = candidates
            .iter()
            .map(|details| {
                let class_unchanged = unchanged.get(details.id.class()).copied().unwrap_or(false);
                let stored = self
                    .historic_results
                    .get(&details.id)
                    .filter(|status| status.status.is_reusable());

                match stored {
                    Some(status) if class_unchanged && self.operators_unchanged => {
                        summary.reused += 1;
                        Decision::Reuse(MutationResult::new(details.clone(), status.clone()))
                    }
                    _ => {
                        summary.to_run += 1;
                        Decision::Run(details.clone())
                    }
                }
            })
            .collect();

        info!(
            "Incremental analysis: {} reused, {} to run, {} changed classes",
            summary.reused, summary.to_run, summary.changed_classes
        );
        (decisions, summary)
    }
}
