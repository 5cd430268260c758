//! Per-pass mutation bookkeeping.
//!
//! A [`MutationContext`] sees every candidate an operator pass registers and
//! decides, at registration time, whether that candidate is the single
//! mutation applied in this pass. Dry scans use [`Selection::None`] and only
//! count.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use crate::core::{Error, Result};

use super::{MethodLocation, MutationDetails, MutationIdentifier};

/// Which candidate, if any, a pass should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Apply nothing; enumerate candidates only.
    None,
    /// Apply the candidate with this 1-based registration ordinal.
    Ordinal(NonZeroUsize),
}

impl Selection {
    /// Select the `ordinal`th candidate. Ordinals start at 1.
    pub fn ordinal(ordinal: usize) -> Result<Self> {
        NonZeroUsize::new(ordinal)
            .map(Self::Ordinal)
            .ok_or_else(|| Error::InvalidArgument("mutation ordinals start at 1".to_string()))
    }

    fn selects(&self, ordinal: usize) -> bool {
        match self {
            Self::None => false,
            Self::Ordinal(n) => n.get() == ordinal,
        }
    }
}

/// Outcome of registering a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// This candidate is the one to apply: emit the replacement.
    Activated(MutationIdentifier),
    /// Emit the original instruction.
    NotActivated(MutationIdentifier),
}

impl Registration {
    pub fn is_activated(&self) -> bool {
        matches!(self, Self::Activated(_))
    }

    pub fn id(&self) -> &MutationIdentifier {
        match self {
            Self::Activated(id) | Self::NotActivated(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Scanning,
    Closed,
}

/// Everything a closed context learned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Candidates in registration order.
    pub candidates: Vec<MutationDetails>,
    /// The applied candidate, when a selection was made.
    pub activated: Option<MutationDetails>,
}

/// Registration state for one method, or one class with a running ordinal
/// across its methods.
///
/// Moves `Idle -> Scanning -> Closed` and never back. Registering outside
/// `Scanning` is a framework bug and panics.
#[derive(Debug)]
pub struct MutationContext {
    selection: Selection,
    state: State,
    location: Option<MethodLocation>,
    line: Option<u32>,
    registered: HashMap<MutationIdentifier, usize>,
    candidates: Vec<MutationDetails>,
    activated: Option<usize>,
}

impl MutationContext {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            state: State::Idle,
            location: None,
            line: None,
            registered: HashMap::new(),
            candidates: Vec::new(),
            activated: None,
        }
    }

    /// A context that only counts candidates.
    pub fn dry_run() -> Self {
        Self::new(Selection::None)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Start (or move on to) a method. Ordinals keep counting.
    ///
    /// # Panics
    ///
    /// Panics if the context is closed.
    pub fn begin_method(&mut self, location: MethodLocation) {
        assert!(
            self.state != State::Closed,
            "mutation context used after close"
        );
        self.state = State::Scanning;
        self.location = Some(location);
        self.line = None;
    }

    /// Source line of the instructions that follow.
    pub fn set_line(&mut self, line: u32) {
        self.line = Some(line);
    }

    /// Forget the current line, at the start of a fresh pass over a method.
    pub fn reset_line(&mut self) {
        self.line = None;
    }

    /// The method currently being scanned.
    ///
    /// # Panics
    ///
    /// Panics unless the context is scanning.
    pub fn location(&self) -> &MethodLocation {
        match (&self.state, &self.location) {
            (State::Scanning, Some(location)) => location,
            _ => panic!("mutation context is not scanning a method"),
        }
    }

    /// Register a candidate and learn whether it is the one to apply.
    ///
    /// The first registration of an identifier assigns its ordinal; later
    /// registrations of the same identifier return the original decision.
    ///
    /// # Panics
    ///
    /// Panics unless the context is scanning.
    pub fn register(&mut self, id: MutationIdentifier) -> Registration {
        assert!(
            self.state == State::Scanning,
            "candidate registered while mutation context is {:?}",
            self.state
        );

        let ordinal = match self.registered.get(&id) {
            Some(&ordinal) => ordinal,
            None => {
                let ordinal = self.candidates.len() + 1;
                self.registered.insert(id.clone(), ordinal);
                self.candidates
                    .push(MutationDetails::new(id.clone(), ordinal, self.line));
                if self.selection.selects(ordinal) {
                    self.activated = Some(ordinal - 1);
                }
                ordinal
            }
        };

        if self.selection.selects(ordinal) {
            Registration::Activated(id)
        } else {
            Registration::NotActivated(id)
        }
    }

    /// Whether a previously registered identifier is the applied one.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never registered.
    pub fn was_activated(&self, id: &MutationIdentifier) -> bool {
        let ordinal = self
            .registered
            .get(id)
            .unwrap_or_else(|| panic!("mutation {id} was never registered"));
        self.selection.selects(*ordinal)
    }

    /// The applied candidate so far, if any.
    pub fn activated(&self) -> Option<&MutationDetails> {
        self.activated.map(|index| &self.candidates[index])
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Finish the pass.
    ///
    /// Fails when an ordinal was selected that no candidate reached.
    ///
    /// # Panics
    ///
    /// Panics if the context is already closed.
    pub fn close(&mut self) -> Result<ScanReport> {
        assert!(self.state != State::Closed, "mutation context closed twice");
        self.state = State::Closed;

        if let Selection::Ordinal(ordinal) = self.selection {
            if ordinal.get() > self.candidates.len() {
                return Err(Error::SelectionOutOfRange {
                    ordinal: ordinal.get(),
                    candidates: self.candidates.len(),
                });
            }
        }

        let activated = self.activated.map(|index| self.candidates[index].clone());
        Ok(ScanReport {
            candidates: std::mem::take(&mut self.candidates),
            activated,
        })
    }
}
