//! Mutation identity.
//!
//! A [`MutationIdentifier`] names one candidate mutation. It is rebuilt from
//! scratch on every pass over a method, so it must depend only on the bytecode
//! and the operator, never on pass-local state such as the target ordinal.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::bytecode::ClassName;

/// Globally unique, versioned operator identifier (e.g. `bytemut.math.v1`).
///
/// Persisted in history documents, so renaming one invalidates stored results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(Cow<'static, str>);

impl OperatorId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The method that owns a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodLocation {
    pub class: ClassName,
    pub method: String,
    pub descriptor: String,
}

impl MethodLocation {
    pub fn new(
        class: impl Into<ClassName>,
        method: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for MethodLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}{}", self.class, self.method, self.descriptor)
    }
}

/// Identity of one candidate mutation.
///
/// Equality, ordering and hashing use the location, operator, instruction
/// index and alternative only. The description is carried for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationIdentifier {
    pub location: MethodLocation,
    pub operator: OperatorId,
    /// Index of the mutated instruction within the method (labels, frames and
    /// line numbers are not counted).
    pub instruction: usize,
    /// Which of the operator's rules for this instruction produced the mutation.
    #[serde(default)]
    pub alternative: usize,
    pub description: String,
}

impl MutationIdentifier {
    pub fn new(
        location: MethodLocation,
        operator: OperatorId,
        instruction: usize,
        alternative: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            location,
            operator,
            instruction,
            alternative,
            description: description.into(),
        }
    }

    pub fn class(&self) -> &ClassName {
        &self.location.class
    }

    fn key(&self) -> (&MethodLocation, &OperatorId, usize, usize) {
        (
            &self.location,
            &self.operator,
            self.instruction,
            self.alternative,
        )
    }
}

impl PartialEq for MutationIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MutationIdentifier {}

impl Hash for MutationIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for MutationIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MutationIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for MutationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @{}.{} [{}]",
            self.location, self.instruction, self.alternative, self.operator
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn location() -> MethodLocation {
        MethodLocation::new("a/Calc", "add", "(II)I")
    }

    #[test]
    fn test_equality_ignores_description() {
        let op = OperatorId::from_static("bytemut.math.v1");
        let a = MutationIdentifier::new(location(), op.clone(), 3, 0, "first");
        let b = MutationIdentifier::new(location(), op, 3, 0, "second");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_distinct_alternatives_are_distinct() {
        let op = OperatorId::from_static("bytemut.math.v1");
        let a = MutationIdentifier::new(location(), op.clone(), 3, 0, "x");
        let b = MutationIdentifier::new(location(), op, 3, 1, "x");
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_ordering_by_operator_then_instruction() {
        let a = MutationIdentifier::new(location(), OperatorId::new("a.v1"), 9, 0, "");
        let b = MutationIdentifier::new(location(), OperatorId::new("b.v1"), 1, 0, "");
        assert!(a < b);
    }

    #[test]
    fn test_operator_id_serialization() {
        let id = OperatorId::from_static("bytemut.ror.1.v1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bytemut.ror.1.v1\"");
        let back: OperatorId = serde_json::from_str("\"bytemut.ror.1.v1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_display() {
        let id = MutationIdentifier::new(location(), OperatorId::new("x.v1"), 2, 1, "d");
        assert_eq!(id.to_string(), "a/Calc::add(II)I @2.1 [x.v1]");
    }
}
