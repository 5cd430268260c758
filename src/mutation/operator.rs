//! Mutation operator trait.

use std::fmt;

use crate::bytecode::{Insn, MethodElement};

use super::rewriter::InsnSite;
use super::OperatorId;

/// Trait for mutation operators.
///
/// An operator is shown every instruction of a method in order. For each one
/// it registers zero or more candidates through the [`InsnSite`], and returns
/// the replacement elements when the context activates one of them. Returning
/// `None` keeps the original instruction.
pub trait MutationOperator: Send + Sync {
    /// Versioned global identifier (e.g. `bytemut.math.v1`).
    fn id(&self) -> &OperatorId;

    /// Short catalog name (e.g. `MATH`).
    fn name(&self) -> &str;

    /// Human-readable description of what the operator does.
    fn description(&self) -> &str;

    /// Register candidates for `insn` and produce the replacement if one is
    /// activated.
    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>>;
}

impl fmt::Debug for dyn MutationOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationOperator")
            .field("id", self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// Wrap instructions as method elements.
pub(crate) fn elements(insns: impl IntoIterator<Item = Insn>) -> Vec<MethodElement> {
    insns.into_iter().map(MethodElement::Insn).collect()
}
