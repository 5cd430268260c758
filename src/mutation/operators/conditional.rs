//! REMOVE_CONDITIONALS: replace a conditional jump with a fixed outcome.

use crate::bytecode::Opcode;
use crate::mutation::table::{Replacement, SubstitutionTable, TableOperator};

use super::relational::jump_pops;
use super::versioned_id;

/// Which conditionals a REMOVE_CONDITIONALS variant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalKind {
    /// `==`, `!=`, reference and null checks.
    Equality,
    /// `<`, `>=`, `>` and `<=`.
    Order,
}

impl ConditionalKind {
    fn opcodes(self) -> &'static [Opcode] {
        match self {
            Self::Equality => &[
                Opcode::Ifeq,
                Opcode::Ifne,
                Opcode::IfIcmpeq,
                Opcode::IfIcmpne,
                Opcode::IfAcmpeq,
                Opcode::IfAcmpne,
                Opcode::Ifnull,
                Opcode::Ifnonnull,
            ],
            Self::Order => &[
                Opcode::Iflt,
                Opcode::Ifge,
                Opcode::Ifgt,
                Opcode::Ifle,
                Opcode::IfIcmplt,
                Opcode::IfIcmpge,
                Opcode::IfIcmpgt,
                Opcode::IfIcmple,
            ],
        }
    }

    fn check(self) -> &'static str {
        match self {
            Self::Equality => "equality",
            Self::Order => "comparison",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Equality => "EQ",
            Self::Order => "ORD",
        }
    }
}

/// One REMOVE_CONDITIONALS variant.
///
/// With `keep_body` the guarded block always runs (the jump is dropped);
/// otherwise the else branch always runs (the jump becomes a `GOTO`).
pub fn remove_conditionals(kind: ConditionalKind, keep_body: bool) -> TableOperator {
    let outcome = if keep_body { "true" } else { "false" };
    let description = format!(
        "removed conditional - replaced {} check with {}",
        kind.check(),
        outcome
    );

    let mut table = SubstitutionTable::new();
    for &opcode in kind.opcodes() {
        let Some(pops) = jump_pops(opcode) else {
            continue;
        };
        let replacement = if keep_body {
            Replacement::Sequence(pops)
        } else {
            Replacement::SequenceThenGoto(pops)
        };
        table.insert(opcode, replacement, description.clone());
    }

    let branch = if keep_body { "IF" } else { "ELSE" };
    TableOperator::new(
        versioned_id(&format!(
            "remove_conditionals.{}.{}",
            kind.tag().to_lowercase(),
            branch.to_lowercase()
        )),
        format!("REMOVE_CONDITIONALS_{}_{}", kind.tag(), branch),
        format!("Removes {} conditionals", kind.check()),
        table,
    )
}
