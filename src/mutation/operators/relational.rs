//! Relational operator replacement (ROR) and the classic conditional
//! operators (NEGATE_CONDITIONALS, CONDITIONALS_BOUNDARY).

use crate::bytecode::Opcode;
use crate::mutation::table::{Replacement, SubstitutionTable, TableOperator};

use super::versioned_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

/// Fixed relation order that ROR rotates through.
const ORDER: [Relation; 6] = [
    Relation::Eq,
    Relation::Ne,
    Relation::Lt,
    Relation::Ge,
    Relation::Gt,
    Relation::Le,
];

impl Relation {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
        }
    }

    fn negated(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Ge => Self::Lt,
            Self::Gt => Self::Le,
            Self::Le => Self::Gt,
        }
    }

    fn boundary(self) -> Option<Self> {
        match self {
            Self::Lt => Some(Self::Le),
            Self::Le => Some(Self::Lt),
            Self::Gt => Some(Self::Ge),
            Self::Ge => Some(Self::Gt),
            Self::Eq | Self::Ne => None,
        }
    }
}

/// The two families of integer conditional jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    /// `IFxx`: one int compared with zero.
    Zero,
    /// `IF_ICMPxx`: two ints.
    Ints,
}

impl Comparison {
    const ALL: [Self; 2] = [Self::Zero, Self::Ints];

    fn opcode(self, relation: Relation) -> Opcode {
        match (self, relation) {
            (Self::Zero, Relation::Eq) => Opcode::Ifeq,
            (Self::Zero, Relation::Ne) => Opcode::Ifne,
            (Self::Zero, Relation::Lt) => Opcode::Iflt,
            (Self::Zero, Relation::Ge) => Opcode::Ifge,
            (Self::Zero, Relation::Gt) => Opcode::Ifgt,
            (Self::Zero, Relation::Le) => Opcode::Ifle,
            (Self::Ints, Relation::Eq) => Opcode::IfIcmpeq,
            (Self::Ints, Relation::Ne) => Opcode::IfIcmpne,
            (Self::Ints, Relation::Lt) => Opcode::IfIcmplt,
            (Self::Ints, Relation::Ge) => Opcode::IfIcmpge,
            (Self::Ints, Relation::Gt) => Opcode::IfIcmpgt,
            (Self::Ints, Relation::Le) => Opcode::IfIcmple,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Zero => "comparison with zero",
            Self::Ints => "integer comparison",
        }
    }

    fn pops(self) -> Vec<Opcode> {
        match self {
            Self::Zero => vec![Opcode::Pop],
            Self::Ints => vec![Opcode::Pop, Opcode::Pop],
        }
    }
}

/// Operand pops that discard the inputs of a conditional jump.
///
/// `None` for anything that is not a conditional jump.
pub(super) fn jump_pops(opcode: Opcode) -> Option<Vec<Opcode>> {
    match opcode {
        Opcode::Ifeq
        | Opcode::Ifne
        | Opcode::Iflt
        | Opcode::Ifge
        | Opcode::Ifgt
        | Opcode::Ifle
        | Opcode::Ifnull
        | Opcode::Ifnonnull => Some(vec![Opcode::Pop]),
        Opcode::IfIcmpeq
        | Opcode::IfIcmpne
        | Opcode::IfIcmplt
        | Opcode::IfIcmpge
        | Opcode::IfIcmpgt
        | Opcode::IfIcmple
        | Opcode::IfAcmpeq
        | Opcode::IfAcmpne => Some(vec![Opcode::Pop, Opcode::Pop]),
        _ => None,
    }
}

const REFERENCE_NEGATIONS: [(Opcode, Opcode, &str); 4] = [
    (Opcode::IfAcmpeq, Opcode::IfAcmpne, "reference equality"),
    (Opcode::IfAcmpne, Opcode::IfAcmpeq, "reference inequality"),
    (Opcode::Ifnull, Opcode::Ifnonnull, "null check"),
    (Opcode::Ifnonnull, Opcode::Ifnull, "non-null check"),
];

/// `ROR_MUTATOR` through `ROR_MUTATOR8`.
///
/// Variants 1 to 5 rotate each integer relation forward through the fixed
/// order by 1 to 5 places. Variant 6 makes the jump unconditional, variant 7
/// removes it, and variant 8 negates reference comparisons.
pub fn ror_mutators() -> Vec<TableOperator> {
    let mut operators = Vec::with_capacity(8);

    for shift in 1..=5 {
        let mut table = SubstitutionTable::new();
        for comparison in Comparison::ALL {
            for (index, from) in ORDER.iter().copied().enumerate() {
                let to = ORDER[(index + shift) % ORDER.len()];
                table.insert(
                    comparison.opcode(from),
                    Replacement::Opcode(comparison.opcode(to)),
                    format!(
                        "Replaced {} {} with {} (ROR)",
                        comparison.label(),
                        from.symbol(),
                        to.symbol()
                    ),
                );
            }
        }
        operators.push(ror_operator(shift, table));
    }

    let mut always = SubstitutionTable::new();
    let mut never = SubstitutionTable::new();
    for comparison in Comparison::ALL {
        for relation in ORDER {
            let opcode = comparison.opcode(relation);
            let what = format!("{} {}", comparison.label(), relation.symbol());
            always.insert(
                opcode,
                Replacement::SequenceThenGoto(comparison.pops()),
                format!("Replaced {what} with true (ROR)"),
            );
            never.insert(
                opcode,
                Replacement::Sequence(comparison.pops()),
                format!("Replaced {what} with false (ROR)"),
            );
        }
    }
    operators.push(ror_operator(6, always));
    operators.push(ror_operator(7, never));

    let mut references = SubstitutionTable::new();
    for (from, to, what) in REFERENCE_NEGATIONS {
        references.insert(
            from,
            Replacement::Opcode(to),
            format!("Negated {what} (ROR)"),
        );
    }
    operators.push(ror_operator(8, references));

    operators
}

fn ror_operator(variant: usize, table: SubstitutionTable) -> TableOperator {
    let name = if variant == 1 {
        "ROR_MUTATOR".to_string()
    } else {
        format!("ROR_MUTATOR{variant}")
    };
    TableOperator::new(
        versioned_id(&format!("ror.{variant}")),
        name,
        format!("Relational operator replacement, variant {variant}"),
        table,
    )
}

/// `NEGATE_CONDITIONALS`: inverts every conditional jump.
pub fn negate_conditionals() -> TableOperator {
    let mut table = SubstitutionTable::new();
    for comparison in Comparison::ALL {
        for relation in ORDER {
            table.insert(
                comparison.opcode(relation),
                Replacement::Opcode(comparison.opcode(relation.negated())),
                "negated conditional",
            );
        }
    }
    for (from, to, _) in REFERENCE_NEGATIONS {
        table.insert(from, Replacement::Opcode(to), "negated conditional");
    }
    TableOperator::new(
        versioned_id("negate_conditionals"),
        "NEGATE_CONDITIONALS",
        "Negates conditionals",
        table,
    )
}

/// `CONDITIONALS_BOUNDARY`: moves `<`/`<=` and `>`/`>=` boundaries.
pub fn conditionals_boundary() -> TableOperator {
    let mut table = SubstitutionTable::new();
    for comparison in Comparison::ALL {
        for relation in ORDER {
            if let Some(to) = relation.boundary() {
                table.insert(
                    comparison.opcode(relation),
                    Replacement::Opcode(comparison.opcode(to)),
                    "changed conditional boundary",
                );
            }
        }
    }
    TableOperator::new(
        versioned_id("conditionals_boundary"),
        "CONDITIONALS_BOUNDARY",
        "Changes conditional boundaries",
        table,
    )
}
