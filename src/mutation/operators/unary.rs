//! Unary operators: negation removal and insertion, increments.

use crate::bytecode::{Insn, MethodElement, Opcode};
use crate::mutation::operator::{elements, MutationOperator};
use crate::mutation::rewriter::InsnSite;
use crate::mutation::table::{Replacement, SubstitutionTable, TableOperator};
use crate::mutation::OperatorId;

use super::{versioned_id, NumericType};

/// `INVERT_NEGS`: removes numeric negation.
pub fn invert_negs() -> TableOperator {
    let mut table = SubstitutionTable::new();
    for ty in NumericType::ALL {
        table.insert(
            ty.neg(),
            Replacement::Sequence(Vec::new()),
            format!("removed {} negation", ty.label()),
        );
    }
    TableOperator::new(
        versioned_id("invert_negs"),
        "INVERT_NEGS",
        "Removes negation from numeric values",
        table,
    )
}

/// `ABS_MUTATOR`: negates every numeric local variable as it is loaded.
pub fn abs() -> TableOperator {
    let mut table = SubstitutionTable::new();
    for ty in NumericType::ALL {
        table.insert(
            ty.load(),
            Replacement::Append(vec![ty.neg()]),
            format!("Negated {} local variable", ty.label()),
        );
    }
    TableOperator::new(
        versioned_id("abs"),
        "ABS_MUTATOR",
        "Negates numeric local variables",
        table,
    )
}

/// `REMOVE_INCREMENTS`: drops local variable increments.
pub fn remove_increments() -> TableOperator {
    let table = SubstitutionTable::new().rule(
        Opcode::Iinc,
        Replacement::Sequence(Vec::new()),
        "Removed increment",
    );
    TableOperator::new(
        versioned_id("remove_increments"),
        "REMOVE_INCREMENTS",
        "Removes local variable increments",
        table,
    )
}

/// `INCREMENTS`: flips the sign of a local variable increment.
#[derive(Debug, Clone)]
pub struct IncrementsOperator {
    id: OperatorId,
}

impl IncrementsOperator {
    pub fn new() -> Self {
        Self {
            id: versioned_id("increments"),
        }
    }
}

impl Default for IncrementsOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOperator for IncrementsOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        "INCREMENTS"
    }

    fn description(&self) -> &str {
        "Negates local variable increments"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let Insn::Iinc { var, increment } = *insn else {
            return None;
        };
        // -32768 has no 16-bit negation.
        let negated = increment.checked_neg()?;
        site.register(0, format!("Changed increment from {increment} to {negated}"))
            .is_activated()
            .then(|| {
                elements([Insn::Iinc {
                    var,
                    increment: negated,
                }])
            })
    }
}

/// `UOI_MUTATOR` and `UOI_MUTATOR2`: increment an int local around a load.
#[derive(Debug, Clone)]
pub struct UoiOperator {
    id: OperatorId,
    name: &'static str,
    before_load: bool,
}

impl UoiOperator {
    /// Increment before the load, so the incremented value is used.
    pub fn pre_increment() -> Self {
        Self {
            id: versioned_id("uoi.1"),
            name: "UOI_MUTATOR",
            before_load: true,
        }
    }

    /// Increment after the load, so only later reads see it.
    pub fn post_increment() -> Self {
        Self {
            id: versioned_id("uoi.2"),
            name: "UOI_MUTATOR2",
            before_load: false,
        }
    }
}

impl MutationOperator for UoiOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        if self.before_load {
            "Pre-increments int local variables on load"
        } else {
            "Post-increments int local variables on load"
        }
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let Insn::Var {
            opcode: Opcode::Iload,
            var,
        } = *insn
        else {
            return None;
        };
        let when = if self.before_load { "before" } else { "after" };
        if !site
            .register(0, format!("Incremented local variable {var} {when} use"))
            .is_activated()
        {
            return None;
        }

        let increment = Insn::Iinc { var, increment: 1 };
        let load = insn.clone();
        Some(if self.before_load {
            elements([increment, load])
        } else {
            elements([load, increment])
        })
    }
}
