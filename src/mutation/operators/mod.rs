//! Built-in mutation operators.
//!
//! Operators follow the usual bytecode mutation naming:
//! - MATH / AR: arithmetic operator replacement
//! - AOD: arithmetic operator deletion
//! - ROR: relational operator replacement
//! - CRCR: constant replacement
//! - UOI: unary operator insertion
//! - ABS: absolute value insertion (negation)
//! - OBBN: bitwise operator replacement
//!
//! Table-driven operators are built as [`TableOperator`](super::TableOperator)
//! values; the rest implement [`MutationOperator`](super::MutationOperator)
//! directly.

use crate::bytecode::Opcode;

mod arithmetic;
mod bitwise;
mod call;
mod conditional;
mod constant;
mod relational;
mod return_value;
mod switch;
mod unary;

pub use arithmetic::{aod_mutators, ar_mutators, math};
pub use bitwise::obbn;
pub use call::{
    ArgumentPropagationOperator, ConstructorCallOperator, MemberVariableOperator,
    MethodCallOperator, NakedReceiverOperator,
};
pub use conditional::{remove_conditionals, ConditionalKind};
pub use constant::{crcr_mutators, ConstantOperator, ConstantReplacement};
pub use relational::{conditionals_boundary, negate_conditionals, ror_mutators};
pub use return_value::ReturnValuesOperator;
pub use switch::{remove_switch_mutators, RemoveSwitchLabelOperator, SwitchOperator};
pub use unary::{abs, invert_negs, remove_increments, IncrementsOperator, UoiOperator};

/// Number of `REMOVE_SWITCH_MUTATOR_k` operators in the built-in catalog.
pub const REMOVE_SWITCH_COUNT: usize = 100;

/// Primitive numeric kinds with their own opcode families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumericType {
    Int,
    Long,
    Float,
    Double,
}

impl NumericType {
    pub(crate) const ALL: [Self; 4] = [Self::Int, Self::Long, Self::Float, Self::Double];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Int => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Long and double values take two stack slots.
    pub(crate) fn is_wide(self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }

    pub(crate) fn pop(self) -> Opcode {
        if self.is_wide() {
            Opcode::Pop2
        } else {
            Opcode::Pop
        }
    }

    pub(crate) fn neg(self) -> Opcode {
        match self {
            Self::Int => Opcode::Ineg,
            Self::Long => Opcode::Lneg,
            Self::Float => Opcode::Fneg,
            Self::Double => Opcode::Dneg,
        }
    }

    pub(crate) fn load(self) -> Opcode {
        match self {
            Self::Int => Opcode::Iload,
            Self::Long => Opcode::Lload,
            Self::Float => Opcode::Fload,
            Self::Double => Opcode::Dload,
        }
    }
}

/// Build a `bytemut.<stem>.v1` operator id.
pub(crate) fn versioned_id(stem: &str) -> super::OperatorId {
    super::OperatorId::new(format!("bytemut.{stem}.v1"))
}

#[cfg(test)]
pub(crate) mod test_utils {
    //! Helpers shared by operator tests.

    use crate::bytecode::{MethodBody, MethodElement};
    use crate::mutation::context::{MutationContext, Selection};
    use crate::mutation::rewriter::rewrite;
    use crate::mutation::{MethodLocation, MutationDetails, MutationOperator};

    fn context(method: &MethodBody, selection: Selection) -> MutationContext {
        let mut ctx = MutationContext::new(selection);
        ctx.begin_method(MethodLocation::new(
            "test/Subject",
            method.name.clone(),
            method.descriptor.clone(),
        ));
        ctx
    }

    /// Every candidate the operator registers on `method`.
    pub fn candidates(operator: &dyn MutationOperator, method: &MethodBody) -> Vec<MutationDetails> {
        let mut ctx = context(method, Selection::None);
        rewrite(method, operator, &mut ctx).unwrap();
        ctx.close().unwrap().candidates
    }

    /// The element stream with the `ordinal`th candidate applied.
    pub fn mutate(
        operator: &dyn MutationOperator,
        method: &MethodBody,
        ordinal: usize,
    ) -> Vec<MethodElement> {
        let mut ctx = context(method, Selection::ordinal(ordinal).unwrap());
        let out = rewrite(method, operator, &mut ctx).unwrap();
        ctx.close().unwrap();
        out
    }

    /// Instructions of `mutate` only.
    pub fn mutated_insns(
        operator: &dyn MutationOperator,
        method: &MethodBody,
        ordinal: usize,
    ) -> Vec<crate::bytecode::Insn> {
        mutate(operator, method, ordinal)
            .into_iter()
            .filter_map(|e| match e {
                MethodElement::Insn(insn) => Some(insn),
                _ => None,
            })
            .collect()
    }
}
