//! Constant replacement: CRCR variants and INLINE_CONSTS.

use std::fmt;

use crate::bytecode::{Constant, Insn, MethodElement, Opcode};
use crate::mutation::operator::{elements, MutationOperator};
use crate::mutation::rewriter::InsnSite;
use crate::mutation::OperatorId;

use super::versioned_id;

/// A numeric constant pushed by a single instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Value {
    fn read(insn: &Insn) -> Option<Self> {
        let value = match insn {
            Insn::Simple { opcode } => match opcode {
                Opcode::IconstM1 => Self::Int(-1),
                Opcode::Iconst0 => Self::Int(0),
                Opcode::Iconst1 => Self::Int(1),
                Opcode::Iconst2 => Self::Int(2),
                Opcode::Iconst3 => Self::Int(3),
                Opcode::Iconst4 => Self::Int(4),
                Opcode::Iconst5 => Self::Int(5),
                Opcode::Lconst0 => Self::Long(0),
                Opcode::Lconst1 => Self::Long(1),
                Opcode::Fconst0 => Self::Float(0.0),
                Opcode::Fconst1 => Self::Float(1.0),
                Opcode::Fconst2 => Self::Float(2.0),
                Opcode::Dconst0 => Self::Double(0.0),
                Opcode::Dconst1 => Self::Double(1.0),
                _ => return None,
            },
            Insn::Int {
                opcode: Opcode::Bipush | Opcode::Sipush,
                operand,
            } => Self::Int(*operand),
            Insn::Ldc { constant } => match constant {
                Constant::Int(v) => Self::Int(*v),
                Constant::Long(v) => Self::Long(*v),
                Constant::Float(v) => Self::Float(*v),
                Constant::Double(v) => Self::Double(*v),
                Constant::String(_) | Constant::Class(_) => return None,
            },
            _ => return None,
        };
        Some(value)
    }

    /// The shortest instruction that pushes this value.
    fn push(self) -> Insn {
        match self {
            Self::Int(v) => match v {
                -1 => Insn::simple(Opcode::IconstM1),
                0 => Insn::simple(Opcode::Iconst0),
                1 => Insn::simple(Opcode::Iconst1),
                2 => Insn::simple(Opcode::Iconst2),
                3 => Insn::simple(Opcode::Iconst3),
                4 => Insn::simple(Opcode::Iconst4),
                5 => Insn::simple(Opcode::Iconst5),
                v if i8::try_from(v).is_ok() => Insn::Int {
                    opcode: Opcode::Bipush,
                    operand: v,
                },
                v if i16::try_from(v).is_ok() => Insn::Int {
                    opcode: Opcode::Sipush,
                    operand: v,
                },
                v => Insn::Ldc {
                    constant: Constant::Int(v),
                },
            },
            Self::Long(0) => Insn::simple(Opcode::Lconst0),
            Self::Long(1) => Insn::simple(Opcode::Lconst1),
            Self::Long(v) => Insn::Ldc {
                constant: Constant::Long(v),
            },
            Self::Float(v) if v.to_bits() == 0.0f32.to_bits() => Insn::simple(Opcode::Fconst0),
            Self::Float(v) if v == 1.0 => Insn::simple(Opcode::Fconst1),
            Self::Float(v) if v == 2.0 => Insn::simple(Opcode::Fconst2),
            Self::Float(v) => Insn::Ldc {
                constant: Constant::Float(v),
            },
            Self::Double(v) if v.to_bits() == 0.0f64.to_bits() => Insn::simple(Opcode::Dconst0),
            Self::Double(v) if v == 1.0 => Insn::simple(Opcode::Dconst1),
            Self::Double(v) => Insn::Ldc {
                constant: Constant::Double(v),
            },
        }
    }

    /// Bit-exact equality, so `-0.0` differs from `0.0`.
    fn same_as(self, other: Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }

    fn inlined(self) -> Self {
        match self {
            Self::Int(v) => Self::Int(match v {
                1 => 0,
                -1 => 1,
                5 => -1,
                127 => i32::from(i8::MIN),
                32767 => i32::from(i16::MIN),
                v => v.wrapping_add(1),
            }),
            Self::Long(1) => Self::Long(0),
            Self::Long(v) => Self::Long(v.wrapping_add(1)),
            Self::Float(v) if v == 1.0 || v == 2.0 => Self::Float(0.0),
            Self::Float(_) => Self::Float(1.0),
            Self::Double(v) if v == 1.0 => Self::Double(0.0),
            Self::Double(_) => Self::Double(1.0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v:?}F"),
            Self::Double(v) => write!(f, "{v:?}"),
        }
    }
}

/// The CRCR family: what a numeric constant is replaced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantReplacement {
    One,
    Zero,
    MinusOne,
    Negated,
    Incremented,
}

impl ConstantReplacement {
    pub const ALL: [Self; 5] = [
        Self::One,
        Self::Zero,
        Self::MinusOne,
        Self::Negated,
        Self::Incremented,
    ];

    fn apply(self, value: Value) -> Value {
        match (self, value) {
            (Self::One, Value::Int(_)) => Value::Int(1),
            (Self::One, Value::Long(_)) => Value::Long(1),
            (Self::One, Value::Float(_)) => Value::Float(1.0),
            (Self::One, Value::Double(_)) => Value::Double(1.0),
            (Self::Zero, Value::Int(_)) => Value::Int(0),
            (Self::Zero, Value::Long(_)) => Value::Long(0),
            (Self::Zero, Value::Float(_)) => Value::Float(0.0),
            (Self::Zero, Value::Double(_)) => Value::Double(0.0),
            (Self::MinusOne, Value::Int(_)) => Value::Int(-1),
            (Self::MinusOne, Value::Long(_)) => Value::Long(-1),
            (Self::MinusOne, Value::Float(_)) => Value::Float(-1.0),
            (Self::MinusOne, Value::Double(_)) => Value::Double(-1.0),
            (Self::Negated, Value::Int(v)) => Value::Int(v.wrapping_neg()),
            (Self::Negated, Value::Long(v)) => Value::Long(v.wrapping_neg()),
            (Self::Negated, Value::Float(v)) => Value::Float(-v),
            (Self::Negated, Value::Double(v)) => Value::Double(-v),
            (Self::Incremented, Value::Int(v)) => Value::Int(v.wrapping_add(1)),
            (Self::Incremented, Value::Long(v)) => Value::Long(v.wrapping_add(1)),
            (Self::Incremented, Value::Float(v)) => Value::Float(v + 1.0),
            (Self::Incremented, Value::Double(v)) => Value::Double(v + 1.0),
        }
    }

    /// 1-based CRCR variant number.
    fn variant(self) -> usize {
        match self {
            Self::One => 1,
            Self::Zero => 2,
            Self::MinusOne => 3,
            Self::Negated => 4,
            Self::Incremented => 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Inline,
    Replace(ConstantReplacement),
}

/// Replaces numeric constants. Never registers a candidate whose new value
/// equals the original.
#[derive(Debug, Clone)]
pub struct ConstantOperator {
    id: OperatorId,
    name: String,
    strategy: Strategy,
}

impl ConstantOperator {
    /// `INLINE_CONSTS`.
    pub fn inline() -> Self {
        Self {
            id: versioned_id("inline_consts"),
            name: "INLINE_CONSTS".to_string(),
            strategy: Strategy::Inline,
        }
    }

    /// One CRCR variant (`CRCR_MUTATOR`, `CRCR2_MUTATOR`, ...).
    pub fn crcr(replacement: ConstantReplacement) -> Self {
        let variant = replacement.variant();
        let name = if variant == 1 {
            "CRCR_MUTATOR".to_string()
        } else {
            format!("CRCR{variant}_MUTATOR")
        };
        Self {
            id: versioned_id(&format!("crcr.{variant}")),
            name,
            strategy: Strategy::Replace(replacement),
        }
    }
}

impl MutationOperator for ConstantOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        match self.strategy {
            Strategy::Inline => "Mutates inline numeric constants",
            Strategy::Replace(ConstantReplacement::One) => "Replaces constants with 1",
            Strategy::Replace(ConstantReplacement::Zero) => "Replaces constants with 0",
            Strategy::Replace(ConstantReplacement::MinusOne) => "Replaces constants with -1",
            Strategy::Replace(ConstantReplacement::Negated) => "Negates constants",
            Strategy::Replace(ConstantReplacement::Incremented) => "Increments constants by 1",
        }
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let original = Value::read(insn)?;
        let (mutated, description) = match self.strategy {
            Strategy::Inline => {
                let mutated = original.inlined();
                (mutated, format!("Substituted {original} with {mutated}"))
            }
            Strategy::Replace(replacement) => {
                let mutated = replacement.apply(original);
                (
                    mutated,
                    format!("Replaced constant {original} with {mutated} (CRCR)"),
                )
            }
        };
        if mutated.same_as(original) {
            return None;
        }

        site.register(0, description)
            .is_activated()
            .then(|| elements([mutated.push()]))
    }
}

/// `CRCR_MUTATOR` through `CRCR5_MUTATOR`.
pub fn crcr_mutators() -> Vec<ConstantOperator> {
    ConstantReplacement::ALL
        .into_iter()
        .map(ConstantOperator::crcr)
        .collect()
}
