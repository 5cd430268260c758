//! Arithmetic operator replacement (MATH, AR) and deletion (AOD).

use crate::bytecode::Opcode;
use crate::mutation::table::{Replacement, SubstitutionTable, TableOperator};

use super::{versioned_id, NumericType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

use ArithmeticOp::{Add, Div, Mul, Rem, Sub};

impl ArithmeticOp {
    fn label(self) -> &'static str {
        match self {
            Add => "addition",
            Sub => "subtraction",
            Mul => "multiplication",
            Div => "division",
            Rem => "modulus",
        }
    }

    fn opcode(self, ty: NumericType) -> Opcode {
        use NumericType::*;
        match (self, ty) {
            (Add, Int) => Opcode::Iadd,
            (Add, Long) => Opcode::Ladd,
            (Add, Float) => Opcode::Fadd,
            (Add, Double) => Opcode::Dadd,
            (Sub, Int) => Opcode::Isub,
            (Sub, Long) => Opcode::Lsub,
            (Sub, Float) => Opcode::Fsub,
            (Sub, Double) => Opcode::Dsub,
            (Mul, Int) => Opcode::Imul,
            (Mul, Long) => Opcode::Lmul,
            (Mul, Float) => Opcode::Fmul,
            (Mul, Double) => Opcode::Dmul,
            (Div, Int) => Opcode::Idiv,
            (Div, Long) => Opcode::Ldiv,
            (Div, Float) => Opcode::Fdiv,
            (Div, Double) => Opcode::Ddiv,
            (Rem, Int) => Opcode::Irem,
            (Rem, Long) => Opcode::Lrem,
            (Rem, Float) => Opcode::Frem,
            (Rem, Double) => Opcode::Drem,
        }
    }
}

fn replaced(ty: NumericType, from: ArithmeticOp, to: ArithmeticOp) -> String {
    format!("Replaced {} {} with {}", ty.label(), from.label(), to.label())
}

/// `MATH`: swaps each binary arithmetic or bitwise operation for a related one.
pub fn math() -> TableOperator {
    let mut table = SubstitutionTable::new();
    for ty in NumericType::ALL {
        for (from, to) in [(Add, Sub), (Sub, Add), (Mul, Div), (Div, Mul), (Rem, Mul)] {
            table.insert(
                from.opcode(ty),
                Replacement::Opcode(to.opcode(ty)),
                replaced(ty, from, to),
            );
        }
    }

    let integral = [
        (Opcode::Iand, Opcode::Ior, "integer bitwise AND with OR"),
        (Opcode::Ior, Opcode::Iand, "integer bitwise OR with AND"),
        (Opcode::Ixor, Opcode::Iand, "integer XOR with AND"),
        (Opcode::Ishl, Opcode::Ishr, "integer Shift Left with Shift Right"),
        (Opcode::Ishr, Opcode::Ishl, "integer Shift Right with Shift Left"),
        (Opcode::Iushr, Opcode::Ishl, "integer Unsigned Shift Right with Shift Left"),
        (Opcode::Land, Opcode::Lor, "long bitwise AND with OR"),
        (Opcode::Lor, Opcode::Land, "long bitwise OR with AND"),
        (Opcode::Lxor, Opcode::Land, "long XOR with AND"),
        (Opcode::Lshl, Opcode::Lshr, "long Shift Left with Shift Right"),
        (Opcode::Lshr, Opcode::Lshl, "long Shift Right with Shift Left"),
        (Opcode::Lushr, Opcode::Lshl, "long Unsigned Shift Right with Shift Left"),
    ];
    for (from, to, what) in integral {
        table.insert(from, Replacement::Opcode(to), format!("Replaced {what}"));
    }

    TableOperator::new(
        versioned_id("math"),
        "MATH",
        "Replaces binary arithmetic operations with another operation",
        table,
    )
}

/// Targets of `add`, `sub`, `mul` and `div` for each AR variant. Together the
/// three rows send every operation to each of the other three exactly once.
const AR_TARGETS: [[ArithmeticOp; 4]; 3] = [
    [Mul, Mul, Div, Mul],
    [Sub, Add, Add, Add],
    [Div, Div, Sub, Sub],
];

/// `AR_MUTATOR1`, `AR_MUTATOR2` and `AR_MUTATOR3`.
pub fn ar_mutators() -> Vec<TableOperator> {
    AR_TARGETS
        .iter()
        .enumerate()
        .map(|(index, targets)| {
            let variant = index + 1;
            let mut table = SubstitutionTable::new();
            for ty in NumericType::ALL {
                for (from, to) in [Add, Sub, Mul, Div].into_iter().zip(targets.iter().copied()) {
                    table.insert(
                        from.opcode(ty),
                        Replacement::Opcode(to.opcode(ty)),
                        format!("{} (AOR)", replaced(ty, from, to)),
                    );
                }
            }
            TableOperator::new(
                versioned_id(&format!("ar.{variant}")),
                format!("AR_MUTATOR{variant}"),
                format!("Arithmetic operator replacement, variant {variant}"),
                table,
            )
        })
        .collect()
}

/// `AOD_MUTATOR` (keep the first operand) and `AOD_MUTATOR2` (keep the second).
pub fn aod_mutators() -> Vec<TableOperator> {
    let mut first = SubstitutionTable::new();
    let mut second = SubstitutionTable::new();

    for ty in NumericType::ALL {
        let keep_second = if ty.is_wide() {
            vec![Opcode::Dup2X2, Opcode::Pop2, Opcode::Pop2]
        } else {
            vec![Opcode::Swap, Opcode::Pop]
        };
        for op in [Add, Sub, Mul, Div, Rem] {
            first.insert(
                op.opcode(ty),
                Replacement::Sequence(vec![ty.pop()]),
                format!("Replaced {} {} with first operand", ty.label(), op.label()),
            );
            second.insert(
                op.opcode(ty),
                Replacement::Sequence(keep_second.clone()),
                format!("Replaced {} {} with second operand", ty.label(), op.label()),
            );
        }
    }

    vec![
        TableOperator::new(
            versioned_id("aod.1"),
            "AOD_MUTATOR",
            "Deletes an arithmetic operation, keeping its first operand",
            first,
        ),
        TableOperator::new(
            versioned_id("aod.2"),
            "AOD_MUTATOR2",
            "Deletes an arithmetic operation, keeping its second operand",
            second,
        ),
    ]
}
