//! OBBN: bitwise AND/OR swap.

use crate::bytecode::Opcode;
use crate::mutation::table::{Replacement, SubstitutionTable, TableOperator};

use super::versioned_id;

/// `OBBN_MUTATOR`: replaces `&` with `|` and vice versa.
pub fn obbn() -> TableOperator {
    let table = SubstitutionTable::new()
        .rule(
            Opcode::Iand,
            Replacement::Opcode(Opcode::Ior),
            "Replaced integer bitwise AND with OR",
        )
        .rule(
            Opcode::Ior,
            Replacement::Opcode(Opcode::Iand),
            "Replaced integer bitwise OR with AND",
        )
        .rule(
            Opcode::Land,
            Replacement::Opcode(Opcode::Lor),
            "Replaced long bitwise AND with OR",
        )
        .rule(
            Opcode::Lor,
            Replacement::Opcode(Opcode::Land),
            "Replaced long bitwise OR with AND",
        );

    TableOperator::new(
        versioned_id("obbn"),
        "OBBN_MUTATOR",
        "Swaps bitwise AND and OR",
        table,
    )
}
