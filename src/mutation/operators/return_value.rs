//! RETURN_VALS: perturbs the value a method returns.

use crate::bytecode::{Insn, MethodElement, Opcode};
use crate::mutation::operator::{elements, MutationOperator};
use crate::mutation::rewriter::InsnSite;
use crate::mutation::OperatorId;

use super::versioned_id;

const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";

/// `RETURN_VALS`: rewrites each value-returning instruction.
///
/// - `int`-sized values: `x == 0 ? 1 : 0`
/// - `long`: `x + 1`
/// - `float` and `double`: `-(x + 1)`
/// - references: `null` when non-null, otherwise throw
#[derive(Debug, Clone)]
pub struct ReturnValuesOperator {
    id: OperatorId,
}

impl ReturnValuesOperator {
    pub fn new() -> Self {
        Self {
            id: versioned_id("return_vals"),
        }
    }
}

impl Default for ReturnValuesOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOperator for ReturnValuesOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        "RETURN_VALS"
    }

    fn description(&self) -> &str {
        "Mutates the return values of method calls"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let description = match insn.opcode() {
            Opcode::Ireturn => "replaced return of integer sized value with (x == 0 ? 1 : 0)",
            Opcode::Lreturn => "replaced return of long value with value + 1",
            Opcode::Freturn => "replaced return of float value with -(x + 1)",
            Opcode::Dreturn => "replaced return of double value with -(x + 1)",
            Opcode::Areturn => {
                "mutated return of Object value to ( if (x != null) null else throw new RuntimeException )"
            }
            _ => return None,
        };
        if !site.register(0, description).is_activated() {
            return None;
        }

        let simple = |opcodes: &[Opcode]| elements(opcodes.iter().copied().map(Insn::simple));
        let replacement = match insn.opcode() {
            Opcode::Ireturn => {
                let zero = site.new_label();
                let mut out = elements([Insn::jump(Opcode::Ifeq, zero)]);
                out.extend(simple(&[Opcode::Iconst0, Opcode::Ireturn]));
                out.push(MethodElement::Label(zero));
                out.extend(simple(&[Opcode::Iconst1, Opcode::Ireturn]));
                out
            }
            Opcode::Lreturn => simple(&[Opcode::Lconst1, Opcode::Ladd, Opcode::Lreturn]),
            Opcode::Freturn => simple(&[
                Opcode::Fconst1,
                Opcode::Fadd,
                Opcode::Fneg,
                Opcode::Freturn,
            ]),
            Opcode::Dreturn => simple(&[
                Opcode::Dconst1,
                Opcode::Dadd,
                Opcode::Dneg,
                Opcode::Dreturn,
            ]),
            _ => {
                let non_null = site.new_label();
                let mut out = elements([
                    Insn::jump(Opcode::Ifnonnull, non_null),
                    Insn::Type {
                        opcode: Opcode::New,
                        descriptor: RUNTIME_EXCEPTION.to_string(),
                    },
                    Insn::simple(Opcode::Dup),
                    Insn::method(Opcode::Invokespecial, RUNTIME_EXCEPTION, "<init>", "()V"),
                    Insn::simple(Opcode::Athrow),
                ]);
                out.push(MethodElement::Label(non_null));
                out.extend(simple(&[Opcode::AconstNull, Opcode::Areturn]));
                out
            }
        };
        Some(replacement)
    }
}
