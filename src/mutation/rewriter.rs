//! Instruction rewriting visitor.
//!
//! [`rewrite`] walks one method with one operator. Non-instruction elements
//! pass through untouched; each instruction is offered to the operator, which
//! registers candidates through an [`InsnSite`] and may return a replacement.

use crate::bytecode::{Label, MethodBody, MethodElement};
use crate::core::Result;

use super::context::{MutationContext, Registration};
use super::operator::MutationOperator;
use super::MutationIdentifier;

/// The view of one instruction position handed to an operator.
pub struct InsnSite<'a> {
    operator: &'a dyn MutationOperator,
    position: usize,
    context: &'a mut MutationContext,
    method: &'a MethodBody,
    next_label: &'a mut u32,
}

impl<'a> InsnSite<'a> {
    /// Index of the current instruction within the method.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The method being rewritten (unmodified).
    pub fn method(&self) -> &MethodBody {
        self.method
    }

    /// Register one candidate for the current instruction.
    pub fn register(&mut self, alternative: usize, description: impl Into<String>) -> Registration {
        let id = MutationIdentifier::new(
            self.context.location().clone(),
            self.operator.id().clone(),
            self.position,
            alternative,
            description,
        );
        self.context.register(id)
    }

    /// Register every alternative in order and return the index of the
    /// activated one.
    pub fn register_alternatives<I, S>(&mut self, descriptions: I) -> Option<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut activated = None;
        for (alternative, description) in descriptions.into_iter().enumerate() {
            if self.register(alternative, description).is_activated() {
                activated = Some(alternative);
            }
        }
        activated
    }

    /// A label that is not used anywhere in the method.
    ///
    /// # Panics
    ///
    /// Panics if one pass allocates more than
    /// [`RESERVED_LABELS`](crate::bytecode::RESERVED_LABELS) labels.
    pub fn new_label(&mut self) -> Label {
        let label = Label(*self.next_label);
        *self.next_label = self
            .next_label
            .checked_add(1)
            .expect("label reservation exceeded");
        label
    }
}

/// Run `operator` over `method`, returning the rewritten element stream.
///
/// The context decides which candidate (if any) is applied; with a dry-run
/// context the output equals the input. Fails when the method has no free
/// label numbers left.
pub fn rewrite(
    method: &MethodBody,
    operator: &dyn MutationOperator,
    context: &mut MutationContext,
) -> Result<Vec<MethodElement>> {
    let mut out = Vec::with_capacity(method.elements.len());
    let mut next_label = method.next_free_label()?.0;
    let mut position = 0;
    context.reset_line();

    for element in &method.elements {
        let insn = match element {
            MethodElement::Insn(insn) => insn,
            MethodElement::LineNumber { line, .. } => {
                context.set_line(*line);
                out.push(element.clone());
                continue;
            }
            _ => {
                out.push(element.clone());
                continue;
            }
        };

        let mut site = InsnSite {
            operator,
            position,
            context: &mut *context,
            method,
            next_label: &mut next_label,
        };
        match operator.visit_insn(insn, &mut site) {
            Some(replacement) => out.extend(replacement),
            None => out.push(element.clone()),
        }
        position += 1;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Insn, Opcode};
    use crate::mutation::context::Selection;
    use crate::mutation::operator::elements;
    use crate::mutation::{MethodLocation, OperatorId};

    /// Swaps every IADD for ISUB, and offers two alternatives on IMUL.
    struct ArithSwap {
        id: OperatorId,
    }

    impl MutationOperator for ArithSwap {
        fn id(&self) -> &OperatorId {
            &self.id
        }

        fn name(&self) -> &str {
            "ARITH_SWAP"
        }

        fn description(&self) -> &str {
            "test operator"
        }

        fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
            match insn.opcode() {
                Opcode::Iadd => site
                    .register(0, "add to sub")
                    .is_activated()
                    .then(|| elements([Insn::simple(Opcode::Isub)])),
                Opcode::Imul => match site.register_alternatives(["to div", "to add"])? {
                    0 => Some(elements([Insn::simple(Opcode::Idiv)])),
                    _ => Some(elements([Insn::simple(Opcode::Iadd)])),
                },
                _ => None,
            }
        }
    }

    fn arith_swap() -> ArithSwap {
        ArithSwap {
            id: OperatorId::from_static("bytemut.arith_swap.v1"),
        }
    }

    fn method() -> MethodBody {
        MethodBody::new("f", "(III)I")
            .element(MethodElement::Label(Label(0)))
            .element(MethodElement::LineNumber {
                line: 10,
                start: Label(0),
            })
            .insn(Insn::var(Opcode::Iload, 1))
            .insn(Insn::var(Opcode::Iload, 2))
            .insn(Insn::simple(Opcode::Iadd))
            .insn(Insn::var(Opcode::Iload, 3))
            .insn(Insn::simple(Opcode::Imul))
            .insn(Insn::simple(Opcode::Ireturn))
    }

    fn context(selection: Selection) -> MutationContext {
        let mut ctx = MutationContext::new(selection);
        ctx.begin_method(MethodLocation::new("a/B", "f", "(III)I"));
        ctx
    }

    #[test]
    fn test_dry_run_leaves_method_unchanged() {
        let mut ctx = context(Selection::None);
        let out = rewrite(&method(), &arith_swap(), &mut ctx).unwrap();
        assert_eq!(out, method().elements);

        let report = ctx.close().unwrap();
        assert_eq!(report.candidates.len(), 3);
        assert_eq!(report.candidates[0].id.instruction, 2);
        assert_eq!(report.candidates[0].line, Some(10));
        assert_eq!(report.candidates[2].id.alternative, 1);
    }

    #[test]
    fn test_applies_only_selected_candidate() {
        let original = method();
        let mut ctx = context(Selection::ordinal(3).unwrap());
        let out = rewrite(&original, &arith_swap(), &mut ctx).unwrap();

        let mutated = MethodBody {
            elements: out,
            ..original.clone()
        };
        assert!(original.differs_only_at(&mutated, 4));
        assert_eq!(
            mutated.instructions().nth(4),
            Some(&Insn::simple(Opcode::Iadd))
        );
        assert_eq!(
            mutated.instructions().nth(2),
            Some(&Insn::simple(Opcode::Iadd))
        );
    }

    #[test]
    fn test_new_labels_are_fresh() {
        let original = method();
        let operator = arith_swap();
        let mut ctx = context(Selection::None);
        let mut next = original.next_free_label().unwrap().0;
        let mut site = InsnSite {
            operator: &operator,
            position: 0,
            context: &mut ctx,
            method: &original,
            next_label: &mut next,
        };
        assert_eq!(site.new_label(), Label(1));
        assert_eq!(site.new_label(), Label(2));
    }
}
