//! Declarative opcode substitution tables.
//!
//! Most operators are nothing more than a table from an original opcode to
//! one or more replacements. [`TableOperator`] turns such a table into a
//! [`MutationOperator`].

use std::collections::BTreeMap;

use crate::bytecode::{Insn, MethodElement, Opcode};

use super::operator::{elements, MutationOperator};
use super::rewriter::InsnSite;
use super::OperatorId;

/// What an original instruction turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// The same instruction and operands under a different opcode.
    Opcode(Opcode),
    /// A run of zero-operand instructions in place of the original.
    Sequence(Vec<Opcode>),
    /// A run of zero-operand instructions followed by an unconditional jump
    /// to the original instruction's branch target.
    SequenceThenGoto(Vec<Opcode>),
    /// The original instruction followed by a run of zero-operand
    /// instructions.
    Append(Vec<Opcode>),
}

impl Replacement {
    /// The instructions that stand in for `original`.
    pub fn apply(&self, original: &Insn) -> Vec<Insn> {
        match self {
            Self::Opcode(opcode) => vec![original.with_opcode(*opcode)],
            Self::Sequence(opcodes) => opcodes.iter().copied().map(Insn::simple).collect(),
            Self::SequenceThenGoto(opcodes) => opcodes
                .iter()
                .copied()
                .map(Insn::simple)
                .chain(original.jump_target().map(|label| Insn::jump(Opcode::Goto, label)))
                .collect(),
            Self::Append(opcodes) => std::iter::once(original.clone())
                .chain(opcodes.iter().copied().map(Insn::simple))
                .collect(),
        }
    }
}

/// One way of mutating an opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionRule {
    pub replacement: Replacement,
    pub description: String,
}

/// Opcode to ordered list of substitution rules.
///
/// Every rule for an opcode is a separate candidate; the rule's index is the
/// candidate's alternative number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    rules: BTreeMap<Opcode, Vec<SubstitutionRule>>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that appends a rule for `opcode`.
    pub fn rule(
        mut self,
        opcode: Opcode,
        replacement: Replacement,
        description: impl Into<String>,
    ) -> Self {
        self.insert(opcode, replacement, description);
        self
    }

    pub fn insert(
        &mut self,
        opcode: Opcode,
        replacement: Replacement,
        description: impl Into<String>,
    ) {
        self.rules.entry(opcode).or_default().push(SubstitutionRule {
            replacement,
            description: description.into(),
        });
    }

    /// Rules for `opcode`, in insertion order.
    pub fn rules(&self, opcode: Opcode) -> &[SubstitutionRule] {
        self.rules.get(&opcode).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Opcodes that have at least one rule.
    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.rules.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A mutation operator defined entirely by a [`SubstitutionTable`].
#[derive(Debug, Clone)]
pub struct TableOperator {
    id: OperatorId,
    name: String,
    description: String,
    table: SubstitutionTable,
}

impl TableOperator {
    pub fn new(
        id: OperatorId,
        name: impl Into<String>,
        description: impl Into<String>,
        table: SubstitutionTable,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            table,
        }
    }

    pub fn table(&self) -> &SubstitutionTable {
        &self.table
    }
}

impl MutationOperator for TableOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let rules = self.table.rules(insn.opcode());
        let chosen = site.register_alternatives(rules.iter().map(|r| r.description.as_str()))?;
        Some(elements(rules[chosen].replacement.apply(insn)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Label, MethodBody};
    use crate::mutation::context::{MutationContext, Selection};
    use crate::mutation::rewriter::rewrite;
    use crate::mutation::MethodLocation;

    #[test]
    fn test_replacement_opcode_keeps_operands() {
        let insn = Insn::jump(Opcode::Iflt, Label(3));
        assert_eq!(
            Replacement::Opcode(Opcode::Ifge).apply(&insn),
            vec![Insn::jump(Opcode::Ifge, Label(3))]
        );
    }

    #[test]
    fn test_replacement_sequence_then_goto() {
        let insn = Insn::jump(Opcode::IfIcmpeq, Label(8));
        assert_eq!(
            Replacement::SequenceThenGoto(vec![Opcode::Pop, Opcode::Pop]).apply(&insn),
            vec![
                Insn::simple(Opcode::Pop),
                Insn::simple(Opcode::Pop),
                Insn::jump(Opcode::Goto, Label(8)),
            ]
        );
    }

    #[test]
    fn test_replacement_append() {
        let insn = Insn::var(Opcode::Iload, 2);
        assert_eq!(
            Replacement::Append(vec![Opcode::Ineg]).apply(&insn),
            vec![insn.clone(), Insn::simple(Opcode::Ineg)]
        );
    }

    #[test]
    fn test_replacement_empty_sequence_removes() {
        let insn = Insn::simple(Opcode::Ineg);
        assert!(Replacement::Sequence(vec![]).apply(&insn).is_empty());
    }

    #[test]
    fn test_table_keeps_rule_order() {
        let table = SubstitutionTable::new()
            .rule(Opcode::Iadd, Replacement::Opcode(Opcode::Isub), "first")
            .rule(Opcode::Iadd, Replacement::Opcode(Opcode::Imul), "second");
        let rules = table.rules(Opcode::Iadd);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].description, "second");
        assert!(table.rules(Opcode::Isub).is_empty());
        assert_eq!(table.opcodes().collect::<Vec<_>>(), vec![Opcode::Iadd]);
    }

    #[test]
    fn test_table_operator_rewrites_selected_alternative() {
        let operator = TableOperator::new(
            OperatorId::from_static("bytemut.test.v1"),
            "TEST",
            "test",
            SubstitutionTable::new()
                .rule(Opcode::Iadd, Replacement::Opcode(Opcode::Isub), "to sub")
                .rule(Opcode::Iadd, Replacement::Opcode(Opcode::Imul), "to mul"),
        );
        let method = MethodBody::new("f", "(II)I")
            .insn(Insn::var(Opcode::Iload, 0))
            .insn(Insn::var(Opcode::Iload, 1))
            .insn(Insn::simple(Opcode::Iadd))
            .insn(Insn::simple(Opcode::Ireturn));

        let mut ctx = MutationContext::new(Selection::ordinal(2).unwrap());
        ctx.begin_method(MethodLocation::new("a/B", "f", "(II)I"));
        let out = rewrite(&method, &operator, &mut ctx).unwrap();

        assert_eq!(out[2], MethodElement::Insn(Insn::simple(Opcode::Imul)));
        let report = ctx.close().unwrap();
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.activated.unwrap().description(), "to mul");
    }
}
