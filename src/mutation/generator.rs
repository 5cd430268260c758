//! Mutant generator - runs operators over method bodies and reproduces
//! individual mutants.

use rayon::prelude::*;
use tracing::debug;

use crate::bytecode::{ClassFile, ClassName, MethodBody, MethodElement};
use crate::core::{Error, Result};

use super::catalog::{MutatorCatalog, OperatorRef};
use super::context::{MutationContext, Selection};
use super::rewriter::rewrite;
use super::{MethodLocation, Mutant, MutationDetails, OperatorId};

/// Generator that enumerates and applies mutations.
///
/// Every operator pass reads the original method body, and a pass applies at
/// most one mutation, so a generated mutant differs from the original at
/// exactly one instruction.
#[derive(Debug, Clone)]
pub struct MutantGenerator {
    operators: Vec<OperatorRef>,
}

impl MutantGenerator {
    /// Create a new mutant generator with the given operators, used in order.
    pub fn new(operators: Vec<OperatorRef>) -> Self {
        Self { operators }
    }

    /// Create a generator for the named operators and groups.
    pub fn from_catalog<S: AsRef<str>>(catalog: &MutatorCatalog, names: &[S]) -> Result<Self> {
        Ok(Self::new(catalog.resolve(names)?))
    }

    /// Get the operators used by this generator.
    pub fn operators(&self) -> &[OperatorRef] {
        &self.operators
    }

    /// Global ids of the operators, in use order.
    pub fn operator_ids(&self) -> Vec<OperatorId> {
        self.operators.iter().map(|op| op.id().clone()).collect()
    }

    /// Run every operator over one method. Returns the rewritten elements of
    /// the pass that activated the selected candidate, if any.
    fn run_method(
        &self,
        class: &ClassName,
        method: &MethodBody,
        context: &mut MutationContext,
    ) -> Result<Option<Vec<MethodElement>>> {
        context.begin_method(MethodLocation::new(
            class.clone(),
            method.name.clone(),
            method.descriptor.clone(),
        ));

        for operator in &self.operators {
            let out = rewrite(method, operator.as_ref(), context)?;
            if context.activated().is_some() {
                return Ok(Some(out));
            }
        }
        Ok(None)
    }

    /// Enumerate candidates in one method. Ordinals start at 1 per method.
    pub fn scan_method(&self, class: &ClassName, method: &MethodBody) -> Result<Vec<MutationDetails>> {
        let mut context = MutationContext::dry_run();
        self.run_method(class, method, &mut context)?;
        Ok(context.close()?.candidates)
    }

    /// Enumerate candidates in a class. Ordinals run across its methods.
    pub fn scan_class(&self, class: &ClassFile) -> Result<Vec<MutationDetails>> {
        let mut context = MutationContext::dry_run();
        for method in &class.methods {
            self.run_method(&class.name, method, &mut context)?;
        }
        let candidates = context.close()?.candidates;
        debug!(
            "Found {} candidate mutations in {}",
            candidates.len(),
            class.name
        );
        Ok(candidates)
    }

    /// Scan many classes in parallel, one context per class.
    pub fn scan_classes(&self, classes: &[ClassFile]) -> Result<Vec<(ClassName, Vec<MutationDetails>)>> {
        classes
            .par_iter()
            .map(|class| Ok((class.name.clone(), self.scan_class(class)?)))
            .collect()
    }

    /// Reproduce the `ordinal`th candidate reported by [`scan_method`](Self::scan_method).
    pub fn method_mutant(
        &self,
        class: &ClassName,
        method: &MethodBody,
        ordinal: usize,
    ) -> Result<Mutant> {
        let mut context = MutationContext::new(Selection::ordinal(ordinal)?);
        let mutated = self.run_method(class, method, &mut context)?;
        let report = context.close()?;
        assemble(report.activated, mutated.map(|elements| (method, elements)), ordinal)
    }

    /// Reproduce the `ordinal`th candidate reported by [`scan_class`](Self::scan_class).
    pub fn mutant(&self, class: &ClassFile, ordinal: usize) -> Result<Mutant> {
        let mut context = MutationContext::new(Selection::ordinal(ordinal)?);
        let mut mutated = None;
        for method in &class.methods {
            if let Some(elements) = self.run_method(&class.name, method, &mut context)? {
                mutated = Some((method, elements));
                break;
            }
        }
        let report = context.close()?;
        assemble(report.activated, mutated, ordinal)
    }
}

fn assemble(
    activated: Option<MutationDetails>,
    mutated: Option<(&MethodBody, Vec<MethodElement>)>,
    ordinal: usize,
) -> Result<Mutant> {
    match (activated, mutated) {
        (Some(details), Some((original, elements))) => Ok(Mutant {
            details,
            method: MethodBody {
                elements,
                ..original.clone()
            },
        }),
        _ => Err(Error::SelectionOutOfRange {
            ordinal,
            candidates: ordinal.saturating_sub(1),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Insn, Label, Opcode};

    fn calculator() -> ClassFile {
        ClassFile::new("demo/Calculator")
            .with_method(
                MethodBody::new("add", "(II)I")
                    .element(MethodElement::Label(Label(0)))
                    .element(MethodElement::LineNumber {
                        line: 5,
                        start: Label(0),
                    })
                    .insn(Insn::var(Opcode::Iload, 1))
                    .insn(Insn::var(Opcode::Iload, 2))
                    .insn(Insn::simple(Opcode::Iadd))
                    .insn(Insn::simple(Opcode::Ireturn)),
            )
            .with_method(
                MethodBody::new("isPositive", "(I)Z")
                    .insn(Insn::var(Opcode::Iload, 1))
                    .insn(Insn::jump(Opcode::Ifle, Label(0)))
                    .insn(Insn::simple(Opcode::Iconst1))
                    .insn(Insn::simple(Opcode::Ireturn))
                    .element(MethodElement::Label(Label(0)))
                    .insn(Insn::simple(Opcode::Iconst0))
                    .insn(Insn::simple(Opcode::Ireturn)),
            )
    }

    fn generator(names: &[&str]) -> MutantGenerator {
        MutantGenerator::from_catalog(&MutatorCatalog::builtin(), names).unwrap()
    }

    #[test]
    fn test_from_catalog_unknown_name() {
        let err = MutantGenerator::from_catalog(&MutatorCatalog::builtin(), &["BOGUS"]).unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { .. }));
    }

    #[test]
    fn test_scan_method() {
        let gen = generator(&["MATH"]);
        let class = calculator();
        let found = gen.scan_method(&class.name, &class.methods[0]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ordinal, 1);
        assert_eq!(found[0].line, Some(5));
        assert_eq!(found[0].id.instruction, 2);
        assert_eq!(found[0].id.location.method, "add");
    }

    #[test]
    fn test_scan_class_counts_across_methods() {
        let gen = generator(&["MATH", "NEGATE_CONDITIONALS", "CONDITIONALS_BOUNDARY"]);
        let found = gen.scan_class(&calculator()).unwrap();
        let ordinals: Vec<usize> = found.iter().map(|d| d.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(found[2].id.location.method, "isPositive");
    }

    #[test]
    fn test_operator_order_follows_ids() {
        let gen = generator(&["NEGATE_CONDITIONALS", "CONDITIONALS_BOUNDARY"]);
        let ids: Vec<String> = gen.operator_ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "bytemut.conditionals_boundary.v1",
                "bytemut.negate_conditionals.v1"
            ]
        );
    }

    #[test]
    fn test_mutant_matches_scan() {
        let gen = generator(&["DEFAULTS"]);
        let class = calculator();
        let found = gen.scan_class(&class).unwrap();
        assert!(!found.is_empty());

        for details in &found {
            let mutant = gen.mutant(&class, details.ordinal).unwrap();
            assert_eq!(&mutant.details, details);

            let original = class
                .method(
                    &details.id.location.method,
                    Some(details.id.location.descriptor.as_str()),
                )
                .unwrap();
            assert!(original.differs_only_at(&mutant.method, details.id.instruction));
            assert_ne!(&mutant.method, original);
        }
    }

    #[test]
    fn test_method_mutant() {
        let gen = generator(&["NEGATE_CONDITIONALS"]);
        let class = calculator();
        let mutant = gen.method_mutant(&class.name, &class.methods[1], 1).unwrap();
        assert_eq!(
            mutant.method.instructions().nth(1),
            Some(&Insn::jump(Opcode::Ifgt, Label(0)))
        );
    }

    #[test]
    fn test_mutant_out_of_range() {
        let gen = generator(&["MATH"]);
        let err = gen.mutant(&calculator(), 2).unwrap_err();
        assert!(matches!(
            err,
            Error::SelectionOutOfRange {
                ordinal: 2,
                candidates: 1
            }
        ));
    }

    #[test]
    fn test_mutant_ordinal_zero() {
        let gen = generator(&["MATH"]);
        assert!(matches!(
            gen.mutant(&calculator(), 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_scan_is_deterministic() {
        let gen = generator(&["ALL"]);
        let class = calculator();
        assert_eq!(gen.scan_class(&class).unwrap(), gen.scan_class(&class).unwrap());
    }

    #[test]
    fn test_scan_classes_parallel() {
        let gen = generator(&["MATH"]);
        let classes = vec![calculator(), ClassFile::new("demo/Empty")];
        let results = gen.scan_classes(&classes).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.as_str(), "demo/Calculator");
        assert!(results[1].1.is_empty());
    }
}
