use proptest::prelude::*;

use bytemut::bytecode::{ClassName, Insn, Label, MethodBody, MethodElement, Opcode};
use bytemut::mutation::{MutantGenerator, MutatorCatalog};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn insn() -> impl Strategy<Value = Insn> {
    prop_oneof![
        prop::sample::select(vec![
            Opcode::Iadd,
            Opcode::Isub,
            Opcode::Imul,
            Opcode::Idiv,
            Opcode::Irem,
            Opcode::Ladd,
            Opcode::Fmul,
            Opcode::Ddiv,
            Opcode::Ineg,
            Opcode::Iand,
            Opcode::Ior,
            Opcode::Iconst0,
            Opcode::Iconst1,
            Opcode::IconstM1,
            Opcode::Lcmp,
            Opcode::Pop,
        ])
        .prop_map(Insn::simple),
        (
            prop::sample::select(vec![Opcode::Iload, Opcode::Istore, Opcode::Lload, Opcode::Dload]),
            1u16..4,
        )
            .prop_map(|(opcode, var)| Insn::var(opcode, var)),
        prop::sample::select(vec![
            Opcode::Ifeq,
            Opcode::Ifne,
            Opcode::Iflt,
            Opcode::Ifge,
            Opcode::IfIcmplt,
            Opcode::IfIcmpeq,
            Opcode::Goto,
        ])
        .prop_map(|opcode| Insn::jump(opcode, Label(0))),
        (1u16..4, -3i16..4).prop_map(|(var, increment)| Insn::Iinc { var, increment }),
        (-200i32..200).prop_map(|operand| Insn::Int {
            opcode: Opcode::Bipush,
            operand
        }),
        prop::sample::select(vec![
            ("compute", "(I)I"),
            ("log", "()V"),
            ("ratio", "(JJ)D"),
        ])
        .prop_map(|(name, descriptor)| Insn::method(
            Opcode::Invokestatic,
            "demo/Helper",
            name,
            descriptor
        )),
    ]
}

fn method() -> impl Strategy<Value = MethodBody> {
    (prop::collection::vec(insn(), 1..16), any::<bool>()).prop_map(|(insns, with_line)| {
        let mut body = MethodBody::new("work", "(II)I")
            .with_static(true)
            .element(MethodElement::Label(Label(0)));
        if with_line {
            body = body.element(MethodElement::LineNumber {
                line: 12,
                start: Label(0),
            });
        }
        for insn in insns {
            body = body.insn(insn);
        }
        body.insn(Insn::simple(Opcode::Ireturn))
    })
}

const NAMES: &[&str] = &[
    "MATH",
    "NEGATE_CONDITIONALS",
    "CONDITIONALS_BOUNDARY",
    "INVERT_NEGS",
    "INCREMENTS",
    "AR_MUTATOR1",
    "ABS_MUTATOR",
    "DEFAULTS",
];

fn names() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(NAMES.to_vec(), 1..NAMES.len()).prop_shuffle()
}

fn ids(generator: &MutantGenerator) -> Vec<String> {
    generator
        .operator_ids()
        .iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Single-site mutants
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every candidate reproduces as a mutant that changes exactly its own
    /// instruction and nothing else.
    #[test]
    fn every_mutant_differs_at_one_instruction(body in method()) {
        let catalog = MutatorCatalog::builtin();
        let generator = MutantGenerator::from_catalog(&catalog, &["ALL"]).unwrap();
        let class = ClassName::new("demo/Generated");

        let found = generator.scan_method(&class, &body).unwrap();
        for details in &found {
            let mutant = generator.method_mutant(&class, &body, details.ordinal).unwrap();
            prop_assert_eq!(&mutant.details, details);
            prop_assert!(
                body.differs_only_at(&mutant.method, details.id.instruction),
                "{} rewrote more than instruction {}",
                details.id.operator,
                details.id.instruction
            );
        }
    }

    /// Ordinals are dense and 1-based, and identifiers are unique.
    #[test]
    fn scan_ordinals_are_dense(body in method()) {
        let catalog = MutatorCatalog::builtin();
        let generator = MutantGenerator::from_catalog(&catalog, &["ALL"]).unwrap();
        let found = generator.scan_method(&ClassName::new("demo/Generated"), &body).unwrap();

        let ordinals: Vec<usize> = found.iter().map(|d| d.ordinal).collect();
        let expected: Vec<usize> = (1..=found.len()).collect();
        prop_assert_eq!(ordinals, expected);

        let mut unique: Vec<_> = found.iter().map(|d| &d.id).collect();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), found.len());
    }

    /// Scanning the same method twice gives the same candidates.
    #[test]
    fn scan_is_deterministic(body in method()) {
        let catalog = MutatorCatalog::builtin();
        let generator = MutantGenerator::from_catalog(&catalog, &["DEFAULTS"]).unwrap();
        let class = ClassName::new("demo/Generated");

        let first = generator.scan_method(&class, &body).unwrap();
        let second = generator.scan_method(&class, &body).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Asking for one past the last candidate is always out of range.
    #[test]
    fn past_the_end_is_rejected(body in method()) {
        let catalog = MutatorCatalog::builtin();
        let generator = MutantGenerator::from_catalog(&catalog, &["DEFAULTS"]).unwrap();
        let class = ClassName::new("demo/Generated");

        let count = generator.scan_method(&class, &body).unwrap().len();
        prop_assert!(generator.method_mutant(&class, &body, count + 1).is_err());
    }
}

// ---------------------------------------------------------------------------
// Catalog resolution
// ---------------------------------------------------------------------------

proptest! {
    /// Resolution ignores the order of names and drops duplicate operators.
    #[test]
    fn resolve_ignores_order(names in names()) {
        let catalog = MutatorCatalog::builtin();
        let forward = MutantGenerator::from_catalog(&catalog, &names).unwrap();

        let mut reversed = names.clone();
        reversed.reverse();
        let backward = MutantGenerator::from_catalog(&catalog, &reversed).unwrap();

        prop_assert_eq!(ids(&forward), ids(&backward));

        let mut deduped = ids(&forward);
        deduped.dedup();
        prop_assert_eq!(deduped.len(), forward.operators().len());
    }

    /// Naming a group alongside its members adds nothing.
    #[test]
    fn group_absorbs_members(names in names()) {
        let catalog = MutatorCatalog::builtin();
        let mut with_defaults = names.clone();
        with_defaults.push("DEFAULTS");

        let members = MutantGenerator::from_catalog(&catalog, &with_defaults).unwrap();
        let mut doubled = with_defaults.clone();
        doubled.extend(with_defaults.iter().copied());
        let twice = MutantGenerator::from_catalog(&catalog, &doubled).unwrap();

        prop_assert_eq!(ids(&members), ids(&twice));
    }
}
