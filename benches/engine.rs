//! Benchmarks for candidate scans, mutant reproduction and history planning.
//!
//! Run with: cargo bench
//! Run specific benchmark: cargo bench -- scan

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use bytemut::bytecode::{ClassFile, Insn, Label, MethodBody, MethodElement, Opcode};
use bytemut::history::{
    ClassHistory, ClassIdentity, CoverageFingerprints, Fingerprint, HistoryStore, IncrementalAnalyzer,
    JsonHistoryStore, NullOutput,
};
use bytemut::mutation::{MutantGenerator, MutatorCatalog};

/// A method mixing arithmetic, branches, constants and calls.
fn generate_method(index: usize) -> MethodBody {
    let mut body = MethodBody::new(format!("compute{index}"), "(II)I")
        .element(MethodElement::Label(Label(0)))
        .element(MethodElement::LineNumber {
            line: 10 + index as u32,
            start: Label(0),
        });
    for step in 0..8 {
        let arithmetic = [Opcode::Iadd, Opcode::Isub, Opcode::Imul, Opcode::Idiv][step % 4];
        body = body
            .insn(Insn::var(Opcode::Iload, 1))
            .insn(Insn::var(Opcode::Iload, 2))
            .insn(Insn::simple(arithmetic))
            .insn(Insn::jump(Opcode::Ifle, Label(1)))
            .insn(Insn::Iinc {
                var: 1,
                increment: 1,
            })
            .insn(Insn::method(
                Opcode::Invokestatic,
                "demo/Helper",
                "log",
                "()V",
            ));
    }
    body.element(MethodElement::Label(Label(1)))
        .insn(Insn::simple(Opcode::Iconst1))
        .insn(Insn::simple(Opcode::Ireturn))
}

fn generate_class(index: usize, methods: usize) -> ClassFile {
    (0..methods).fold(
        ClassFile::new(format!("demo/Generated{index}")),
        |class, m| class.with_method(generate_method(m)),
    )
}

fn generate_classes(count: usize) -> Vec<ClassFile> {
    (0..count).map(|i| generate_class(i, 10)).collect()
}

/// Benchmark enumerating candidates with the default and full operator sets.
fn bench_scan(c: &mut Criterion) {
    let catalog = MutatorCatalog::builtin();
    let mut group = c.benchmark_group("scan");

    for name in ["DEFAULTS", "ALL"] {
        let generator = MutantGenerator::from_catalog(&catalog, &[name]).unwrap();
        for size in [1usize, 10, 50].iter() {
            let classes = generate_classes(*size);
            group.throughput(Throughput::Elements(*size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, _| {
                b.iter(|| black_box(generator.scan_classes(&classes).unwrap()))
            });
        }
    }

    group.finish();
}

/// Benchmark reproducing a mutant near the start and the end of a class.
fn bench_mutate(c: &mut Criterion) {
    let catalog = MutatorCatalog::builtin();
    let generator = MutantGenerator::from_catalog(&catalog, &["DEFAULTS"]).unwrap();
    let class = generate_class(0, 10);
    let total = generator.scan_class(&class).unwrap().len();

    let mut group = c.benchmark_group("mutate");
    for ordinal in [1, total / 2, total] {
        group.bench_with_input(BenchmarkId::new("ordinal", ordinal), &ordinal, |b, &n| {
            b.iter(|| black_box(generator.mutant(&class, n).unwrap()))
        });
    }
    group.finish();
}

/// Benchmark planning against an empty history.
fn bench_plan(c: &mut Criterion) {
    let catalog = MutatorCatalog::builtin();
    let generator = MutantGenerator::from_catalog(&catalog, &["DEFAULTS"]).unwrap();
    let mut group = c.benchmark_group("plan");
    group.sample_size(20);

    for size in [10usize, 50].iter() {
        let classes = generate_classes(*size);
        let identities = ClassIdentity::of_classes(&classes).unwrap();
        let coverage = CoverageFingerprints::new();
        let current: Vec<ClassHistory> = identities
            .iter()
            .map(|id| ClassHistory::new(id.clone(), Fingerprint(0)))
            .collect();
        let candidates: Vec<_> = generator
            .scan_classes(&classes)
            .unwrap()
            .into_iter()
            .flat_map(|(_, found)| found)
            .collect();

        let mut store = JsonHistoryStore::new(None, NullOutput);
        store.initialize().unwrap();
        store.record_class_path(&identities, &coverage);

        group.throughput(Throughput::Elements(candidates.len() as u64));
        group.bench_with_input(BenchmarkId::new("classes", size), size, |b, _| {
            b.iter(|| {
                let analyzer = IncrementalAnalyzer::new(&store, &generator.operator_ids());
                black_box(analyzer.analyze(&current, &candidates))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan, bench_mutate, bench_plan);
criterion_main!(benches);
