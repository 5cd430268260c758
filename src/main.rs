//! bytemut CLI - Bytecode mutation testing engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bytemut::bytecode::{ClassFile, ClassName};
use bytemut::cli::{Cli, Command, HistorySubcommand, PlanArgs};
use bytemut::config::{Config, OutputFormat};
use bytemut::core::{Error, Result};
use bytemut::history::{
    ClassHistory, ClassIdentity, CoverageDatabase, CoverageFingerprints, Decision,
    HistoryOutput, HistoryStore, IncrementalAnalyzer, JsonHistoryStore,
};
use bytemut::mutation::{MutantGenerator, MutationDetails, MutationResult, MutatorCatalog};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default(&cli.path)?,
    };

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let mutators = if cli.mutators.is_empty() {
        config.mutators.clone()
    } else {
        cli.mutators.clone()
    };

    let threads = cli.jobs.unwrap_or(config.threads);
    if threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("Could not configure {} worker threads: {}", threads, e);
        }
    }

    let catalog = MutatorCatalog::builtin();

    match cli.command {
        Command::Operators(args) => list_operators(&catalog, args.name.as_deref(), format),
        Command::Scan(args) => {
            let generator = MutantGenerator::from_catalog(&catalog, &mutators)?;
            let classes = load_classes(&args.classes)?;
            let found = match &args.method {
                Some(method) => scan_method(&generator, &classes, method)?,
                None => generator.scan_classes(&classes)?,
            };
            print_candidates(&found, format)
        }
        Command::Mutate(args) => {
            let generator = MutantGenerator::from_catalog(&catalog, &mutators)?;
            let class = ClassFile::from_path(&args.class)?;
            let mutant = match &args.method {
                Some(name) => {
                    let method = class.method(name, args.descriptor.as_deref())?;
                    generator.method_mutant(&class.name, method, args.ordinal)?
                }
                None => generator.mutant(&class, args.ordinal)?,
            };
            match format {
                OutputFormat::Json => print_json(&mutant),
                OutputFormat::Text => {
                    let id = &mutant.details.id;
                    println!(
                        "{} @{} [{}] {}",
                        id.location,
                        id.instruction,
                        id.operator,
                        mutant.details.description()
                    );
                    print_json(&mutant.method)
                }
            }
        }
        Command::History(history) => match history.command {
            HistorySubcommand::Show(args) => {
                let input = args.input.or(config.history.input.clone());
                show_history(input.as_deref(), format)
            }
            HistorySubcommand::Plan(args) => {
                let generator = MutantGenerator::from_catalog(&catalog, &mutators)?;
                let run = IncrementalRun::prepare(&args, &config)?;
                let decisions = run.decide(&generator)?;
                print_decisions(&decisions, format)
            }
            HistorySubcommand::Record(args) => {
                let generator = MutantGenerator::from_catalog(&catalog, &mutators)?;
                let output = args.output.or(config.history.output.clone());
                let run = IncrementalRun::prepare(&args.plan, &config)?;
                let decisions = run.decide(&generator)?;
                let results = match &args.results {
                    Some(path) => load_results(path)?,
                    None => Vec::new(),
                };
                run.record(output.as_deref(), &generator, &decisions, &results)
            }
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_classes(paths: &[PathBuf]) -> Result<Vec<ClassFile>> {
    paths.iter().map(ClassFile::from_path).collect()
}

fn load_results(path: &Path) -> Result<Vec<MutationResult>> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn list_operators(catalog: &MutatorCatalog, name: Option<&str>, format: OutputFormat) -> Result<()> {
    let names: Vec<&str> = match name {
        Some(name) if catalog.contains(name) => vec![name],
        Some(name) => return Err(Error::unknown_operator(name)),
        None => catalog.names(),
    };

    let listing: BTreeMap<&str, Vec<String>> = names
        .iter()
        .map(|name| {
            let ids = catalog
                .operators(name)
                .unwrap_or_default()
                .iter()
                .map(|op| op.id().to_string())
                .collect();
            (*name, ids)
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&listing),
        OutputFormat::Text => {
            for name in names {
                let operators = catalog.operators(name).unwrap_or_default();
                match operators {
                    [op] if op.name() == name => {
                        println!("{:<32} {:<40} {}", name, op.id().as_str(), op.description())
                    }
                    _ => println!("{:<32} group of {} operators", name, operators.len()),
                }
            }
            Ok(())
        }
    }
}

fn scan_method(
    generator: &MutantGenerator,
    classes: &[ClassFile],
    method: &str,
) -> Result<Vec<(ClassName, Vec<MutationDetails>)>> {
    let mut found = Vec::new();
    for class in classes {
        for body in class.methods.iter().filter(|m| m.name == method) {
            found.push((class.name.clone(), generator.scan_method(&class.name, body)?));
        }
    }
    if found.is_empty() {
        let class = classes.first().map(|c| c.name.to_string()).unwrap_or_default();
        return Err(Error::MissingMethod {
            class,
            method: method.to_string(),
        });
    }
    Ok(found)
}

fn print_candidates(found: &[(ClassName, Vec<MutationDetails>)], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let by_class: Vec<_> = found
                .iter()
                .map(|(class, candidates)| {
                    serde_json::json!({ "class": class, "candidates": candidates })
                })
                .collect();
            print_json(&by_class)
        }
        OutputFormat::Text => {
            let mut total = 0;
            for (class, candidates) in found {
                println!("{class}");
                for details in candidates {
                    let line = details
                        .line
                        .map(|line| format!("line {line}"))
                        .unwrap_or_else(|| "line ?".to_string());
                    println!(
                        "  #{:<4} {}{} @{} {} [{}] {}",
                        details.ordinal,
                        details.id.location.method,
                        details.id.location.descriptor,
                        details.id.instruction,
                        line,
                        details.id.operator,
                        details.description()
                    );
                }
                total += candidates.len();
            }
            println!("{total} candidate mutations");
            Ok(())
        }
    }
}

fn show_history(input: Option<&Path>, format: OutputFormat) -> Result<()> {
    let input = input.ok_or_else(|| Error::config("no history input configured"))?;
    let mut store = JsonHistoryStore::from_paths(Some(input), None)?;
    store.initialize()?;

    let mut statuses: BTreeMap<String, usize> = BTreeMap::new();
    for status in store.historic_results().values() {
        let key = serde_json::to_value(status.status)?
            .as_str()
            .unwrap_or_default()
            .to_string();
        *statuses.entry(key).or_default() += 1;
    }

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "classes": store.historic_class_path().len(),
            "operators": store.historic_operators(),
            "results": statuses,
        })),
        OutputFormat::Text => {
            println!("classes:   {}", store.historic_class_path().len());
            println!("operators: {}", store.historic_operators().len());
            for (status, count) in statuses {
                println!("{status:<13} {count}");
            }
            Ok(())
        }
    }
}

fn print_decisions(decisions: &[Decision], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = decisions
                .iter()
                .map(|decision| match decision {
                    Decision::Reuse(result) => serde_json::json!({
                        "action": "reuse",
                        "details": result.details,
                        "status": result.status,
                    }),
                    Decision::Run(details) => serde_json::json!({
                        "action": "run",
                        "details": details,
                    }),
                })
                .collect();
            print_json(&rows)
        }
        OutputFormat::Text => {
            for decision in decisions {
                let action = if decision.is_reuse() { "reuse" } else { "run" };
                let details = decision.details();
                println!("{action:<6} {} #{}", details.id.class(), details.ordinal);
            }
            Ok(())
        }
    }
}

/// Classes, coverage and the previous history for one incremental run.
struct IncrementalRun {
    classes: Vec<ClassFile>,
    identities: Vec<ClassIdentity>,
    coverage: CoverageFingerprints,
    store: JsonHistoryStore<Box<dyn HistoryOutput>>,
}

impl IncrementalRun {
    fn prepare(args: &PlanArgs, config: &Config) -> Result<Self> {
        let classes = load_classes(&args.classes)?;
        let identities = ClassIdentity::of_classes(&classes)?;
        let coverage = match &args.coverage {
            Some(path) => CoverageFingerprints::from_path(path)?,
            None => CoverageFingerprints::new(),
        };
        let input = args.input.clone().or(config.history.input.clone());
        let mut store = JsonHistoryStore::from_paths(input.as_deref(), None)?;
        store.initialize()?;

        Ok(Self {
            classes,
            identities,
            coverage,
            store,
        })
    }

    fn decide(&self, generator: &MutantGenerator) -> Result<Vec<Decision>> {
        let candidates: Vec<MutationDetails> = generator
            .scan_classes(&self.classes)?
            .into_iter()
            .flat_map(|(_, candidates)| candidates)
            .collect();
        let current: Vec<ClassHistory> = self
            .identities
            .iter()
            .map(|id| ClassHistory::new(id.clone(), self.coverage.coverage_id(&id.name)))
            .collect();

        let analyzer = IncrementalAnalyzer::new(&self.store, &generator.operator_ids());
        let (decisions, _) = analyzer.analyze(&current, &candidates);
        Ok(decisions)
    }

    /// Write a new document: this run's classes and operators, the reused
    /// results and the fresh ones.
    fn record(
        &self,
        output: Option<&Path>,
        generator: &MutantGenerator,
        decisions: &[Decision],
        results: &[MutationResult],
    ) -> Result<()> {
        let output = output.ok_or_else(|| Error::config("no history output configured"))?;

        let mut store = JsonHistoryStore::from_paths(None, Some(output))?;
        store.record_operators(&generator.operator_ids());
        store.record_class_path(&self.identities, &self.coverage);

        let mut reused = 0;
        for decision in decisions {
            if let Decision::Reuse(result) = decision {
                store.record_result(result);
                reused += 1;
            }
        }
        for result in results {
            store.record_result(result);
        }
        store.close()?;

        println!(
            "Recorded {} classes, {} reused and {} new results to {}",
            self.identities.len(),
            reused,
            results.len(),
            output.display()
        );
        Ok(())
    }
}
