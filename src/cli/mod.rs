//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// bytemut - Bytecode mutation testing engine.
#[derive(Parser)]
#[command(name = "bytemut")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory searched for bytemut.toml
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Mutator or group names, comma-separated (overrides the configuration)
    #[arg(short, long, value_delimiter = ',')]
    pub mutators: Vec<String>,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List mutation operators and groups
    #[command(alias = "ops")]
    Operators(OperatorsArgs),

    /// Enumerate candidate mutations in compiled classes
    Scan(ScanArgs),

    /// Produce a single mutant by ordinal
    Mutate(MutateArgs),

    /// Inspect or update the incremental history
    History(HistoryCommand),
}

#[derive(Args)]
pub struct OperatorsArgs {
    /// Show the operators bound to this name only
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Class files (JSON encoded)
    #[arg(required = true)]
    pub classes: Vec<PathBuf>,

    /// Scan only methods with this name; ordinals then restart per method
    #[arg(long)]
    pub method: Option<String>,
}

#[derive(Args)]
pub struct MutateArgs {
    /// Class file (JSON encoded)
    pub class: PathBuf,

    /// 1-based ordinal reported by `scan`
    #[arg(short = 'n', long)]
    pub ordinal: usize,

    /// Method name, for ordinals reported by `scan --method`
    #[arg(long)]
    pub method: Option<String>,

    /// Method descriptor, when the name is overloaded
    #[arg(long, requires = "method")]
    pub descriptor: Option<String>,
}

#[derive(Args)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub command: HistorySubcommand,
}

#[derive(Subcommand)]
pub enum HistorySubcommand {
    /// Summarize a history document
    Show(ShowArgs),
    /// Show which candidates can reuse stored results
    Plan(PlanArgs),
    /// Write a new history document for this run
    Record(RecordArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// History document (defaults to the configured input)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Class files (JSON encoded)
    #[arg(required = true)]
    pub classes: Vec<PathBuf>,

    /// Coverage fingerprints (JSON encoded)
    #[arg(long)]
    pub coverage: Option<PathBuf>,

    /// Previous history document (defaults to the configured input)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Test results for this run (JSON array)
    #[arg(short, long)]
    pub results: Option<PathBuf>,

    /// Where to write the new document (defaults to the configured output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for crate::config::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
        }
    }
}
