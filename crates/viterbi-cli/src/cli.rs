use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use viterbi_graph::engine::config::EvaluationMode;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "Viterbi CLI - Most-probable-state and pivot analysis for binary factor-graph forests.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to evaluate query batches.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a batch of queries against a factor graph.
    Evaluate(EvaluateArgs),
    /// Validate a factor graph and print its visitation schedule.
    Check(CheckArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Best and total probability only
    Lightweight,
    /// Probabilities, decided state and pivot
    Full,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Lightweight => EvaluationMode::Lightweight,
            ModeArg::Full => EvaluationMode::Full,
        }
    }
}

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the factor graph in TOML format. Overrides `graph` in the config file.
    #[arg(short, long, value_name = "PATH")]
    pub graph: Option<PathBuf>,

    /// Path to the query batch in TOML format. Overrides `queries` in the config file.
    #[arg(short = 'Q', long, value_name = "PATH")]
    pub queries: Option<PathBuf>,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the evaluation mode from the config file.
    #[arg(short, long, value_enum, value_name = "MODE")]
    pub mode: Option<ModeArg>,

    /// Override the ratio reported when a free variable can never be true.
    #[arg(long, value_name = "FLOAT")]
    pub infinite_ratio: Option<f64>,

    /// Write a CSV summary with one row per query.
    #[arg(short, long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Print the workspace diagnostics after each query. Evaluates sequentially.
    #[arg(long)]
    pub dump_workspace: bool,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the factor graph in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub graph: PathBuf,
}
