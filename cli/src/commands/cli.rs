use std::path::PathBuf;

use calcflow_core::config::{EvaluatorKind, OutputFormat};
use calcflow_core::executor::ExecutionMode;
use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Queue,
    Sequential,
}

impl From<ModeArg> for ExecutionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Queue => ExecutionMode::Queue,
            ModeArg::Sequential => ExecutionMode::Sequential,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorArg {
    Ast,
    Regex,
}

impl From<EvaluatorArg> for EvaluatorKind {
    fn from(value: EvaluatorArg) -> Self {
        match value {
            EvaluatorArg::Ast => EvaluatorKind::Ast,
            EvaluatorArg::Regex => EvaluatorKind::Regex,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "calcflow", version, about = "Evaluate batches of assignment expressions")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of the default lookup.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Where the batch comes from. Sources are concatenated in the order
/// arguments, file, stdin.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct InputArgs {
    /// Expressions, one per argument.
    pub expressions: Vec<String>,

    /// File with one expression per line.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Read expressions from stdin.
    #[arg(long)]
    pub stdin: bool,

    /// Initial variable (NAME=VALUE). Can be specified multiple times.
    #[arg(long = "var", action = clap::ArgAction::Append)]
    pub vars: Vec<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long, value_enum)]
    pub evaluator: Option<EvaluatorArg>,

    /// Maximum parallel evaluations per wave.
    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub wave_timeout_ms: Option<u64>,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Show a progress bar over expressions.
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Report waves and single expressions as they run.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EvalArgs {
    pub expression: String,

    #[arg(long = "var", action = clap::ArgAction::Append)]
    pub vars: Vec<String>,

    #[arg(long, value_enum)]
    pub evaluator: Option<EvaluatorArg>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a batch and print the final variable table.
    Run(RunArgs),
    /// Print the execution waves and dependency edges without evaluating.
    Plan(PlanArgs),
    /// Evaluate a single expression and print its value.
    Eval(EvalArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "calcflow", "run", "x = 1", "y = x", "--var", "z=3", "--mode", "queue", "--workers",
            "2",
        ]);
        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.input.expressions, vec!["x = 1", "y = x"]);
        assert_eq!(run.input.vars, vec!["z=3"]);
        assert_eq!(run.mode, Some(ModeArg::Queue));
        assert_eq!(run.workers, Some(2));
        assert!(!run.verbose);
    }

    #[test]
    fn test_parse_eval() {
        let args = Args::parse_from(["calcflow", "eval", "x = 2 * 3", "--evaluator", "regex"]);
        let Commands::Eval(eval) = args.command else {
            panic!("expected eval");
        };
        assert_eq!(eval.expression, "x = 2 * 3");
        assert_eq!(eval.evaluator, Some(EvaluatorArg::Regex));
    }
}
