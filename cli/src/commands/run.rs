use std::time::Duration;

use calcflow_core::config::{AppConfig, OutputFormat};
use calcflow_core::error::{CliError, ErrorCode};
use calcflow_core::executor::ExecutionOpts;
use calcflow_plugins::executor::format_table;
use calcflow_plugins::factory::{build_executor, build_renderer};

use crate::commands::cli::RunArgs;
use crate::input;

/// Fold command line flags over the loaded config.
pub fn apply_run_flags(cfg: &mut AppConfig, args: &RunArgs) {
    if let Some(mode) = args.mode {
        cfg.executor.mode = mode.into();
    }
    if let Some(evaluator) = args.evaluator {
        cfg.executor.evaluator = evaluator.into();
    }
    if let Some(workers) = args.workers {
        cfg.executor.max_workers = Some(workers);
    }
    if let Some(ms) = args.wave_timeout_ms {
        cfg.executor.wave_timeout_ms = Some(ms);
    }
    if let Some(format) = args.format {
        cfg.output.format = format.into();
    }
    if args.progress {
        cfg.output.progress = true;
    }
}

/// Handle run command
pub async fn handle_run(args: RunArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    apply_run_flags(&mut cfg, &args);

    let batch = input::read_batch(&args.input).await?;
    let initial = input::parse_vars(&args.input.vars)?;

    // jsonl streams every event; text only talks when asked to
    let renderer = match cfg.output.format {
        OutputFormat::Jsonl => Some(build_renderer(OutputFormat::Jsonl, args.verbose)),
        OutputFormat::Text if args.verbose => Some(build_renderer(OutputFormat::Text, true)),
        OutputFormat::Text => None,
    };

    let opts = ExecutionOpts {
        max_workers: cfg.executor.max_workers,
        wave_timeout: cfg.executor.wave_timeout_ms.map(Duration::from_millis),
        progress_bar: cfg.output.progress,
        run_id: None,
    };
    let executor = build_executor(&cfg, opts, renderer);

    tracing::info!(
        mode = %cfg.executor.mode,
        evaluator = %cfg.executor.evaluator,
        expressions = batch.len(),
        "running batch"
    );
    let report = executor.run(&batch, &initial).await?;

    if cfg.output.format == OutputFormat::Text {
        for (name, value) in &report.variables {
            println!("{name} = {value}");
        }
        tracing::debug!(table = %format_table(&report.variables), "final table");
    }

    Ok(ErrorCode::Success.as_exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cli::{EvaluatorArg, InputArgs, ModeArg};
    use calcflow_core::config::EvaluatorKind;
    use calcflow_core::executor::ExecutionMode;

    fn run_args() -> RunArgs {
        RunArgs {
            input: InputArgs {
                expressions: vec!["x = 1".to_string(), "y = x + 1".to_string()],
                ..InputArgs::default()
            },
            mode: None,
            evaluator: None,
            workers: None,
            wave_timeout_ms: None,
            format: None,
            progress: false,
            verbose: false,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut cfg = AppConfig::default();
        cfg.executor.max_workers = Some(8);

        let mut args = run_args();
        args.mode = Some(ModeArg::Queue);
        args.evaluator = Some(EvaluatorArg::Regex);
        args.workers = Some(2);
        apply_run_flags(&mut cfg, &args);

        assert_eq!(cfg.executor.mode, ExecutionMode::Queue);
        assert_eq!(cfg.executor.evaluator, EvaluatorKind::Regex);
        assert_eq!(cfg.executor.max_workers, Some(2));
        assert_eq!(cfg.executor.wave_timeout_ms, None);
    }

    #[test]
    fn test_missing_flags_keep_config() {
        let mut cfg = AppConfig::default();
        cfg.executor.mode = ExecutionMode::Queue;
        apply_run_flags(&mut cfg, &run_args());
        assert_eq!(cfg.executor.mode, ExecutionMode::Queue);
    }

    #[tokio::test]
    async fn test_handle_run_succeeds_with_success_code() {
        let code = handle_run(run_args(), AppConfig::default()).await.unwrap();
        assert_eq!(code, ErrorCode::Success.as_exit_code());
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_handle_run_reports_cycle() {
        let mut args = run_args();
        args.input.expressions = vec!["x = y + 1".to_string(), "y = x + 1".to_string()];
        let err = handle_run(args, AppConfig::default()).await.unwrap_err();
        assert_eq!(err.error_code().as_exit_code(), 12);
    }
}
