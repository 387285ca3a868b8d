use calcflow_core::config::AppConfig;
use calcflow_core::error::{CliError, ErrorCode};
use calcflow_core::executor::Value;
use calcflow_plugins::Calculator;

use crate::commands::cli::EvalArgs;
use crate::input;

pub async fn evaluate_one(args: &EvalArgs, mut cfg: AppConfig) -> Result<Option<Value>, CliError> {
    if let Some(evaluator) = args.evaluator {
        cfg.executor.evaluator = evaluator.into();
    }
    let variables = input::parse_vars(&args.vars)?;
    let calculator = Calculator::from_config(&cfg).with_variables(variables);
    Ok(calculator.evaluate(&args.expression).await?)
}

/// Handle eval command
pub async fn handle_eval(args: EvalArgs, cfg: AppConfig) -> Result<i32, CliError> {
    if let Some(value) = evaluate_one(&args, cfg).await? {
        println!("{value}");
    }
    Ok(ErrorCode::Success.as_exit_code())
}
