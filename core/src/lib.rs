//! calcflow core: expression analysis, dependency scheduling and execution.

pub mod config;
pub mod error;
pub mod executor;
pub mod expr;

pub use config::AppConfig;
pub use error::{CliError, ErrorCode, ExecutorError};
pub use executor::{
    ExecutionMode, ExecutionOpts, ExecutionReport, ExpressionExecutor, QueueExecutor,
    SequentialExecutor, VariableTable,
};
pub use expr::{AstEvaluator, EvalError, Expression, ParseError};
