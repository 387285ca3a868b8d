use std::sync::Arc;

use calcflow_core::config::{AppConfig, EvaluatorKind};
use calcflow_core::error::ExecutorError;
use calcflow_core::executor::{
    ExecutionMode, ExecutionOpts, ExpressionExecutor, Value, VariableTable,
};
use calcflow_core::expr::Expression;

use crate::factory::build_executor;

/// Convenience front end over a configured executor.
///
/// Every call starts from the same initial table; nothing is carried over
/// between calls.
pub struct Calculator {
    executor: Arc<dyn ExpressionExecutor>,
    variables: VariableTable,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl Calculator {
    pub fn new(executor: Arc<dyn ExpressionExecutor>) -> Self {
        Self {
            executor,
            variables: VariableTable::new(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(build_executor(cfg, ExecutionOpts::default(), None))
    }

    pub fn with_strategy(evaluator: EvaluatorKind, mode: ExecutionMode) -> Self {
        let mut cfg = AppConfig::default();
        cfg.executor.evaluator = evaluator;
        cfg.executor.mode = mode;
        Self::from_config(&cfg)
    }

    /// Initial variables visible to every evaluation.
    pub fn with_variables(mut self, variables: VariableTable) -> Self {
        self.variables = variables;
        self
    }

    /// Value assigned by a single expression, `None` when it cannot be
    /// analysed for a target.
    pub async fn evaluate(&self, expression: &str) -> Result<Option<Value>, ExecutorError> {
        let table = self.evaluate_multiple(&[expression.to_string()]).await?;
        let target = Expression::parse(expression).ok();
        Ok(target.and_then(|e| table.get(e.target()).copied()))
    }

    pub async fn evaluate_multiple(
        &self,
        expressions: &[String],
    ) -> Result<VariableTable, ExecutorError> {
        self.executor.execute(expressions, &self.variables).await
    }
}
