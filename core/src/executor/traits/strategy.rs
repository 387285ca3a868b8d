use crate::executor::types::{Evaluation, VariableTable};
use crate::expr::{EvalError, Expression};

/// Pluggable arithmetic evaluator.
///
/// Implementations must be deterministic for a given expression and snapshot
/// and must not mutate shared state; the executor calls them concurrently from
/// worker threads.
pub trait EvaluationStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate one expression against a read-only snapshot.
    fn evaluate(
        &self,
        expression: &Expression,
        variables: &VariableTable,
    ) -> Result<Evaluation, EvalError>;
}

/// Concurrency control strategy plugin
pub trait ConcurrencyStrategyPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn calculate_concurrency(&self, context: &ConcurrencyContext) -> usize;
}

#[derive(Debug, Clone)]
pub struct ConcurrencyContext {
    pub available_cpus: usize,
    pub wave_size: usize,
    pub base_concurrency: usize,
}
