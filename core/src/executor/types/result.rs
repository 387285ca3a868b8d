use serde::Serialize;

use super::config::ExecutionMode;
use super::variables::{Value, VariableTable};

/// Outcome of evaluating one expression against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// The assigned variable
    pub target: String,

    /// Value assigned to `target` by the assignment itself
    pub value: Value,

    /// Final value of every variable the expression wrote, `target` included
    pub writes: VariableTable,
}

/// Result of executing one batch
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Run identifier (also used in rendered events)
    pub run_id: String,

    /// Executor that produced the report
    pub mode: ExecutionMode,

    /// Final variable table: initial variables overlaid with every write of the batch
    pub variables: VariableTable,

    /// Execution waves (expression indices) in the order they were committed
    pub waves: Vec<Vec<usize>>,

    /// Number of expressions in the batch
    pub total_expressions: usize,

    /// RFC 3339 start time
    pub started_at: String,

    /// Total execution duration in milliseconds
    pub duration_ms: u64,
}

/// Result of evaluating a single expression inside a run, as reported to renderers
#[derive(Debug, Clone, Serialize)]
pub struct ExpressionResult {
    pub index: usize,
    pub wave: usize,
    pub evaluation: Evaluation,
    pub duration_us: u64,
}
