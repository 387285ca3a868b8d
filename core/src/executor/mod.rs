//! Dependency-aware batch executor
//!
//! Runs a batch of assignment expressions so that the final table equals the
//! one produced by evaluating them one after another, while expressions with
//! no conflicting accesses are evaluated concurrently.
//!
//! # Architecture
//!
//! ```text
//! &[String]
//!   ↓
//! Expression::parse() → Analysis { target, writes, reads }
//!   ↓
//! DependencyGraph::build() → data / anti / output edges, undefined variables
//!   ↓
//! schedule() → Vec<Vec<usize>> (waves), circular dependencies
//!   ↓
//! QueueExecutor: execute_wave_parallel() per wave → commit in index order
//!   ↓
//! ExecutionReport { variables, waves, .. }
//! ```

mod engine;
mod graph;
mod plan;
mod progress;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::{ExpressionExecutor, QueueExecutor, QueueExecutorBuilder, SequentialExecutor};
pub use graph::{DependencyGraph, Edge, EdgeKind};
pub use plan::ExecutionPlan;
pub use progress::ProgressMonitor;
pub use scheduler::{execute_wave_parallel, schedule, WorkerOutcome};
pub use types::{
    Evaluation, ExecutionMode, ExecutionOpts, ExecutionReport, ExpressionResult, Value,
    VariableTable,
};
