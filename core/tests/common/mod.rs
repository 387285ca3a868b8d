#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use calcflow_core::executor::traits::EvaluationStrategy;
use calcflow_core::executor::{
    Evaluation, ExecutionOpts, QueueExecutor, SequentialExecutor, VariableTable,
};
use calcflow_core::expr::{AstEvaluator, EvalError, Expression};

/// Evaluate the batch strictly top to bottom with the AST evaluator,
/// committing every expression's writes before the next one runs.
pub fn evaluate_in_input_order(
    sources: &[String],
    initial: &VariableTable,
) -> Result<VariableTable, EvalError> {
    let evaluator = AstEvaluator::new();
    let mut table = initial.clone();
    for source in sources {
        let expression = Expression::parse(source)?;
        let evaluation = evaluator.evaluate(&expression, &table)?;
        table.extend(evaluation.writes);
    }
    Ok(table)
}

pub fn batch(sources: &[&str]) -> Vec<String> {
    sources.iter().map(|s| s.to_string()).collect()
}

pub fn table(pairs: &[(&str, i64)]) -> VariableTable {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn queue_executor(workers: usize) -> QueueExecutor {
    QueueExecutor::builder(Arc::new(AstEvaluator::new()))
        .opts(ExecutionOpts::default().with_max_workers(workers))
        .build()
}

pub fn sequential_executor() -> SequentialExecutor {
    SequentialExecutor::new(Arc::new(AstEvaluator::new()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Start,
    End,
}

/// AST evaluation that sleeps before returning and records when each
/// expression started and finished.
pub struct RecordingStrategy {
    inner: AstEvaluator,
    delay: Duration,
    delays: HashMap<usize, Duration>,
    log: Mutex<Vec<(usize, Mark, Instant)>>,
    indices: HashMap<String, usize>,
}

impl RecordingStrategy {
    pub fn new(sources: &[String], delay: Duration) -> Self {
        Self {
            inner: AstEvaluator::new(),
            delay,
            delays: HashMap::new(),
            log: Mutex::new(Vec::new()),
            indices: sources
                .iter()
                .enumerate()
                .map(|(i, s)| (s.trim().to_string(), i))
                .collect(),
        }
    }

    /// Use a different delay for one expression.
    pub fn with_delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    pub fn marks(&self) -> Vec<(usize, Mark)> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(i, m, _)| (*i, *m))
            .collect()
    }

    /// Position of every start and end in the recorded sequence.
    pub fn positions(&self) -> HashMap<(usize, Mark), usize> {
        self.marks()
            .into_iter()
            .enumerate()
            .map(|(pos, key)| (key, pos))
            .collect()
    }

    fn record(&self, index: usize, mark: Mark) {
        self.log.lock().unwrap().push((index, mark, Instant::now()));
    }
}

impl EvaluationStrategy for RecordingStrategy {
    fn name(&self) -> &str {
        "recording"
    }

    fn evaluate(
        &self,
        expression: &Expression,
        variables: &VariableTable,
    ) -> Result<Evaluation, EvalError> {
        let index = self.indices.get(&expression.source).copied().unwrap_or(usize::MAX);
        self.record(index, Mark::Start);
        std::thread::sleep(self.delays.get(&index).copied().unwrap_or(self.delay));
        let result = self.inner.evaluate(expression, variables);
        self.record(index, Mark::End);
        result
    }
}
