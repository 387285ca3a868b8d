use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ExecutorError;

use super::plan::ExecutionPlan;
use super::progress::ProgressMonitor;
use super::scheduler::execute_wave_parallel;
use super::traits::{
    ConcurrencyContext, ConcurrencyStrategyPlugin, EvaluationStrategy, OutputRendererPlugin,
    RenderEvent,
};
use super::types::{
    ExecutionMode, ExecutionOpts, ExecutionReport, ExpressionResult, VariableTable,
};

/// Executes a batch of assignment expressions against an initial table.
#[async_trait]
pub trait ExpressionExecutor: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    /// Execute the batch and report the final table together with run details.
    async fn run(
        &self,
        expressions: &[String],
        initial: &VariableTable,
    ) -> Result<ExecutionReport, ExecutorError>;

    /// Execute the batch and return only the final table.
    async fn execute(
        &self,
        expressions: &[String],
        initial: &VariableTable,
    ) -> Result<VariableTable, ExecutorError> {
        Ok(self.run(expressions, initial).await?.variables)
    }
}

/// Shared plumbing of both executors: strategy, options and event emission.
struct RunSupport {
    strategy: Arc<dyn EvaluationStrategy>,
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

impl RunSupport {
    fn run_id(&self) -> String {
        self.opts
            .run_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }

    fn emit_run_start(&self, run_id: &str, mode: ExecutionMode, waves: &[Vec<usize>], total: usize) {
        self.emit(RenderEvent::RunStart {
            run_id: run_id.to_string(),
            mode,
            total_expressions: total,
            total_waves: waves.len(),
        });
        self.emit(RenderEvent::Plan {
            run_id: run_id.to_string(),
            waves: waves.to_vec(),
        });
    }

    fn emit_wave_start(&self, run_id: &str, wave_id: usize, indices: &[usize]) {
        self.emit(RenderEvent::WaveStart {
            run_id: run_id.to_string(),
            wave_id,
            indices: indices.to_vec(),
        });
    }

    fn emit_wave_end(&self, run_id: &str, wave_id: usize, committed: VariableTable) {
        self.emit(RenderEvent::WaveEnd {
            run_id: run_id.to_string(),
            wave_id,
            committed,
        });
    }

    fn finish(&self, run_id: &str, result: &Result<ExecutionReport, ExecutorError>) {
        match result {
            Ok(report) => {
                tracing::info!(
                    run_id,
                    mode = %report.mode,
                    expressions = report.total_expressions,
                    waves = report.waves.len(),
                    duration_ms = report.duration_ms,
                    "run completed"
                );
                self.emit(RenderEvent::RunEnd {
                    run_id: run_id.to_string(),
                    report: report.clone(),
                });
            }
            Err(e) => {
                tracing::error!(run_id, error = %e, code = e.error_code().as_u16(), "run aborted");
                self.emit(RenderEvent::RunFailed {
                    run_id: run_id.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Wave-parallel executor
///
/// Expressions of one wave are evaluated concurrently on the blocking pool
/// against the table committed after the previous wave. The wave's writes are
/// committed in index order once every worker has finished.
pub struct QueueExecutor {
    support: RunSupport,
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategyPlugin>>,
}

pub struct QueueExecutorBuilder {
    strategy: Arc<dyn EvaluationStrategy>,
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategyPlugin>>,
}

impl QueueExecutor {
    pub fn new(strategy: Arc<dyn EvaluationStrategy>) -> Self {
        Self::builder(strategy).build()
    }

    pub fn builder(strategy: Arc<dyn EvaluationStrategy>) -> QueueExecutorBuilder {
        QueueExecutorBuilder::new(strategy)
    }

    /// Concurrency for a wave of `wave_size` expressions, never above the
    /// resolved worker count
    fn wave_concurrency(&self, wave_size: usize) -> usize {
        let base = self.support.opts.effective_workers();
        self.concurrency_strategy
            .as_ref()
            .map(|strategy| {
                strategy.calculate_concurrency(&ConcurrencyContext {
                    available_cpus: num_cpus::get(),
                    wave_size,
                    base_concurrency: base,
                })
            })
            .unwrap_or(base)
            .clamp(1, base)
    }

    async fn run_waves(
        &self,
        run_id: &str,
        expressions: &[String],
        initial: &VariableTable,
    ) -> Result<ExecutionReport, ExecutorError> {
        let plan = ExecutionPlan::build(expressions, initial)?;
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();
        let total_waves = plan.waves.len();

        tracing::info!(
            run_id,
            expressions = plan.len(),
            waves = total_waves,
            "queue run started"
        );
        self.support
            .emit_run_start(run_id, ExecutionMode::Queue, &plan.waves, plan.len());

        let progress = ProgressMonitor::new(plan.len(), self.support.opts.progress_bar);
        let mut table = Arc::new(initial.clone());

        for (wave_id, indices) in plan.waves.iter().enumerate() {
            let workers = self.wave_concurrency(indices.len());
            tracing::info!(run_id, wave = wave_id, size = indices.len(), workers, "wave started");
            progress.update_wave(wave_id, total_waves);
            self.support.emit_wave_start(run_id, wave_id, indices);

            let outcomes = execute_wave_parallel(
                wave_id,
                indices,
                &plan.expressions,
                &table,
                &self.support.strategy,
                workers,
                self.support.opts.wave_timeout,
                |outcome| {
                    progress.complete_expression();
                    if let Ok(evaluation) = &outcome.result {
                        tracing::debug!(
                            run_id,
                            index = outcome.index,
                            target = %evaluation.target,
                            value = evaluation.value,
                            "expression evaluated"
                        );
                        self.support.emit(RenderEvent::ExpressionComplete {
                            run_id: run_id.to_string(),
                            result: ExpressionResult {
                                index: outcome.index,
                                wave: wave_id,
                                evaluation: evaluation.clone(),
                                duration_us: outcome.duration.as_micros() as u64,
                            },
                        });
                    }
                },
            )
            .await;

            let mut outcomes = match outcomes {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    progress.finish(false);
                    tracing::debug!(run_id, committed = ?table, "discarding partial table");
                    return Err(e);
                }
            };
            outcomes.sort_by_key(|o| o.index);

            let mut failures = outcomes
                .iter()
                .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)));
            if let Some((index, source)) = failures.next() {
                for (other, error) in failures {
                    tracing::warn!(run_id, wave = wave_id, index = other, error = %error, "expression failed");
                }
                progress.finish(false);
                tracing::debug!(run_id, committed = ?table, "discarding partial table");
                return Err(ExecutorError::Evaluation {
                    index,
                    expression: plan.expressions[index].source.clone(),
                    source: source.clone(),
                });
            }

            // Every worker has finished, so the snapshot is no longer shared
            let committed = Arc::make_mut(&mut table);
            let mut wave_writes = VariableTable::new();
            for outcome in outcomes {
                if let Ok(evaluation) = outcome.result {
                    for (name, value) in evaluation.writes {
                        committed.insert(name.clone(), value);
                        wave_writes.insert(name, value);
                    }
                }
            }
            tracing::debug!(run_id, wave = wave_id, writes = ?wave_writes, "wave committed");
            self.support.emit_wave_end(run_id, wave_id, wave_writes);
        }

        progress.finish(true);

        Ok(ExecutionReport {
            run_id: run_id.to_string(),
            mode: ExecutionMode::Queue,
            variables: Arc::try_unwrap(table).unwrap_or_else(|shared| (*shared).clone()),
            total_expressions: plan.len(),
            waves: plan.waves,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl ExpressionExecutor for QueueExecutor {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Queue
    }

    async fn run(
        &self,
        expressions: &[String],
        initial: &VariableTable,
    ) -> Result<ExecutionReport, ExecutorError> {
        let run_id = self.support.run_id();
        let result = self.run_waves(&run_id, expressions, initial).await;
        self.support.finish(&run_id, &result);
        result
    }
}

impl QueueExecutorBuilder {
    pub fn new(strategy: Arc<dyn EvaluationStrategy>) -> Self {
        Self {
            strategy,
            opts: ExecutionOpts::default(),
            renderer: None,
            concurrency_strategy: None,
        }
    }

    pub fn opts(mut self, opts: ExecutionOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn concurrency_strategy(mut self, strategy: Arc<dyn ConcurrencyStrategyPlugin>) -> Self {
        self.concurrency_strategy = Some(strategy);
        self
    }

    pub fn build(self) -> QueueExecutor {
        QueueExecutor {
            support: RunSupport {
                strategy: self.strategy,
                opts: self.opts,
                renderer: self.renderer,
            },
            concurrency_strategy: self.concurrency_strategy,
        }
    }
}

/// One-at-a-time executor
///
/// Validates exactly like [`QueueExecutor`], then evaluates the expressions
/// in input order, committing after each one. Batches with forward
/// references run in the plan's flattened wave order instead.
pub struct SequentialExecutor {
    support: RunSupport,
}

impl SequentialExecutor {
    pub fn new(strategy: Arc<dyn EvaluationStrategy>) -> Self {
        Self::with_opts(strategy, ExecutionOpts::default())
    }

    pub fn with_opts(strategy: Arc<dyn EvaluationStrategy>, opts: ExecutionOpts) -> Self {
        Self {
            support: RunSupport {
                strategy,
                opts,
                renderer: None,
            },
        }
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.support.renderer = Some(renderer);
        self
    }

    fn run_linear(
        &self,
        run_id: &str,
        expressions: &[String],
        initial: &VariableTable,
    ) -> Result<ExecutionReport, ExecutorError> {
        let plan = ExecutionPlan::build(expressions, initial)?;
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();

        // every expression commits on its own
        let steps: Vec<Vec<usize>> = plan
            .sequential_order()
            .into_iter()
            .map(|index| vec![index])
            .collect();

        tracing::info!(run_id, expressions = plan.len(), "sequential run started");
        self.support
            .emit_run_start(run_id, ExecutionMode::Sequential, &steps, plan.len());

        let progress = ProgressMonitor::new(plan.len(), self.support.opts.progress_bar);
        let mut table = initial.clone();

        for (step, indices) in steps.iter().enumerate() {
            let index = indices[0];
            let expression = &plan.expressions[index];
            progress.update_wave(step, steps.len());
            self.support.emit_wave_start(run_id, step, indices);

            let begin = Instant::now();
            let evaluation = match self.support.strategy.evaluate(expression, &table) {
                Ok(evaluation) => evaluation,
                Err(source) => {
                    progress.finish(false);
                    tracing::debug!(run_id, committed = ?table, "discarding partial table");
                    return Err(ExecutorError::Evaluation {
                        index,
                        expression: expression.source.clone(),
                        source,
                    });
                }
            };
            progress.complete_expression();
            tracing::debug!(
                run_id,
                index,
                target = %evaluation.target,
                value = evaluation.value,
                "expression evaluated"
            );

            table.extend(evaluation.writes.clone());
            self.support.emit(RenderEvent::ExpressionComplete {
                run_id: run_id.to_string(),
                result: ExpressionResult {
                    index,
                    wave: step,
                    evaluation: evaluation.clone(),
                    duration_us: begin.elapsed().as_micros() as u64,
                },
            });
            self.support.emit_wave_end(run_id, step, evaluation.writes);
        }

        progress.finish(true);

        Ok(ExecutionReport {
            run_id: run_id.to_string(),
            mode: ExecutionMode::Sequential,
            variables: table,
            waves: steps,
            total_expressions: plan.len(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl ExpressionExecutor for SequentialExecutor {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Sequential
    }

    async fn run(
        &self,
        expressions: &[String],
        initial: &VariableTable,
    ) -> Result<ExecutionReport, ExecutorError> {
        let run_id = self.support.run_id();
        let result = self.run_linear(&run_id, expressions, initial);
        self.support.finish(&run_id, &result);
        result
    }
}
