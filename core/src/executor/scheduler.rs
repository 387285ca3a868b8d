use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::error::ExecutorError;
use crate::expr::{EvalError, Expression};

use super::graph::DependencyGraph;
use super::traits::EvaluationStrategy;
use super::types::{Evaluation, VariableTable};

/// Group the graph into execution waves using Kahn's algorithm
///
/// Every wave holds the expressions whose dependencies all sit in earlier
/// waves, so expressions in the same wave can run in parallel. Indices within
/// a wave are sorted for stable output.
///
/// # Algorithm
///
/// 1. Calculate in-degree for all nodes
/// 2. Find all nodes with in-degree 0 (first wave)
/// 3. Remove these nodes and update in-degrees
/// 4. Repeat until all nodes processed
///
/// # Time Complexity
///
/// O(V + E) where V = number of expressions, E = number of dependencies
pub fn schedule(graph: &DependencyGraph) -> Result<Vec<Vec<usize>>, ExecutorError> {
    let mut in_degree: Vec<usize> = (0..graph.len())
        .map(|i| graph.dependencies(i).len())
        .collect();

    let mut waves: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = (0..graph.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut processed = 0;

    while !current.is_empty() {
        processed += current.len();

        let mut next = Vec::new();
        for &index in &current {
            for &dependent in graph.dependents(index) {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    next.push(dependent);
                }
            }
        }
        next.sort_unstable();

        waves.push(std::mem::replace(&mut current, next));
    }

    // Nodes left over sit on or behind a cycle
    if processed != graph.len() {
        let indices = graph.detect_cycle().unwrap_or_else(|| {
            (0..graph.len()).filter(|&i| in_degree[i] > 0).collect()
        });
        let path = graph.format_cycle_path(&indices);
        let mut indices = indices;
        indices.sort_unstable();
        indices.dedup();
        return Err(ExecutorError::CircularDependency { indices, path });
    }

    Ok(waves)
}

/// Outcome of one worker
#[derive(Debug)]
pub struct WorkerOutcome {
    pub index: usize,
    pub result: Result<Evaluation, EvalError>,
    pub duration: Duration,
}

/// Evaluate a single wave of expressions in parallel
///
/// # Arguments
///
/// * `indices` - Expressions of this wave
/// * `expressions` - The analysed batch
/// * `snapshot` - Table as committed after the previous wave
/// * `strategy` - Evaluation strategy shared by all workers
/// * `max_concurrency` - Maximum number of concurrent evaluations
/// * `on_complete` - Called on the coordinator as each worker finishes
///
/// # Returns
///
/// Every worker's outcome, in completion order. All in-flight workers are
/// drained even when some of them fail. `Err` is returned only for worker
/// join failures and timeouts; a timeout after a worker already failed
/// reports the lowest failing index as an evaluation error instead.
pub async fn execute_wave_parallel<F>(
    wave_id: usize,
    indices: &[usize],
    expressions: &Arc<Vec<Expression>>,
    snapshot: &Arc<VariableTable>,
    strategy: &Arc<dyn EvaluationStrategy>,
    max_concurrency: usize,
    timeout: Option<Duration>,
    mut on_complete: F,
) -> Result<Vec<WorkerOutcome>, ExecutorError>
where
    F: FnMut(&WorkerOutcome),
{
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

    for &index in indices {
        let sem = sem.clone();
        let expressions = expressions.clone();
        let snapshot = snapshot.clone();
        let strategy = strategy.clone();

        futs.push(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|_| ExecutorError::Worker("semaphore closed unexpectedly".into()))?;

            tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                let expression = &expressions[index];
                tracing::debug!(index, expression = %expression.source, "worker evaluating");
                let result = strategy.evaluate(expression, &snapshot);
                WorkerOutcome {
                    index,
                    result,
                    duration: start.elapsed(),
                }
            })
            .await
            .map_err(|e| ExecutorError::Worker(format!("expression {index}: {e}")))
        });
    }

    let deadline = timeout.map(|t| tokio::time::Instant::now() + t);
    let mut outcomes: Vec<WorkerOutcome> = Vec::with_capacity(indices.len());
    let mut join_error: Option<ExecutorError> = None;

    loop {
        let next = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, futs.next()).await {
                Ok(next) => next,
                Err(_) => {
                    // a failure seen before the deadline is the better report
                    let failed = outcomes
                        .iter()
                        .filter_map(|o| o.result.as_ref().err().map(|e| (o.index, e)))
                        .min_by_key(|(index, _)| *index);
                    if let Some((index, source)) = failed {
                        tracing::warn!(wave = wave_id, index, "wave timed out after a failure");
                        return Err(ExecutorError::Evaluation {
                            index,
                            expression: expressions[index].source.clone(),
                            source: source.clone(),
                        });
                    }

                    let mut pending: Vec<usize> = indices
                        .iter()
                        .copied()
                        .filter(|i| !outcomes.iter().any(|o| o.index == *i))
                        .collect();
                    pending.sort_unstable();
                    tracing::warn!(wave = wave_id, ?pending, "wave timed out");
                    return Err(ExecutorError::WaveTimeout {
                        wave: wave_id,
                        pending,
                        timeout_ms: timeout.map_or(0, |t| t.as_millis() as u64),
                    });
                }
            },
            None => futs.next().await,
        };

        match next {
            Some(Ok(outcome)) => {
                on_complete(&outcome);
                outcomes.push(outcome);
            }
            Some(Err(e)) => {
                tracing::warn!(wave = wave_id, error = %e, "worker failed to join");
                join_error.get_or_insert(e);
            }
            None => break,
        }
    }

    match join_error {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::AstEvaluator;
    use pretty_assertions::assert_eq;

    fn waves_of(sources: &[&str]) -> Result<Vec<Vec<usize>>, ExecutorError> {
        let exprs: Vec<Expression> = sources
            .iter()
            .map(|s| Expression::parse(s).unwrap())
            .collect();
        let graph = DependencyGraph::build(&exprs, &VariableTable::new())?;
        schedule(&graph)
    }

    #[test]
    fn test_two_waves() {
        assert_eq!(
            waves_of(&["x = 1", "y = 2", "z = x + y"]).unwrap(),
            vec![vec![0, 1], vec![2]]
        );
    }

    #[test]
    fn test_diamond_waves() {
        assert_eq!(
            waves_of(&["x = 5", "y = x + 2", "z = x * 2", "w = y + z"]).unwrap(),
            vec![vec![0], vec![1, 2], vec![3]]
        );
    }

    #[test]
    fn test_chain_is_one_per_wave() {
        let waves = waves_of(&["x0 = 1", "x1 = x0 * 2", "x2 = x1 * 2", "x3 = x2 * 2"]).unwrap();
        assert_eq!(waves, vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_every_expression_in_exactly_one_wave() {
        let sources = [
            "a = 1", "b = 2", "c = 3", "x = a + b", "y = b + c", "z = a + c", "p = x + y",
            "q = y + z", "r = x + z", "result = p + q + r",
        ];
        let waves = waves_of(&sources).unwrap();
        let mut all: Vec<usize> = waves.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..sources.len()).collect::<Vec<_>>());
        assert_eq!(waves.len(), 4);
    }

    #[test]
    fn test_writes_to_same_variable_never_share_a_wave() {
        let waves = waves_of(&["x = 1", "y = 2", "x += y", "y *= 2"]).unwrap();
        assert_eq!(waves, vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let err = waves_of(&["x = y + 1", "y = x + 1"]).unwrap_err();
        match err {
            ExecutorError::CircularDependency { indices, path } => {
                assert_eq!(indices, vec![0, 1]);
                assert!(path.contains("x = y + 1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cycle_behind_independent_work() {
        let err = waves_of(&["a = 1", "b = c + a", "c = b + 1", "d = a"]).unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::CircularDependency { ref indices, .. } if indices == &vec![1, 2]
        ));
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(waves_of(&[]).unwrap(), Vec::<Vec<usize>>::new());
    }

    #[tokio::test]
    async fn test_execute_wave_parallel_drains_failures() {
        let exprs: Arc<Vec<Expression>> = Arc::new(
            ["a = 1", "b = 1 / 0", "c = 3"]
                .iter()
                .map(|s| Expression::parse(s).unwrap())
                .collect(),
        );
        let snapshot = Arc::new(VariableTable::new());
        let strategy: Arc<dyn EvaluationStrategy> = Arc::new(AstEvaluator::new());
        let mut seen = Vec::new();

        let mut outcomes = execute_wave_parallel(
            0,
            &[0, 1, 2],
            &exprs,
            &snapshot,
            &strategy,
            2,
            None,
            |o| seen.push(o.index),
        )
        .await
        .unwrap();

        outcomes.sort_by_key(|o| o.index);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(seen.len(), 3);
        assert_eq!(outcomes[0].result.as_ref().unwrap().value, 1);
        assert_eq!(outcomes[1].result, Err(EvalError::DivisionByZero));
        assert_eq!(outcomes[2].result.as_ref().unwrap().value, 3);
    }
}
