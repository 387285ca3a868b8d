use std::sync::Arc;

use crate::error::ExecutorError;
use crate::expr::Expression;

use super::graph::DependencyGraph;
use super::scheduler::schedule;
use super::types::VariableTable;

/// A validated batch: analysed expressions, their dependency graph and waves.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub expressions: Arc<Vec<Expression>>,
    pub graph: DependencyGraph,
    pub waves: Vec<Vec<usize>>,
}

impl ExecutionPlan {
    /// Analyse, build the graph and schedule; fails before anything is evaluated.
    pub fn build<S: AsRef<str>>(
        sources: &[S],
        initial: &VariableTable,
    ) -> Result<Self, ExecutorError> {
        let expressions = sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let source = source.as_ref();
                Expression::parse(source).map_err(|e| ExecutorError::Parse {
                    index,
                    expression: source.trim().to_string(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let graph = DependencyGraph::build(&expressions, initial)?;
        let waves = schedule(&graph)?;

        tracing::debug!(
            expressions = expressions.len(),
            waves = waves.len(),
            edges = graph.edges().len(),
            "execution plan built"
        );

        Ok(Self {
            expressions: Arc::new(expressions),
            graph,
            waves,
        })
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Expression indices in execution order (waves flattened).
    pub fn linear_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.waves.iter().flatten().copied()
    }

    /// True when some expression reads a value written further down the batch.
    pub fn has_forward_references(&self) -> bool {
        self.graph.data_edges().any(|edge| edge.to > edge.from)
    }

    /// Order for one-at-a-time execution: input order, unless a forward
    /// reference makes it impossible, in which case the waves flattened.
    pub fn sequential_order(&self) -> Vec<usize> {
        if self.has_forward_references() {
            self.linear_order().collect()
        } else {
            (0..self.len()).collect()
        }
    }

    /// Wave number of every expression.
    pub fn wave_of(&self) -> Vec<usize> {
        let mut wave_of = vec![0; self.len()];
        for (wave, indices) in self.waves.iter().enumerate() {
            for &index in indices {
                wave_of[index] = wave;
            }
        }
        wave_of
    }
}
