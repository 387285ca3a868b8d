use std::collections::{btree_set, BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::ExecutorError;
use crate::expr::Expression;

use super::types::VariableTable;

/// Why one expression has to wait for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Reads the value the other expression writes.
    Data,
    /// Writes a variable whose previous value the other expression still has to read.
    Anti,
    /// Writes the same variable after the other expression does.
    Output,
}

/// A labelled dependency: `from` must run after `to` because of `variable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
    pub variable: String,
}

/// Expression dependency graph (DAG once validated)
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Expression sources, indexed by batch position
    nodes: Vec<String>,

    /// Dependency edges: index -> indices it depends on
    edges: Vec<BTreeSet<usize>>,

    /// Reverse edges: index -> indices that depend on it
    reverse_edges: Vec<BTreeSet<usize>>,

    /// Every derived edge with its reason, in derivation order
    labelled: Vec<Edge>,
}

impl DependencyGraph {
    fn with_nodes(nodes: Vec<String>) -> Self {
        let n = nodes.len();
        Self {
            nodes,
            edges: vec![BTreeSet::new(); n],
            reverse_edges: vec![BTreeSet::new(); n],
            labelled: Vec::new(),
        }
    }

    /// Construct the dependency graph of an analysed batch
    ///
    /// A read of `v` binds to the nearest earlier writer of `v`. Without one,
    /// it binds to the initial table, and failing that to the first later
    /// writer (unless the reader writes `v` itself). Anything else is an
    /// undefined variable.
    ///
    /// Besides those data edges, writers of the same variable are chained in
    /// input order and the writer following the value a reader observed waits
    /// for that reader, so no wave ever contains two conflicting accesses.
    pub fn build(
        expressions: &[Expression],
        initial: &VariableTable,
    ) -> Result<Self, ExecutorError> {
        let mut graph = Self::with_nodes(expressions.iter().map(|e| e.source.clone()).collect());

        // variable -> writer indices in input order
        let mut writers: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, expression) in expressions.iter().enumerate() {
            for variable in &expression.analysis.writes {
                writers.entry(variable.as_str()).or_default().push(index);
            }
        }

        for (index, expression) in expressions.iter().enumerate() {
            for variable in &expression.analysis.reads {
                let chain = writers
                    .get(variable.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                // chain[..split] are the writers before `index`
                let split = chain.partition_point(|&w| w < index);

                let observed = if split > 0 {
                    Some(split - 1)
                } else if initial.contains_key(variable) {
                    None
                } else if split < chain.len() && !expression.analysis.writes.contains(variable) {
                    Some(split)
                } else {
                    return Err(ExecutorError::UndefinedVariable {
                        index,
                        expression: expression.source.clone(),
                        variable: variable.clone(),
                    });
                };

                if let Some(pos) = observed {
                    graph.add_edge(index, chain[pos], EdgeKind::Data, variable);
                }

                let next_writer = observed.map_or(0, |pos| pos + 1);
                if let Some(&writer) = chain.get(next_writer) {
                    graph.add_edge(writer, index, EdgeKind::Anti, variable);
                }
            }
        }

        for (variable, chain) in &writers {
            for pair in chain.windows(2) {
                graph.add_edge(pair[1], pair[0], EdgeKind::Output, variable);
            }
        }

        Ok(graph)
    }

    fn add_edge(&mut self, from: usize, to: usize, kind: EdgeKind, variable: &str) {
        if from == to {
            return;
        }
        self.edges[from].insert(to);
        self.reverse_edges[to].insert(from);
        self.labelled.push(Edge {
            from,
            to,
            kind,
            variable: variable.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self, index: usize) -> &str {
        &self.nodes[index]
    }

    /// Indices `index` must wait for
    pub fn dependencies(&self, index: usize) -> &BTreeSet<usize> {
        &self.edges[index]
    }

    /// Indices waiting for `index`
    pub fn dependents(&self, index: usize) -> &BTreeSet<usize> {
        &self.reverse_edges[index]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.labelled
    }

    /// Data edges only: `from` reads a value `to` writes
    pub fn data_edges(&self) -> impl Iterator<Item = &Edge> {
        self.labelled.iter().filter(|e| e.kind == EdgeKind::Data)
    }

    /// Detect circular dependencies using DFS
    ///
    /// Returns one cycle as a path of indices whose last element repeats the first.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of expressions, E = number of dependencies
    pub fn detect_cycle(&self) -> Option<Vec<usize>> {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        let mut on_path = vec![false; n];
        let mut path: Vec<usize> = Vec::new();
        // explicit DFS stack: node and its dependencies not yet visited
        let mut frames: Vec<(usize, btree_set::Iter<'_, usize>)> = Vec::new();

        for root in 0..n {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            on_path[root] = true;
            path.push(root);
            frames.push((root, self.edges[root].iter()));

            while let Some((node, deps)) = frames.last_mut() {
                match deps.next() {
                    // Dependency already on the current path closes a cycle
                    Some(&dep) if on_path[dep] => {
                        let pos = path.iter().position(|&x| x == dep).unwrap_or(0);
                        let mut cycle = path[pos..].to_vec();
                        cycle.push(dep);
                        return Some(cycle);
                    }
                    Some(&dep) if !visited[dep] => {
                        visited[dep] = true;
                        on_path[dep] = true;
                        path.push(dep);
                        frames.push((dep, self.edges[dep].iter()));
                    }
                    Some(_) => {}
                    None => {
                        on_path[*node] = false;
                        path.pop();
                        frames.pop();
                    }
                }
            }
        }

        None
    }

    /// Render a cycle path as `0: x = y + 1 -> 1: y = x + 1 -> 0: x = y + 1`
    pub fn format_cycle_path(&self, path: &[usize]) -> String {
        path.iter()
            .map(|&i| format!("{i}: {}", self.nodes[i]))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batch(sources: &[&str]) -> Vec<Expression> {
        sources
            .iter()
            .map(|s| Expression::parse(s).unwrap())
            .collect()
    }

    fn build(sources: &[&str]) -> Result<DependencyGraph, ExecutorError> {
        DependencyGraph::build(&batch(sources), &VariableTable::new())
    }

    fn deps(graph: &DependencyGraph, index: usize) -> Vec<usize> {
        graph.dependencies(index).iter().copied().collect()
    }

    #[test]
    fn test_data_edges_follow_last_writer() {
        let graph = build(&["x = 1", "x = 2", "y = x"]).unwrap();
        let data: Vec<(usize, usize)> = graph.data_edges().map(|e| (e.from, e.to)).collect();
        assert_eq!(data, vec![(2, 1)]);
        // the second writer of x is chained after the first
        assert_eq!(deps(&graph, 1), vec![0]);
        assert_eq!(deps(&graph, 2), vec![1]);
    }

    #[test]
    fn test_independent_expressions_have_no_edges() {
        let graph = build(&["a = 1", "b = 2", "c = 3"]).unwrap();
        assert!(graph.edges().is_empty());
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_diamond() {
        let graph = build(&["x = 5", "y = x + 2", "z = x * 2", "w = y + z"]).unwrap();
        assert_eq!(deps(&graph, 1), vec![0]);
        assert_eq!(deps(&graph, 2), vec![0]);
        assert_eq!(deps(&graph, 3), vec![1, 2]);
        assert_eq!(
            graph.dependents(0).iter().copied().collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_write_after_read_orders_later_writer() {
        // "i = 5" must not run before "x = i + 1" has read the first value
        let graph = build(&["i = 0", "x = i + 1", "i = 5"]).unwrap();
        assert_eq!(deps(&graph, 1), vec![0]);
        assert_eq!(deps(&graph, 2), vec![0, 1]);
        assert!(graph
            .edges()
            .iter()
            .any(|e| e.from == 2 && e.to == 1 && e.kind == EdgeKind::Anti));
    }

    #[test]
    fn test_initial_variables_are_external() {
        let exprs = batch(&["y = x + 1", "x = 10"]);
        let initial = VariableTable::from([("x".to_string(), 1)]);
        let graph = DependencyGraph::build(&exprs, &initial).unwrap();
        assert_eq!(graph.data_edges().count(), 0);
        // the reassignment waits for the read of the initial value
        assert_eq!(deps(&graph, 1), vec![0]);
    }

    #[test]
    fn test_forward_reference_binds_to_first_later_writer() {
        let graph = build(&["y = x", "x = 1", "x = 2"]).unwrap();
        assert_eq!(deps(&graph, 0), vec![1]);
        assert_eq!(deps(&graph, 2), vec![0, 1]);
    }

    #[test]
    fn test_compound_without_prior_value_is_undefined() {
        let err = build(&["x += 1", "x = 5"]).unwrap_err();
        assert_eq!(
            err,
            ExecutorError::UndefinedVariable {
                index: 0,
                expression: "x += 1".into(),
                variable: "x".into(),
            }
        );
    }

    #[test]
    fn test_undefined_variable() {
        let err = build(&["x = 1", "y = x + q"]).unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::UndefinedVariable { index: 1, ref variable, .. } if variable == "q"
        ));
    }

    #[test]
    fn test_detect_cycle() {
        let graph = build(&["x = y + 1", "y = x + 1"]).unwrap();
        let cycle = graph.detect_cycle().unwrap();
        assert_eq!(cycle, vec![0, 1, 0]);
        assert_eq!(
            graph.format_cycle_path(&cycle),
            "0: x = y + 1 -> 1: y = x + 1 -> 0: x = y + 1"
        );
    }

    #[test]
    fn test_detect_cycle_on_long_chain() {
        let n = 50_000;
        let sources: Vec<String> = (0..n)
            .map(|i| format!("x{i} = x{} + 1", (i + 1) % n))
            .collect();
        let exprs: Vec<Expression> = sources
            .iter()
            .map(|s| Expression::parse(s).unwrap())
            .collect();
        let graph = DependencyGraph::build(&exprs, &VariableTable::new()).unwrap();

        let cycle = graph.detect_cycle().unwrap();
        assert_eq!(cycle.len(), n + 1);
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn test_no_cycle_in_long_chain() {
        let sources: Vec<String> = std::iter::once("x0 = 1".to_string())
            .chain((1..50_000).map(|i| format!("x{i} = x{} + 1", i - 1)))
            .collect();
        let exprs: Vec<Expression> = sources
            .iter()
            .map(|s| Expression::parse(s).unwrap())
            .collect();
        let graph = DependencyGraph::build(&exprs, &VariableTable::new()).unwrap();
        assert_eq!(graph.detect_cycle(), None);
    }

    #[test]
    fn test_acyclic_has_no_cycle() {
        let graph = build(&["x = 1", "y = x", "z = y + x"]).unwrap();
        assert!(graph.detect_cycle().is_none());
    }
}
