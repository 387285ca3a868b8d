use std::collections::BTreeSet;

use serde::Serialize;

use super::ast::{AssignOp, Statement};
use super::error::ParseError;
use super::parser::parse_statement;

/// Variables an expression assigns and reads, derived without evaluating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    /// The assigned variable.
    pub target: String,
    /// `target` plus every variable stepped inside the right-hand side.
    pub writes: BTreeSet<String>,
    /// Every variable whose current value the expression needs.
    pub reads: BTreeSet<String>,
}

impl Analysis {
    pub fn of(statement: &Statement) -> Self {
        let mut writes = BTreeSet::new();
        let mut reads = BTreeSet::new();

        match statement {
            Statement::Assign { target, op, value } => {
                writes.insert(target.clone());
                if let AssignOp::Compound(_) = op {
                    reads.insert(target.clone());
                }
                value.for_each_variable(&mut |name| {
                    reads.insert(name.to_string());
                });
                value.for_each_step(&mut |name, _, _| {
                    writes.insert(name.to_string());
                });
            }
            Statement::Step { target, .. } => {
                writes.insert(target.clone());
                reads.insert(target.clone());
            }
        }

        Self {
            target: statement.target().to_string(),
            writes,
            reads,
        }
    }
}

/// An analysed batch item: source text, parsed statement and its analysis.
#[derive(Debug, Clone)]
pub struct Expression {
    pub source: String,
    pub statement: Statement,
    pub analysis: Analysis,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let statement = parse_statement(source)?;
        let analysis = Analysis::of(&statement);
        Ok(Self {
            source: source.trim().to_string(),
            statement,
            analysis,
        })
    }

    pub fn target(&self) -> &str {
        &self.analysis.target
    }
}

/// Extract the assigned variable and the read set of one expression.
pub fn analyze(source: &str) -> Result<Analysis, ParseError> {
    parse_statement(source).map(|statement| Analysis::of(&statement))
}
