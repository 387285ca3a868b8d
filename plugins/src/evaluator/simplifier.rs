use std::fmt;
use std::sync::OnceLock;

use calcflow_core::expr::EvalError;
use regex::Regex;

use super::tokens::{lex, render, Lexeme};

/// Statement forms recognised before simplification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// `x = rhs`
    Assign { target: String, value: String },
    /// `x op= rhs`
    Compound {
        target: String,
        op: char,
        value: String,
    },
    /// `x++`, `++x`, `x--`, `--x`
    Step { target: String, step: &'static str },
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Assign { target, value } => write!(f, "{target} = {value}"),
            Shape::Compound { target, op, value } => write!(f, "{target} {op}= {value}"),
            Shape::Step { target, step } => write!(f, "{target}{step}"),
        }
    }
}

/// Primitive `name = rhs` steps, run in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simplified {
    pub steps: Vec<String>,
    /// Step that performs the statement's own assignment
    pub primary: usize,
}

impl Simplified {
    fn single(step: String) -> Self {
        Self {
            steps: vec![step],
            primary: 0,
        }
    }
}

/// One link of the simplification chain.
///
/// Returns `Ok(None)` to pass the statement on to the next handler.
pub trait SimplifyHandler: Send + Sync {
    fn name(&self) -> &str;

    fn handle(
        &self,
        shape: &Shape,
        chain: &ExpressionSimplifier,
    ) -> Result<Option<Simplified>, EvalError>;
}

fn step_line(name: &str, step: &str) -> String {
    let op = if step == "++" { '+' } else { '-' };
    format!("{name} = {name} {op} 1")
}

/// `x++` and friends as a statement of their own.
pub struct StandaloneStepHandler;

impl SimplifyHandler for StandaloneStepHandler {
    fn name(&self) -> &str {
        "standalone-step"
    }

    fn handle(
        &self,
        shape: &Shape,
        _chain: &ExpressionSimplifier,
    ) -> Result<Option<Simplified>, EvalError> {
        Ok(match shape {
            Shape::Step { target, step } => Some(Simplified::single(step_line(target, step))),
            _ => None,
        })
    }
}

/// `x op= rhs` becomes `x = x op (rhs)`, which is then simplified again.
pub struct CompoundAssignmentHandler;

impl SimplifyHandler for CompoundAssignmentHandler {
    fn name(&self) -> &str {
        "compound-assignment"
    }

    fn handle(
        &self,
        shape: &Shape,
        chain: &ExpressionSimplifier,
    ) -> Result<Option<Simplified>, EvalError> {
        let Shape::Compound { target, op, value } = shape else {
            return Ok(None);
        };
        let expanded = Shape::Assign {
            target: target.clone(),
            value: format!("{target} {op} ({value})"),
        };
        chain.dispatch(&expanded).map(Some)
    }
}

/// Plain assignment without any embedded step; kept as is.
pub struct SimpleAssignmentHandler;

impl SimplifyHandler for SimpleAssignmentHandler {
    fn name(&self) -> &str {
        "simple-assignment"
    }

    fn handle(
        &self,
        shape: &Shape,
        _chain: &ExpressionSimplifier,
    ) -> Result<Option<Simplified>, EvalError> {
        let Shape::Assign { target, value } = shape else {
            return Ok(None);
        };
        if lex(value)?.iter().any(|l| matches!(l, Lexeme::Step(_))) {
            return Ok(None);
        }
        Ok(Some(Simplified::single(format!("{target} = {value}"))))
    }
}

/// Pulls embedded steps out of the right-hand side: prefix steps run before
/// the assignment, postfix steps after it, each in source order.
pub struct IncrementExtractionHandler;

impl SimplifyHandler for IncrementExtractionHandler {
    fn name(&self) -> &str {
        "increment-extraction"
    }

    fn handle(
        &self,
        shape: &Shape,
        _chain: &ExpressionSimplifier,
    ) -> Result<Option<Simplified>, EvalError> {
        let Shape::Assign { target, value } = shape else {
            return Ok(None);
        };

        let lexemes = lex(value)?;
        let mut prefix = Vec::new();
        let mut postfix = Vec::new();
        let mut rest: Vec<Lexeme> = Vec::with_capacity(lexemes.len());

        for (i, lexeme) in lexemes.iter().enumerate() {
            let Lexeme::Step(step) = lexeme else {
                rest.push(lexeme.clone());
                continue;
            };
            let next = lexemes.get(i + 1);
            match (rest.last(), next) {
                (Some(Lexeme::Ident(name)), next) if !next.is_some_and(Lexeme::is_ident) => {
                    postfix.push(step_line(name, step));
                }
                (_, Some(Lexeme::Ident(name))) => prefix.push(step_line(name, step)),
                _ => {
                    return Err(EvalError::Unsupported(format!(
                        "'{step}' without a variable in '{value}'"
                    )))
                }
            }
        }

        let primary = prefix.len();
        let mut steps = prefix;
        steps.push(format!("{target} = {}", render(&rest)));
        steps.extend(postfix);
        Ok(Some(Simplified { steps, primary }))
    }
}

struct Patterns {
    step: Regex,
    compound: Regex,
    assign: Regex,
}

fn patterns() -> Result<&'static Patterns, EvalError> {
    static PATTERNS: OnceLock<Result<Patterns, regex::Error>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Ok(Patterns {
                step: Regex::new(
                    r"^\s*(?:(\+\+|--)\s*([A-Za-z_]\w*)|([A-Za-z_]\w*)\s*(\+\+|--))\s*$",
                )?,
                compound: Regex::new(r"^\s*([A-Za-z_]\w*)\s*([-+*/])=\s*(.*)$")?,
                assign: Regex::new(r"^\s*([A-Za-z_]\w*)\s*=\s*(.*)$")?,
            })
        })
        .as_ref()
        .map_err(|e| EvalError::Unsupported(format!("statement pattern: {e}")))
}

fn non_empty(value: &str, source: &str) -> Result<String, EvalError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EvalError::Unsupported(format!(
            "missing right-hand side in '{}'",
            source.trim()
        )));
    }
    Ok(value.to_string())
}

/// Classify a statement by its outer form.
pub fn parse_shape(source: &str) -> Result<Shape, EvalError> {
    let patterns = patterns()?;

    if let Some(caps) = patterns.step.captures(source) {
        let (step, target) = match (caps.get(1), caps.get(2), caps.get(3), caps.get(4)) {
            (Some(step), Some(target), _, _) | (_, _, Some(target), Some(step)) => {
                (step.as_str(), target.as_str())
            }
            _ => return Err(EvalError::Unsupported(source.trim().to_string())),
        };
        return Ok(Shape::Step {
            target: target.to_string(),
            step: if step == "++" { "++" } else { "--" },
        });
    }

    if let Some(caps) = patterns.compound.captures(source) {
        let op = caps[2].chars().next().unwrap_or('+');
        return Ok(Shape::Compound {
            target: caps[1].to_string(),
            op,
            value: non_empty(&caps[3], source)?,
        });
    }

    if let Some(caps) = patterns.assign.captures(source) {
        return Ok(Shape::Assign {
            target: caps[1].to_string(),
            value: non_empty(&caps[2], source)?,
        });
    }

    Err(EvalError::Unsupported(format!(
        "not an assignment: '{}'",
        source.trim()
    )))
}

/// Rewrites a statement into primitive `name = rhs` steps through a chain of
/// handlers; the first handler that accepts the statement wins.
pub struct ExpressionSimplifier {
    handlers: Vec<Box<dyn SimplifyHandler>>,
}

impl Default for ExpressionSimplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionSimplifier {
    pub fn new() -> Self {
        Self::with_handlers(vec![
            Box::new(StandaloneStepHandler),
            Box::new(CompoundAssignmentHandler),
            Box::new(SimpleAssignmentHandler),
            Box::new(IncrementExtractionHandler),
        ])
    }

    pub fn with_handlers(handlers: Vec<Box<dyn SimplifyHandler>>) -> Self {
        Self { handlers }
    }

    /// Primitive steps for one statement, e.g. `j = ++i` → `["i = i + 1", "j = i"]`.
    pub fn simplify(&self, source: &str) -> Result<Vec<String>, EvalError> {
        Ok(self.rewrite(source)?.steps)
    }

    pub fn rewrite(&self, source: &str) -> Result<Simplified, EvalError> {
        let shape = parse_shape(source)?;
        self.dispatch(&shape)
    }

    fn dispatch(&self, shape: &Shape) -> Result<Simplified, EvalError> {
        for handler in &self.handlers {
            if let Some(simplified) = handler.handle(shape, self)? {
                tracing::trace!(
                    handler = handler.name(),
                    statement = %shape,
                    steps = ?simplified.steps,
                    "statement simplified"
                );
                return Ok(simplified);
            }
        }
        Err(EvalError::Unsupported(format!("no handler accepts '{shape}'")))
    }
}
