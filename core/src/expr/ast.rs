use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
}

/// `++` or `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Increment,
    Decrement,
}

impl Step {
    pub fn delta(self) -> i64 {
        match self {
            Step::Increment => 1,
            Step::Decrement => -1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Step::Increment => "++",
            Step::Decrement => "--",
        }
    }
}

/// Whether a step operator is written before (`++i`) or after (`i++`) its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fixity {
    Prefix,
    Postfix,
}

/// Assignment operator of a statement; `Set` is plain `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Set,
    Compound(BinaryOp),
}

/// Right-hand side expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Number(i64),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Step {
        name: String,
        step: Step,
        fixity: Fixity,
    },
}

impl Expr {
    /// Visit every step operator in source order.
    pub fn for_each_step<F: FnMut(&str, Step, Fixity)>(&self, f: &mut F) {
        match self {
            Expr::Number(_) | Expr::Variable(_) => {}
            Expr::Unary { operand, .. } => operand.for_each_step(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_step(f);
                rhs.for_each_step(f);
            }
            Expr::Step { name, step, fixity } => f(name, *step, *fixity),
        }
    }

    /// Visit every variable name the expression mentions, steps included.
    pub fn for_each_variable<F: FnMut(&str)>(&self, f: &mut F) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) | Expr::Step { name, .. } => f(name),
            Expr::Unary { operand, .. } => operand.for_each_variable(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_variable(f);
                rhs.for_each_variable(f);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::Plus => write!(f, "+{operand}"),
            },
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Step { name, step, fixity } => match fixity {
                Fixity::Prefix => write!(f, "{}{name}", step.symbol()),
                Fixity::Postfix => write!(f, "{name}{}", step.symbol()),
            },
        }
    }
}

/// A parsed statement. Every accepted statement assigns exactly one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Assign {
        target: String,
        op: AssignOp,
        value: Expr,
    },
    /// Standalone `++x`, `x++`, `--x` or `x--`.
    Step {
        target: String,
        step: Step,
        fixity: Fixity,
    },
}

impl Statement {
    pub fn target(&self) -> &str {
        match self {
            Statement::Assign { target, .. } | Statement::Step { target, .. } => target,
        }
    }
}
