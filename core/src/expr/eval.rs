use crate::executor::traits::EvaluationStrategy;
use crate::executor::types::{Evaluation, Value, VariableTable};

use super::analyzer::Expression;
use super::ast::{AssignOp, BinaryOp, Expr, Fixity, Statement, Step, UnaryOp};
use super::error::EvalError;

/// Evaluates expressions by walking their parsed syntax tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct AstEvaluator;

impl AstEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl EvaluationStrategy for AstEvaluator {
    fn name(&self) -> &str {
        "ast"
    }

    fn evaluate(
        &self,
        expression: &Expression,
        variables: &VariableTable,
    ) -> Result<Evaluation, EvalError> {
        evaluate_statement(&expression.statement, variables)
    }
}

/// Read-through view over a snapshot that records local writes.
struct Scope<'a> {
    snapshot: &'a VariableTable,
    writes: VariableTable,
}

impl<'a> Scope<'a> {
    fn new(snapshot: &'a VariableTable) -> Self {
        Self {
            snapshot,
            writes: VariableTable::new(),
        }
    }

    fn get(&self, name: &str) -> Result<Value, EvalError> {
        self.writes
            .get(name)
            .or_else(|| self.snapshot.get(name))
            .copied()
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    fn set(&mut self, name: &str, value: Value) {
        self.writes.insert(name.to_string(), value);
    }

    fn step(&mut self, name: &str, step: Step) -> Result<Value, EvalError> {
        let value = self
            .get(name)?
            .checked_add(step.delta())
            .ok_or(EvalError::Overflow)?;
        self.set(name, value);
        Ok(value)
    }
}

/// Evaluate a statement against a snapshot without touching the snapshot.
///
/// Prefix steps inside the right-hand side apply first, in source order; the
/// right-hand side then reads every stepped variable at its current value;
/// the target is assigned; postfix steps apply last.
pub fn evaluate_statement(
    statement: &Statement,
    variables: &VariableTable,
) -> Result<Evaluation, EvalError> {
    let mut scope = Scope::new(variables);

    let (target, value) = match statement {
        Statement::Step { target, step, .. } => (target, scope.step(target, *step)?),
        Statement::Assign { target, op, value } => {
            let mut prefix = Vec::new();
            let mut postfix = Vec::new();
            value.for_each_step(&mut |name, step, fixity| match fixity {
                Fixity::Prefix => prefix.push((name.to_string(), step)),
                Fixity::Postfix => postfix.push((name.to_string(), step)),
            });

            for (name, step) in &prefix {
                scope.step(name, *step)?;
            }

            let rhs = eval_expr(value, &scope)?;
            let result = match op {
                AssignOp::Set => rhs,
                AssignOp::Compound(op) => apply(*op, scope.get(target)?, rhs)?,
            };
            scope.set(target, result);

            for (name, step) in &postfix {
                scope.step(name, *step)?;
            }

            (target, result)
        }
    };

    Ok(Evaluation {
        target: target.clone(),
        value,
        writes: scope.writes,
    })
}

fn eval_expr(expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Variable(name) | Expr::Step { name, .. } => scope.get(name),
        Expr::Unary { op, operand } => {
            let v = eval_expr(operand, scope)?;
            match op {
                UnaryOp::Neg => v.checked_neg().ok_or(EvalError::Overflow),
                UnaryOp::Plus => Ok(v),
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_expr(lhs, scope)?;
            let r = eval_expr(rhs, scope)?;
            apply(*op, l, r)
        }
    }
}

/// Checked integer arithmetic; `/` is floor division.
pub fn apply(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => lhs.checked_add(rhs).ok_or(EvalError::Overflow),
        BinaryOp::Sub => lhs.checked_sub(rhs).ok_or(EvalError::Overflow),
        BinaryOp::Mul => lhs.checked_mul(rhs).ok_or(EvalError::Overflow),
        BinaryOp::Div => floor_div(lhs, rhs),
    }
}

fn floor_div(lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    if rhs == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let quotient = lhs.checked_div(rhs).ok_or(EvalError::Overflow)?;
    if (lhs % rhs != 0) && ((lhs < 0) != (rhs < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}
