use calcflow_core::executor::traits::EvaluationStrategy;
use calcflow_core::executor::{Evaluation, Value, VariableTable};
use calcflow_core::expr::{apply, BinaryOp, EvalError, Expression};

use super::simplifier::ExpressionSimplifier;
use super::tokens::{lex, Lexeme};

/// Evaluates expressions from their source text: the statement is simplified
/// into primitive steps and every right-hand side is evaluated with an
/// operator-precedence pass over regex-split lexemes.
#[derive(Default)]
pub struct RegexEvaluator {
    simplifier: ExpressionSimplifier,
}

impl RegexEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simplifier(simplifier: ExpressionSimplifier) -> Self {
        Self { simplifier }
    }
}

impl EvaluationStrategy for RegexEvaluator {
    fn name(&self) -> &str {
        "regex"
    }

    fn evaluate(
        &self,
        expression: &Expression,
        variables: &VariableTable,
    ) -> Result<Evaluation, EvalError> {
        let simplified = self.simplifier.rewrite(&expression.source)?;
        let mut writes = VariableTable::new();
        let mut assigned: Option<(String, Value)> = None;

        for (i, step) in simplified.steps.iter().enumerate() {
            let Some((name, rhs)) = step.split_once('=') else {
                return Err(EvalError::Unsupported(format!("malformed step '{step}'")));
            };
            let name = name.trim();
            let value = evaluate_rhs(rhs, &|var| {
                writes.get(var).or_else(|| variables.get(var)).copied()
            })?;
            tracing::trace!(step = %step, value, "step evaluated");

            writes.insert(name.to_string(), value);
            if i == simplified.primary {
                assigned = Some((name.to_string(), value));
            }
        }

        let (target, value) = assigned.ok_or_else(|| {
            EvalError::Unsupported(format!("no assignment in '{}'", expression.source))
        })?;

        Ok(Evaluation {
            target,
            value,
            writes,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Binary(BinaryOp),
    Neg,
    Plus,
    LParen,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::LParen => 0,
            Operator::Binary(BinaryOp::Add | BinaryOp::Sub) => 1,
            Operator::Binary(BinaryOp::Mul | BinaryOp::Div) => 2,
            Operator::Neg | Operator::Plus => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rpn {
    Number(Value),
    Variable(String),
    Op(Operator),
}

fn binary_op(symbol: char) -> BinaryOp {
    match symbol {
        '+' => BinaryOp::Add,
        '-' => BinaryOp::Sub,
        '*' => BinaryOp::Mul,
        _ => BinaryOp::Div,
    }
}

/// Shunting-yard conversion to reverse Polish notation.
///
/// A `+` or `-` at the start, after another operator or after `(` is a sign.
fn to_rpn(lexemes: Vec<Lexeme>) -> Result<Vec<Rpn>, EvalError> {
    let mut output = Vec::with_capacity(lexemes.len());
    let mut stack: Vec<Operator> = Vec::new();
    let mut expect_operand = true;

    for lexeme in lexemes {
        match lexeme {
            Lexeme::Number(digits) => {
                let n = digits.parse::<Value>().map_err(|_| EvalError::Overflow)?;
                output.push(Rpn::Number(n));
                expect_operand = false;
            }
            Lexeme::Ident(name) => {
                output.push(Rpn::Variable(name));
                expect_operand = false;
            }
            Lexeme::Op(symbol) if expect_operand => match symbol {
                '-' => stack.push(Operator::Neg),
                '+' => stack.push(Operator::Plus),
                other => {
                    return Err(EvalError::Unsupported(format!(
                        "operator '{other}' without left operand"
                    )))
                }
            },
            Lexeme::Op(symbol) => {
                let op = Operator::Binary(binary_op(symbol));
                while let Some(&top) = stack.last() {
                    if top == Operator::LParen || top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Rpn::Op(top));
                    stack.pop();
                }
                stack.push(op);
                expect_operand = true;
            }
            Lexeme::LParen => {
                stack.push(Operator::LParen);
                expect_operand = true;
            }
            Lexeme::RParen => {
                loop {
                    match stack.pop() {
                        Some(Operator::LParen) => break,
                        Some(op) => output.push(Rpn::Op(op)),
                        None => {
                            return Err(EvalError::Unsupported("unbalanced ')'".to_string()))
                        }
                    }
                }
                expect_operand = false;
            }
            Lexeme::Step(step) => {
                return Err(EvalError::Unsupported(format!(
                    "'{step}' left after simplification"
                )))
            }
        }
    }

    while let Some(op) = stack.pop() {
        if op == Operator::LParen {
            return Err(EvalError::Unsupported("unbalanced '('".to_string()));
        }
        output.push(Rpn::Op(op));
    }

    Ok(output)
}

/// Evaluate one right-hand side; `lookup` resolves variables.
pub fn evaluate_rhs(
    rhs: &str,
    lookup: &dyn Fn(&str) -> Option<Value>,
) -> Result<Value, EvalError> {
    let rpn = to_rpn(lex(rhs)?)?;
    let mut values: Vec<Value> = Vec::new();
    let missing = || EvalError::Unsupported(format!("missing operand in '{}'", rhs.trim()));

    for item in rpn {
        match item {
            Rpn::Number(n) => values.push(n),
            Rpn::Variable(name) => {
                let value = lookup(&name).ok_or(EvalError::UndefinedVariable(name))?;
                values.push(value);
            }
            Rpn::Op(Operator::Neg) => {
                let v = values.pop().ok_or_else(missing)?;
                values.push(v.checked_neg().ok_or(EvalError::Overflow)?);
            }
            Rpn::Op(Operator::Plus) => {
                if values.is_empty() {
                    return Err(missing());
                }
            }
            Rpn::Op(Operator::Binary(op)) => {
                let right = values.pop().ok_or_else(missing)?;
                let left = values.pop().ok_or_else(missing)?;
                values.push(apply(op, left, right)?);
            }
            Rpn::Op(Operator::LParen) => return Err(missing()),
        }
    }

    match values.as_slice() {
        [value] => Ok(*value),
        _ => Err(missing()),
    }
}
