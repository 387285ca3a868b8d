use thiserror::Error;

/// Errors raised while turning an expression string into a statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid token '{text}' at offset {offset}")]
    InvalidToken { offset: usize, text: String },

    #[error("unexpected '{found}' at offset {offset}, expected {expected}")]
    UnexpectedToken {
        offset: usize,
        found: String,
        expected: &'static str,
    },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expression has no assignment target")]
    MissingTarget,

    #[error("expression nests too deeply at offset {offset}")]
    TooDeep { offset: usize },
}

/// Errors raised by an evaluation strategy for a single expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("unsupported expression: {0}")]
    Unsupported(String),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}
