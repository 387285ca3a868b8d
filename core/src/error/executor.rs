use thiserror::Error;

use super::code::ErrorCode;
use crate::expr::{EvalError, ParseError};

/// Executor errors for batch validation and execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Parse error in expression {index} '{expression}': {source}")]
    Parse {
        index: usize,
        expression: String,
        source: ParseError,
    },

    #[error("Undefined variable '{variable}' used in expression {index} '{expression}'")]
    UndefinedVariable {
        index: usize,
        expression: String,
        variable: String,
    },

    #[error("Circular dependency detected: {path}")]
    CircularDependency { indices: Vec<usize>, path: String },

    #[error("Evaluation failed in expression {index} '{expression}': {source}")]
    Evaluation {
        index: usize,
        expression: String,
        source: EvalError,
    },

    #[error("Wave {wave} timed out after {timeout_ms}ms with expressions {pending:?} unfinished")]
    WaveTimeout {
        wave: usize,
        pending: Vec<usize>,
        timeout_ms: u64,
    },

    #[error("Worker error: {0}")]
    Worker(String),
}

impl ExecutorError {
    /// Map executor error to a stable error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Parse { .. } => ErrorCode::ParseError,
            Self::UndefinedVariable { .. } => ErrorCode::DependencyError,
            Self::CircularDependency { .. } => ErrorCode::CircularDependency,
            Self::Evaluation { .. } => ErrorCode::EvaluationError,
            Self::WaveTimeout { .. } => ErrorCode::Timeout,
            Self::Worker(_) => ErrorCode::GeneralError,
        }
    }

    /// Index of the expression the error is attributed to, if any.
    pub fn expression_index(&self) -> Option<usize> {
        match self {
            Self::Parse { index, .. }
            | Self::UndefinedVariable { index, .. }
            | Self::Evaluation { index, .. } => Some(*index),
            Self::CircularDependency { indices, .. } => indices.first().copied(),
            Self::WaveTimeout { pending, .. } => pending.first().copied(),
            Self::Worker(_) => None,
        }
    }

    /// True for errors raised before any expression was evaluated.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::UndefinedVariable { .. } | Self::CircularDependency { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ExecutorError::CircularDependency {
            indices: vec![0, 1],
            path: "0 -> 1 -> 0".into(),
        };
        assert_eq!(err.error_code(), ErrorCode::CircularDependency);
        assert_eq!(err.expression_index(), Some(0));
        assert!(err.is_validation());

        let err = ExecutorError::Evaluation {
            index: 3,
            expression: "x = 1 / 0".into(),
            source: EvalError::DivisionByZero,
        };
        assert_eq!(err.error_code().as_u16(), 13);
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Evaluation failed in expression 3 'x = 1 / 0': division by zero"
        );
    }
}
