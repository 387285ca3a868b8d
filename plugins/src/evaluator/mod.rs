//! Regex-based evaluation strategy.
//!
//! Statements are rewritten into primitive `name = rhs` steps by the
//! [`ExpressionSimplifier`] and each right-hand side is evaluated from
//! regex-split lexemes.

pub mod regex;
pub mod simplifier;
pub mod tokens;

pub use self::regex::{evaluate_rhs, RegexEvaluator};
pub use simplifier::{
    parse_shape, CompoundAssignmentHandler, ExpressionSimplifier, IncrementExtractionHandler,
    Shape, SimpleAssignmentHandler, Simplified, SimplifyHandler, StandaloneStepHandler,
};
