//! Pluggable pieces for calcflow: the regex evaluator, renderers, concurrency
//! strategies and the factory that wires them up from config.

pub mod calculator;
pub mod evaluator;
pub mod executor;
pub mod factory;

pub use calculator::Calculator;
pub use evaluator::{ExpressionSimplifier, RegexEvaluator};
pub use factory::{build_concurrency, build_evaluator, build_executor, build_renderer};
