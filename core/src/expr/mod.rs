//! Expression language: lexing, parsing, read/write analysis and AST evaluation.
//!
//! ```text
//! "j = i++ + 5"
//!   ↓ lexer::tokenize (logos)
//! Vec<Spanned>
//!   ↓ parser::parse_statement
//! Statement::Assign { target: "j", op: Set, value: (i++ + 5) }
//!   ↓ Analysis::of
//! Analysis { target: "j", writes: {i, j}, reads: {i} }
//! ```

pub mod analyzer;
pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use analyzer::{analyze, Analysis, Expression};
pub use ast::{AssignOp, BinaryOp, Expr, Fixity, Statement, Step, UnaryOp};
pub use error::{EvalError, ParseError};
pub use eval::{apply, evaluate_statement, AstEvaluator};
pub use parser::parse_statement;
