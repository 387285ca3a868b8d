pub mod cli;
pub mod eval;
pub mod plan;
pub mod run;
