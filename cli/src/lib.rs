//! calcflow command line: argument parsing, input handling and the commands.

pub mod commands;
pub mod input;
