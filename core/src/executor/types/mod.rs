pub mod config;
pub mod result;
pub mod variables;

pub use config::*;
pub use result::*;
pub use variables::*;
