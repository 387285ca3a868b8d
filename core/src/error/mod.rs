#[allow(clippy::module_inception)]
pub mod error;
pub mod code;
pub mod executor;

pub use code::ErrorCode;
pub use error::CliError;
pub use executor::ExecutorError;
