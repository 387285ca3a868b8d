use thiserror::Error;

use super::code::ErrorCode;
use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("execution failed: {0}")]
    Executor(#[from] ExecutorError),
    #[error("config error: {0}")]
    Config(String),
    #[error("input error: {0}")]
    Input(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Executor(e) => e.error_code(),
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Input(_) | Self::Io(_) => ErrorCode::InputError,
            Self::Anyhow(_) => ErrorCode::GeneralError,
        }
    }
}
