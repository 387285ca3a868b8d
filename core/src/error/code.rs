/// Stable numeric codes for failures; the CLI uses them as exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    ParseError = 2,
    ValidationError = 3,
    InputError = 4,
    ConfigError = 5,
    DependencyError = 11,
    CircularDependency = 12,
    EvaluationError = 13,
    Timeout = 30,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn as_exit_code(self) -> i32 {
        self as i32
    }
}
