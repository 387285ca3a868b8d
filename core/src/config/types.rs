use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::executor::types::ExecutionMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "calcflow_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Which evaluation strategy the executors are built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorKind {
    #[default]
    Ast,
    Regex,
}

impl fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorKind::Ast => f.write_str("ast"),
            EvaluatorKind::Regex => f.write_str("regex"),
        }
    }
}

impl FromStr for EvaluatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ast" => Ok(Self::Ast),
            "regex" => Ok(Self::Regex),
            other => Err(format!("invalid evaluator: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub mode: ExecutionMode,

    #[serde(default)]
    pub evaluator: EvaluatorKind,

    /// Upper bound on parallel evaluations per wave; all CPUs when unset.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Abort a wave that takes longer than this.
    #[serde(default)]
    pub wave_timeout_ms: Option<u64>,

    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyStrategyKind {
    #[default]
    Fixed,
    Adaptive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    #[serde(default)]
    pub strategy: ConcurrencyStrategyKind,

    #[serde(default = "default_min_concurrency")]
    pub min_concurrency: usize,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_min_concurrency() -> usize {
    1
}

fn default_max_concurrency() -> usize {
    64
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            strategy: ConcurrencyStrategyKind::default(),
            min_concurrency: default_min_concurrency(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Jsonl => f.write_str("jsonl"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "jsonl" => Ok(Self::Jsonl),
            other => Err(format!("invalid output format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Draw a progress bar on stderr (text format only).
    #[serde(default)]
    pub progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.executor.mode, ExecutionMode::Sequential);
        assert_eq!(cfg.executor.evaluator, EvaluatorKind::Ast);
        assert_eq!(cfg.executor.max_workers, None);
        assert_eq!(cfg.executor.concurrency.max_concurrency, 64);
        assert_eq!(cfg.output.format, OutputFormat::Text);
        assert_eq!(cfg.logging.level, "warn");
        assert!(!cfg.logging.file);
    }

    #[test]
    fn test_partial_sections() {
        let cfg: AppConfig = toml::from_str(
            r#"
[executor]
mode = "queue"
evaluator = "regex"
max_workers = 8

[executor.concurrency]
strategy = "adaptive"
min_concurrency = 2

[output]
format = "jsonl"
"#,
        )
        .unwrap();
        assert_eq!(cfg.executor.mode, ExecutionMode::Queue);
        assert_eq!(cfg.executor.evaluator, EvaluatorKind::Regex);
        assert_eq!(cfg.executor.max_workers, Some(8));
        assert_eq!(
            cfg.executor.concurrency.strategy,
            ConcurrencyStrategyKind::Adaptive
        );
        assert_eq!(cfg.executor.concurrency.min_concurrency, 2);
        assert_eq!(cfg.executor.concurrency.max_concurrency, 64);
        assert_eq!(cfg.output.format, OutputFormat::Jsonl);
        assert!(cfg.logging.console);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(toml::from_str::<AppConfig>("[executor]\nmode = \"parallel\"").is_err());
    }
}
