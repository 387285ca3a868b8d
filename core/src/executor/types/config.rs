use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One expression at a time, committing after each.
    #[default]
    Sequential,
    /// Wave by wave, expressions of a wave in parallel.
    Queue,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Queue => f.write_str("queue"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "queue" => Ok(Self::Queue),
            other => Err(format!("invalid execution mode: {other}")),
        }
    }
}

/// Per-call execution options for the executors.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOpts {
    /// Maximum parallel evaluations per wave (overrides config if Some)
    pub max_workers: Option<usize>,

    /// Abort a wave that has not fully completed after this long
    pub wave_timeout: Option<Duration>,

    /// Enable visual progress bar
    pub progress_bar: bool,

    /// Run ID to report instead of a generated one
    pub run_id: Option<String>,
}

impl ExecutionOpts {
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    pub fn with_wave_timeout(mut self, timeout: Duration) -> Self {
        self.wave_timeout = Some(timeout);
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    /// Effective worker count: explicit option, else all available CPUs.
    pub fn effective_workers(&self) -> usize {
        self.max_workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_mode_parse() {
        assert_eq!("QUEUE".parse::<ExecutionMode>(), Ok(ExecutionMode::Queue));
        assert_eq!(
            " sequential ".parse::<ExecutionMode>(),
            Ok(ExecutionMode::Sequential)
        );
        assert!("parallel".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_effective_workers_never_zero() {
        assert_eq!(ExecutionOpts::default().with_max_workers(0).effective_workers(), 1);
        assert_eq!(ExecutionOpts::default().with_max_workers(3).effective_workers(), 3);
        assert!(ExecutionOpts::default().effective_workers() >= 1);
    }
}
