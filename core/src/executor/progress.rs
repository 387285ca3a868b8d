use indicatif::{ProgressBar, ProgressStyle};

/// Visual progress monitor for batch execution
///
/// One bar over all expressions; the message tracks the current wave.
pub struct ProgressMonitor {
    /// Overall progress bar
    overall: ProgressBar,
    /// Whether monitoring is enabled
    enabled: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_expressions` - Number of expressions in the batch
    /// * `enabled` - Whether to draw anything (disabled for jsonl output)
    pub fn new(total_expressions: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                overall: ProgressBar::hidden(),
                enabled: false,
            };
        }

        let overall = ProgressBar::new(total_expressions as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} expressions {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_message("planning");

        Self {
            overall,
            enabled: true,
        }
    }

    /// Mark one expression as evaluated
    pub fn complete_expression(&self) {
        if self.enabled {
            self.overall.inc(1);
        }
    }

    /// Mark wave progress
    pub fn update_wave(&self, wave_id: usize, total_waves: usize) {
        if self.enabled {
            self.overall
                .set_message(format!("wave {}/{}", wave_id + 1, total_waves));
        }
    }

    /// Finish overall progress
    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }

        let msg = if success { "done" } else { "failed" };
        self.overall.finish_with_message(msg);
    }

    pub fn position(&self) -> u64 {
        self.overall.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_monitor_disabled() {
        let monitor = ProgressMonitor::new(3, false);

        // Should not panic when disabled
        monitor.update_wave(0, 2);
        monitor.complete_expression();
        monitor.finish(true);
        assert_eq!(monitor.position(), 0);
    }

    #[test]
    fn test_progress_monitor_enabled() {
        let monitor = ProgressMonitor::new(3, true);

        monitor.update_wave(0, 2);
        monitor.complete_expression();
        monitor.complete_expression();
        monitor.update_wave(1, 2);
        monitor.complete_expression();
        monitor.finish(true);
        assert_eq!(monitor.position(), 3);
    }
}
