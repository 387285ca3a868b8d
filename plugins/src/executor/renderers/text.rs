use calcflow_core::executor::traits::{OutputRendererPlugin, RenderEvent};
use calcflow_core::executor::VariableTable;

/// Human readable run log on stderr; stdout stays free for the final table.
pub struct TextRendererPlugin {
    verbose: bool,
}

impl TextRendererPlugin {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        match event {
            RenderEvent::RunStart {
                run_id,
                mode,
                total_expressions,
                total_waves,
            } => Some(format!(
                "RUN START {} (mode {}, expressions: {}, waves: {})",
                run_id, mode, total_expressions, total_waves
            )),
            RenderEvent::Plan { run_id, waves } if self.verbose => {
                let mut out = format!("PLAN {}:", run_id);
                for (idx, wave) in waves.iter().enumerate() {
                    out.push_str(&format!("\n  wave {}: {}", idx, join_indices(wave)));
                }
                Some(out)
            }
            RenderEvent::WaveStart {
                run_id,
                wave_id,
                indices,
            } if self.verbose => Some(format!(
                "WAVE START {} (wave {}, expressions: {})",
                run_id,
                wave_id,
                join_indices(indices)
            )),
            RenderEvent::ExpressionComplete { run_id, result } if self.verbose => Some(format!(
                "EXPR {} (#{} {} = {}, wave {}, {}us)",
                run_id,
                result.index,
                result.evaluation.target,
                result.evaluation.value,
                result.wave,
                result.duration_us
            )),
            RenderEvent::WaveEnd {
                run_id,
                wave_id,
                committed,
            } if self.verbose => Some(format!(
                "WAVE END {} (wave {}, committed {})",
                run_id,
                wave_id,
                format_table(committed)
            )),
            RenderEvent::RunEnd { run_id, report } => Some(format!(
                "RUN END {} (variables {}, waves {}, duration {}ms)",
                run_id,
                report.variables.len(),
                report.waves.len(),
                report.duration_ms
            )),
            RenderEvent::RunFailed { run_id, error } => {
                Some(format!("RUN FAILED {} ({})", run_id, error))
            }
            _ => None,
        }
    }
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `{x: 1, y: 2}`
pub fn format_table(table: &VariableTable) -> String {
    let body = table
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(line) = self.format_event(event) {
            eprintln!("{line}");
        }
    }
}
