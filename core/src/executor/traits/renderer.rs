use crate::executor::types::{ExecutionMode, ExecutionReport, ExpressionResult, VariableTable};

/// Output renderer plugin (controls how run events are shown)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Render events emitted by the executors
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        mode: ExecutionMode,
        total_expressions: usize,
        total_waves: usize,
    },
    Plan {
        run_id: String,
        waves: Vec<Vec<usize>>,
    },
    WaveStart {
        run_id: String,
        wave_id: usize,
        indices: Vec<usize>,
    },
    ExpressionComplete {
        run_id: String,
        result: ExpressionResult,
    },
    WaveEnd {
        run_id: String,
        wave_id: usize,
        committed: VariableTable,
    },
    RunEnd {
        run_id: String,
        report: ExecutionReport,
    },
    RunFailed {
        run_id: String,
        error: String,
    },
}

impl RenderEvent {
    pub fn run_id(&self) -> &str {
        match self {
            RenderEvent::RunStart { run_id, .. }
            | RenderEvent::Plan { run_id, .. }
            | RenderEvent::WaveStart { run_id, .. }
            | RenderEvent::ExpressionComplete { run_id, .. }
            | RenderEvent::WaveEnd { run_id, .. }
            | RenderEvent::RunEnd { run_id, .. }
            | RenderEvent::RunFailed { run_id, .. } => run_id,
        }
    }

    /// Event type name, e.g. `wave.start`
    pub fn event_type(&self) -> &'static str {
        match self {
            RenderEvent::RunStart { .. } => "run.start",
            RenderEvent::Plan { .. } => "executor.plan",
            RenderEvent::WaveStart { .. } => "wave.start",
            RenderEvent::ExpressionComplete { .. } => "expression.complete",
            RenderEvent::WaveEnd { .. } => "wave.end",
            RenderEvent::RunEnd { .. } => "run.end",
            RenderEvent::RunFailed { .. } => "run.failed",
        }
    }
}
