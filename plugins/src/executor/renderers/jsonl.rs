use chrono::Local;
use calcflow_core::executor::traits::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

/// One JSON object per event on stdout.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let metadata = match event {
            RenderEvent::RunStart {
                mode,
                total_expressions,
                total_waves,
                ..
            } => json!({
                "mode": mode,
                "total_expressions": total_expressions,
                "total_waves": total_waves,
            }),
            RenderEvent::Plan { waves, .. } => json!({
                "waves": waves,
                "total_expressions": waves.iter().map(Vec::len).sum::<usize>(),
            }),
            RenderEvent::WaveStart {
                wave_id, indices, ..
            } => json!({
                "wave_id": wave_id,
                "expressions": indices,
            }),
            RenderEvent::ExpressionComplete { result, .. } => json!({
                "index": result.index,
                "wave_id": result.wave,
                "target": result.evaluation.target,
                "value": result.evaluation.value,
                "writes": result.evaluation.writes,
                "duration_us": result.duration_us,
            }),
            RenderEvent::WaveEnd {
                wave_id, committed, ..
            } => json!({
                "wave_id": wave_id,
                "committed": committed,
            }),
            RenderEvent::RunEnd { report, .. } => json!({
                "mode": report.mode,
                "variables": report.variables,
                "waves": report.waves,
                "total_expressions": report.total_expressions,
                "started_at": report.started_at,
                "duration_ms": report.duration_ms,
            }),
            RenderEvent::RunFailed { error, .. } => json!({
                "error": error,
            }),
        };

        json!({
            "v": 1,
            "event_type": event.event_type(),
            "ts": Local::now().to_rfc3339(),
            "run_id": event.run_id(),
            "metadata": metadata,
        })
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcflow_core::executor::{ExecutionMode, ExecutionReport};

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunStart {
            run_id: "run".to_string(),
            mode: ExecutionMode::Queue,
            total_expressions: 2,
            total_waves: 1,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["run_id"], "run");
        assert_eq!(value["metadata"]["mode"], "queue");
    }

    #[test]
    fn test_jsonl_renderer_plan() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::Plan {
            run_id: "run".to_string(),
            waves: vec![vec![0, 1], vec![2]],
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "executor.plan");
        assert_eq!(value["metadata"]["total_expressions"], 3);
        assert_eq!(value["metadata"]["waves"][1][0], 2);
    }

    #[test]
    fn test_jsonl_renderer_run_end() {
        let renderer = JsonlRendererPlugin::new(false);
        let event = RenderEvent::RunEnd {
            run_id: "run".to_string(),
            report: ExecutionReport {
                run_id: "run".to_string(),
                mode: ExecutionMode::Sequential,
                variables: [("x".to_string(), 5)].into_iter().collect(),
                waves: vec![vec![0]],
                total_expressions: 1,
                started_at: "2024-01-01T00:00:00Z".to_string(),
                duration_ms: 3,
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.end");
        assert_eq!(value["metadata"]["variables"]["x"], 5);
    }
}
