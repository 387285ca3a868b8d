use calcflow_core::config::{AppConfig, OutputFormat};
use calcflow_core::error::{CliError, ErrorCode};
use calcflow_core::executor::ExecutionPlan;
use serde_json::json;

use crate::commands::cli::PlanArgs;
use crate::input;

/// Render the plan for `plan`; nothing is evaluated.
pub fn format_plan(plan: &ExecutionPlan, format: OutputFormat) -> String {
    match format {
        OutputFormat::Jsonl => json!({
            "waves": plan.waves,
            "edges": plan.graph.edges(),
        })
        .to_string(),
        OutputFormat::Text => {
            let mut out = String::new();
            for (wave, indices) in plan.waves.iter().enumerate() {
                out.push_str(&format!("wave {wave}:\n"));
                for &index in indices {
                    out.push_str(&format!("  [{index}] {}\n", plan.graph.source(index)));
                }
            }
            if !plan.graph.edges().is_empty() {
                out.push_str("edges:\n");
                for edge in plan.graph.edges() {
                    out.push_str(&format!(
                        "  {} -> {} {:?} ({})\n",
                        edge.from, edge.to, edge.kind, edge.variable
                    ));
                }
            }
            out
        }
    }
}

/// Handle plan command
pub async fn handle_plan(args: PlanArgs, cfg: AppConfig) -> Result<i32, CliError> {
    let batch = input::read_batch(&args.input).await?;
    let initial = input::parse_vars(&args.input.vars)?;
    let format = args.format.map(Into::into).unwrap_or(cfg.output.format);

    let plan = ExecutionPlan::build(batch.as_slice(), &initial)?;
    print!("{}", format_plan(&plan, format));
    if format == OutputFormat::Jsonl {
        println!();
    }
    Ok(ErrorCode::Success.as_exit_code())
}
