use std::sync::Arc;
use std::time::Duration;

use calcflow_core::config::{
    AppConfig, ConcurrencyConfig, ConcurrencyStrategyKind, EvaluatorKind, OutputFormat,
};
use calcflow_core::executor::traits::{
    ConcurrencyStrategyPlugin, EvaluationStrategy, OutputRendererPlugin,
};
use calcflow_core::executor::{
    ExecutionMode, ExecutionOpts, ExpressionExecutor, QueueExecutor, SequentialExecutor,
};
use calcflow_core::expr::AstEvaluator;

use crate::evaluator::RegexEvaluator;
use crate::executor::{
    AdaptiveConcurrencyPlugin, FixedConcurrencyPlugin, JsonlRendererPlugin, TextRendererPlugin,
};

pub fn build_evaluator(kind: EvaluatorKind) -> Arc<dyn EvaluationStrategy> {
    match kind {
        EvaluatorKind::Ast => Arc::new(AstEvaluator::new()),
        EvaluatorKind::Regex => Arc::new(RegexEvaluator::new()),
    }
}

/// `workers` is the resolved worker count; the fixed strategy uses it as is.
pub fn build_concurrency(
    cfg: &ConcurrencyConfig,
    workers: usize,
) -> Arc<dyn ConcurrencyStrategyPlugin> {
    match cfg.strategy {
        ConcurrencyStrategyKind::Fixed => Arc::new(FixedConcurrencyPlugin::new(workers)),
        ConcurrencyStrategyKind::Adaptive => Arc::new(AdaptiveConcurrencyPlugin::new(cfg.clone())),
    }
}

pub fn build_renderer(format: OutputFormat, verbose: bool) -> Arc<dyn OutputRendererPlugin> {
    match format {
        OutputFormat::Jsonl => Arc::new(JsonlRendererPlugin::new(false)),
        OutputFormat::Text => Arc::new(TextRendererPlugin::new(verbose)),
    }
}

/// Fill options the caller left unset from the executor config.
pub fn resolve_opts(cfg: &AppConfig, mut opts: ExecutionOpts) -> ExecutionOpts {
    if opts.max_workers.is_none() {
        opts.max_workers = cfg.executor.max_workers;
    }
    if opts.wave_timeout.is_none() {
        opts.wave_timeout = cfg.executor.wave_timeout_ms.map(Duration::from_millis);
    }
    opts
}

/// Executor for `cfg.executor.mode` with the configured evaluator and
/// concurrency strategy.
pub fn build_executor(
    cfg: &AppConfig,
    opts: ExecutionOpts,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
) -> Arc<dyn ExpressionExecutor> {
    let strategy = build_evaluator(cfg.executor.evaluator);
    let opts = resolve_opts(cfg, opts);

    tracing::debug!(
        mode = %cfg.executor.mode,
        evaluator = strategy.name(),
        max_workers = ?opts.max_workers,
        "building executor"
    );

    match cfg.executor.mode {
        ExecutionMode::Queue => {
            let concurrency = build_concurrency(&cfg.executor.concurrency, opts.effective_workers());
            let mut builder = QueueExecutor::builder(strategy)
                .opts(opts)
                .concurrency_strategy(concurrency);
            if let Some(renderer) = renderer {
                builder = builder.renderer(renderer);
            }
            Arc::new(builder.build())
        }
        ExecutionMode::Sequential => {
            let executor = SequentialExecutor::with_opts(strategy, opts);
            match renderer {
                Some(renderer) => Arc::new(executor.renderer(renderer)),
                None => Arc::new(executor),
            }
        }
    }
}
