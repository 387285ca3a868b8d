use calcflow_core::config::ConcurrencyConfig;
use calcflow_core::executor::traits::{ConcurrencyContext, ConcurrencyStrategyPlugin};

/// Sizes each wave's worker pool to the wave itself, within configured bounds.
pub struct AdaptiveConcurrencyPlugin {
    config: ConcurrencyConfig,
}

pub struct FixedConcurrencyPlugin {
    fixed: usize,
}

impl AdaptiveConcurrencyPlugin {
    pub fn new(config: ConcurrencyConfig) -> Self {
        Self { config }
    }
}

impl FixedConcurrencyPlugin {
    pub fn new(fixed: usize) -> Self {
        Self { fixed }
    }
}

impl ConcurrencyStrategyPlugin for AdaptiveConcurrencyPlugin {
    fn name(&self) -> &str {
        "adaptive"
    }

    fn calculate_concurrency(&self, context: &ConcurrencyContext) -> usize {
        // the worker count is a hard cap, even below min_concurrency
        let cap = context.base_concurrency.max(1);
        let min = self.config.min_concurrency.clamp(1, cap);
        let max = self.config.max_concurrency.clamp(min, cap);

        // No point in more workers than expressions or CPUs
        let desired = context
            .wave_size
            .min(context.base_concurrency)
            .min(context.available_cpus.max(1));

        desired.clamp(min, max)
    }
}

impl ConcurrencyStrategyPlugin for FixedConcurrencyPlugin {
    fn name(&self) -> &str {
        "fixed"
    }

    fn calculate_concurrency(&self, _context: &ConcurrencyContext) -> usize {
        self.fixed.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcflow_core::config::ConcurrencyStrategyKind;

    fn context(wave_size: usize, base: usize) -> ConcurrencyContext {
        ConcurrencyContext {
            available_cpus: 8,
            wave_size,
            base_concurrency: base,
        }
    }

    #[test]
    fn test_adaptive_concurrency() {
        let cfg = ConcurrencyConfig {
            strategy: ConcurrencyStrategyKind::Adaptive,
            min_concurrency: 2,
            max_concurrency: 6,
        };
        let plugin = AdaptiveConcurrencyPlugin::new(cfg);

        assert_eq!(plugin.calculate_concurrency(&context(1, 16)), 2);
        assert_eq!(plugin.calculate_concurrency(&context(4, 16)), 4);
        assert_eq!(plugin.calculate_concurrency(&context(100, 16)), 6);
        assert_eq!(plugin.calculate_concurrency(&context(100, 3)), 3);
    }

    #[test]
    fn test_adaptive_tolerates_inverted_bounds() {
        let cfg = ConcurrencyConfig {
            strategy: ConcurrencyStrategyKind::Adaptive,
            min_concurrency: 0,
            max_concurrency: 0,
        };
        let plugin = AdaptiveConcurrencyPlugin::new(cfg);
        assert_eq!(plugin.calculate_concurrency(&context(10, 4)), 1);
    }

    #[test]
    fn test_adaptive_never_exceeds_worker_count() {
        let cfg = ConcurrencyConfig {
            strategy: ConcurrencyStrategyKind::Adaptive,
            min_concurrency: 4,
            max_concurrency: 16,
        };
        let plugin = AdaptiveConcurrencyPlugin::new(cfg);
        assert_eq!(plugin.calculate_concurrency(&context(3, 1)), 1);
        assert_eq!(plugin.calculate_concurrency(&context(3, 2)), 2);
        assert_eq!(plugin.calculate_concurrency(&context(3, 6)), 4);
    }

    #[test]
    fn test_fixed_concurrency() {
        let plugin = FixedConcurrencyPlugin::new(3);
        assert_eq!(plugin.calculate_concurrency(&context(50, 1)), 3);
        assert_eq!(
            FixedConcurrencyPlugin::new(0).calculate_concurrency(&context(5, 5)),
            1
        );
    }
}
