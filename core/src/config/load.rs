use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default calcflow data directory: ~/.calcflow
pub fn get_calcflow_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".calcflow"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.calcflow/config.toml (highest)
    let user_config = get_calcflow_data_dir()?.join("config.toml");

    // Priority 2: ./calcflow.toml (current directory)
    let local_config = Path::new("calcflow.toml");

    let mut cfg = if user_config.exists() {
        load_from(&user_config)?
    } else if local_config.exists() {
        load_from(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

/// Parse one TOML config file.
pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
///
/// Blank values are ignored; unparsable ones are an error rather than being
/// silently dropped.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var("CALCFLOW_EXECUTION_MODE") {
        cfg.executor.mode = v
            .parse()
            .map_err(|e| anyhow::anyhow!("CALCFLOW_EXECUTION_MODE: {e}"))?;
    }
    if let Some(v) = var("CALCFLOW_EVALUATOR") {
        cfg.executor.evaluator = v
            .parse()
            .map_err(|e| anyhow::anyhow!("CALCFLOW_EVALUATOR: {e}"))?;
    }
    if let Some(v) = var("CALCFLOW_MAX_WORKERS") {
        let workers: usize = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("CALCFLOW_MAX_WORKERS: {e}"))?;
        cfg.executor.max_workers = Some(workers);
    }
    if let Some(v) = var("CALCFLOW_WAVE_TIMEOUT_MS") {
        let timeout: u64 = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("CALCFLOW_WAVE_TIMEOUT_MS: {e}"))?;
        cfg.executor.wave_timeout_ms = Some(timeout);
    }
    if let Some(v) = var("CALCFLOW_LOG_LEVEL") {
        cfg.logging.level = v;
    }

    Ok(())
}
