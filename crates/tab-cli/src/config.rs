use std::path::Path;

use anyhow::{Context, Result};
use tab_types::config::RuntimeConfig;

/// Reads and parses a TOML config file. `tab-cli` is the only crate in this
/// workspace that touches the filesystem for configuration; every other
/// crate only ever sees the already-parsed `RuntimeConfig`.
pub fn load_runtime_config(path: &Path) -> Result<RuntimeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config: RuntimeConfig = toml::from_str(&raw)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    config.policy.policy.validate().context("invalid policy in config")?;
    for agent in &config.agents {
        agent.descriptor.validate().context("invalid agent descriptor in config")?;
    }
    Ok(config)
}
