pub mod fetch;
pub mod trigger;
pub mod upload;

use std::path::Path;

use anyhow::{Context, Result};
use symfetch_core::Config;

/// Resolve the config file and fold in the environment overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::discover(explicit).context("failed to load configuration")?;
    config.apply_process_env();
    Ok(config)
}
