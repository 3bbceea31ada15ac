//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use cropwatch_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "cropwatch.toml";

/// Load layered configuration: defaults, file, environment, then CLI flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path(cli.config.as_deref()) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        api_base_url: cli.api_url.clone(),
        geocode_endpoint: cli.geocode_url.clone(),
        poll_interval_secs: cli.poll_interval,
    });

    Ok(config)
}

/// An explicit path must exist; the implicit one is optional
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
            implicit.exists().then_some(implicit)
        }
    }
}
