use std::path::PathBuf;

use anyhow::{Context, Result};
use chronologue_config::{ChronologueConfig, validate_loaded_config};

pub(crate) fn determine_project_root(cd: Option<&str>) -> Result<PathBuf> {
    let path = match cd {
        Some(cd_path) => PathBuf::from(cd_path),
        None => std::env::current_dir()?,
    };
    path.canonicalize()
        .with_context(|| format!("Invalid project directory: {}", path.display()))
}

/// Load and validate the effective configuration for `--cd`.
pub(crate) fn load_config(cd: Option<&str>) -> Result<ChronologueConfig> {
    let project_root = determine_project_root(cd)?;
    let config = ChronologueConfig::load(&project_root)?;
    validate_loaded_config(&config).context("Invalid configuration")?;
    Ok(config)
}
