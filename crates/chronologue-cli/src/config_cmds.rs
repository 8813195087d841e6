use anyhow::Result;
use chronologue_config::{ChronologueConfig, init_project, validate_loaded_config};
use chronologue_core::OutputFormat;

use crate::project::determine_project_root;

pub(crate) fn handle_config_show(cd: Option<String>, format: OutputFormat) -> Result<()> {
    let project_root = determine_project_root(cd.as_deref())?;
    let config = ChronologueConfig::load(&project_root)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Text => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

pub(crate) fn handle_config_validate(cd: Option<String>) -> Result<()> {
    let project_root = determine_project_root(cd.as_deref())?;
    let config = ChronologueConfig::load(&project_root)?;
    validate_loaded_config(&config)?;
    eprintln!("Configuration is valid");
    Ok(())
}

pub(crate) fn handle_config_init(cd: Option<String>, force: bool) -> Result<()> {
    let project_root = determine_project_root(cd.as_deref())?;
    let path = init_project(&project_root, force)?;
    eprintln!("Initialized configuration at: {}", path.display());
    Ok(())
}
