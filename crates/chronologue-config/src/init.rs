use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::paths;

/// Commented configuration template written by `chronologue config init`.
pub fn default_template() -> String {
    r#"# Chronologue configuration
# Project location: <project>/.chronologue/config.toml
# User location:    ~/.config/chronologue/config.toml (project values win)

[calendar]
prodid = "CalendarMemorySystem"   # PRODID:-//<prodid>//EN
uid_domain = "memorysystem.ai"    # derived UIDs end in @<uid_domain>
summary_max_chars = 40            # content characters kept when no title is set

[duration]
default_minutes = 15              # fallback when a trace has no usable duration

[duration.type_defaults]
calendar_event = 30

[source]
collection_key = "memory"         # key of the trace list in source documents
import_task_id = "imported_calendar"

[validation]
required_fields = ["id", "type", "timestamp", "content", "task_id"]
"#
    .to_string()
}

/// Write the default template to `<project_root>/.chronologue/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_project(project_root: &Path, force: bool) -> Result<PathBuf> {
    let path = paths::project_config_path(project_root);
    if path.exists() && !force {
        bail!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }
    std::fs::write(&path, default_template())
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(path)
}
