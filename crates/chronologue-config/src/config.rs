use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chronologue_core::{REQUIRED_FIELDS, TraceType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config_merge::merge_toml_values;
use crate::paths;

/// Top-level configuration. Every section falls back to its defaults, so an
/// empty file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronologueConfig {
    pub calendar: CalendarConfig,
    pub duration: DurationConfig,
    pub source: SourceConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Product tag written as `PRODID:-//<prodid>//EN`.
    pub prodid: String,
    /// Domain suffix of derived event UIDs.
    pub uid_domain: String,
    /// Characters of content kept when a summary is derived from it.
    pub summary_max_chars: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            prodid: "CalendarMemorySystem".to_string(),
            uid_domain: "memorysystem.ai".to_string(),
            summary_max_chars: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationConfig {
    /// Fallback when a trace carries no usable duration.
    pub default_minutes: u32,
    /// Per-type fallbacks keyed by trace type wire name.
    pub type_defaults: BTreeMap<String, u32>,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            default_minutes: 15,
            type_defaults: BTreeMap::from([(TraceType::CalendarEvent.as_str().to_string(), 30)]),
        }
    }
}

impl DurationConfig {
    /// Fallback minutes for a trace of the given type.
    pub fn default_for(&self, trace_type: Option<TraceType>) -> u32 {
        trace_type
            .and_then(|kind| self.type_defaults.get(kind.as_str()).copied())
            .unwrap_or(self.default_minutes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Key of the trace sequence inside source documents.
    pub collection_key: String,
    /// `task_id` given to traces imported from calendar files.
    pub import_task_id: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            collection_key: "memory".to_string(),
            import_task_id: "imported_calendar".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub required_fields: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_fields: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ChronologueConfig {
    /// Load the effective configuration for `project_root`.
    ///
    /// The user config (`~/.config/chronologue/config.toml`) is the base and
    /// the project config (`<root>/.chronologue/config.toml`) is deep-merged
    /// over it. Missing files fall back to defaults.
    pub fn load(project_root: &Path) -> Result<Self> {
        let project_path = paths::project_config_path(project_root);
        let user_path = paths::user_config_path();
        Self::load_with_paths(user_path.as_deref(), &project_path)
    }

    /// Load config from explicit paths. Testable without global filesystem state.
    pub fn load_with_paths(user_path: Option<&Path>, project_path: &Path) -> Result<Self> {
        let project_exists = project_path.exists();
        let user_path = user_path.filter(|p| p.exists());

        match (user_path, project_exists) {
            (None, false) => {
                debug!("no configuration file found, using defaults");
                Ok(Self::default())
            }
            (Some(user_path), false) => Self::load_from_path(user_path),
            (None, true) => Self::load_from_path(project_path),
            (Some(user_path), true) => Self::load_merged(user_path, project_path),
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn load_merged(base_path: &Path, overlay_path: &Path) -> Result<Self> {
        let base_str = std::fs::read_to_string(base_path)
            .with_context(|| format!("Failed to read user config: {}", base_path.display()))?;
        let overlay_str = std::fs::read_to_string(overlay_path).with_context(|| {
            format!("Failed to read project config: {}", overlay_path.display())
        })?;

        let base_val: toml::Value = toml::from_str(&base_str)
            .with_context(|| format!("Failed to parse user config: {}", base_path.display()))?;
        let overlay_val: toml::Value = toml::from_str(&overlay_str).with_context(|| {
            format!("Failed to parse project config: {}", overlay_path.display())
        })?;

        let merged = merge_toml_values(base_val, overlay_val);
        let merged_str = toml::to_string(&merged).context("Failed to serialize merged config")?;
        let config: Self = toml::from_str(&merged_str).with_context(|| {
            format!(
                "Failed to apply project config {} over {}",
                overlay_path.display(),
                base_path.display()
            )
        })?;
        debug!(
            user = %base_path.display(),
            project = %overlay_path.display(),
            "loaded merged configuration"
        );
        Ok(config)
    }
}
