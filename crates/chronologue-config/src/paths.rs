use std::path::{Path, PathBuf};

/// XDG app name used for user-level paths.
pub const APP_NAME: &str = "chronologue";
/// Per-project configuration directory, relative to the project root.
pub const PROJECT_DIR_NAME: &str = ".chronologue";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// User config directory, e.g. `~/.config/chronologue`.
///
/// `None` when no home directory can be determined (e.g. in containers).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME)
}
