//! Configuration loading and validation (.chronologue/config.toml).

pub mod config;
mod config_merge;
pub mod init;
pub mod paths;
pub mod validate;

pub use config::{
    CalendarConfig, ChronologueConfig, DurationConfig, SourceConfig, ValidationConfig,
};
pub use init::{default_template, init_project};
pub use validate::{validate_config, validate_loaded_config};
