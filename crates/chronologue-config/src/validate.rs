use std::path::Path;

use anyhow::{Result, bail};
use chronologue_core::{MAX_DURATION_MINUTES, TraceType};
use tracing::warn;

use crate::config::ChronologueConfig;

/// Trace fields that may appear in `validation.required_fields`.
const KNOWN_TRACE_FIELDS: &[&str] = &[
    "id",
    "type",
    "timestamp",
    "content",
    "task_id",
    "title",
    "location",
    "linked_event_uid",
    "chat_url",
    "importance",
    "completion_status",
    "visibility",
    "collaborators",
    "duration_minutes",
    "embedding",
];

/// Load and validate the effective configuration for a project.
pub fn validate_config(project_root: &Path) -> Result<()> {
    let config = ChronologueConfig::load(project_root)?;
    validate_loaded_config(&config)
}

pub fn validate_loaded_config(config: &ChronologueConfig) -> Result<()> {
    validate_calendar(config)?;
    validate_duration(config)?;
    validate_source(config)?;
    validate_required_fields(config)?;
    warn_encoding_fields_not_required(config);
    Ok(())
}

fn validate_calendar(config: &ChronologueConfig) -> Result<()> {
    let calendar = &config.calendar;
    if calendar.prodid.trim().is_empty() {
        bail!("calendar.prodid cannot be empty");
    }
    if calendar.prodid.contains(['\r', '\n']) {
        bail!("calendar.prodid cannot contain line breaks");
    }
    if calendar.uid_domain.trim().is_empty() {
        bail!("calendar.uid_domain cannot be empty");
    }
    if calendar
        .uid_domain
        .chars()
        .any(|c| c.is_whitespace() || c == '@')
    {
        bail!(
            "calendar.uid_domain '{}' must not contain whitespace or '@'",
            calendar.uid_domain
        );
    }
    if calendar.summary_max_chars == 0 {
        bail!("calendar.summary_max_chars must be > 0 (got 0)");
    }
    Ok(())
}

fn validate_duration(config: &ChronologueConfig) -> Result<()> {
    let duration = &config.duration;
    if !(1..=MAX_DURATION_MINUTES).contains(&duration.default_minutes) {
        bail!(
            "duration.default_minutes must be within 1..={MAX_DURATION_MINUTES} (got {})",
            duration.default_minutes
        );
    }
    for (kind, minutes) in &duration.type_defaults {
        if kind.parse::<TraceType>().is_err() {
            bail!(
                "duration.type_defaults has unknown trace type '{kind}'. Valid values: goal, observation, reflection, calendar_event"
            );
        }
        if !(1..=MAX_DURATION_MINUTES).contains(minutes) {
            bail!(
                "duration.type_defaults.{kind} must be within 1..={MAX_DURATION_MINUTES} (got {minutes})"
            );
        }
    }
    Ok(())
}

fn validate_source(config: &ChronologueConfig) -> Result<()> {
    if config.source.collection_key.trim().is_empty() {
        bail!("source.collection_key cannot be empty");
    }
    if config.source.import_task_id.trim().is_empty() {
        bail!("source.import_task_id cannot be empty");
    }
    Ok(())
}

fn validate_required_fields(config: &ChronologueConfig) -> Result<()> {
    for field in &config.validation.required_fields {
        if !KNOWN_TRACE_FIELDS.contains(&field.as_str()) {
            bail!("validation.required_fields has unknown trace field '{field}'");
        }
    }
    Ok(())
}

fn warn_encoding_fields_not_required(config: &ChronologueConfig) {
    for field in ["timestamp", "content"] {
        if !config
            .validation
            .required_fields
            .iter()
            .any(|required| required == field)
        {
            warn!(
                field,
                "validation.required_fields omits a field the encoder needs; traces without it will be skipped at export"
            );
        }
    }
}
