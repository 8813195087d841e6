use std::path::Path;

use anyhow::{Context, Result, bail};
use chronologue_calendar::{EventEncoder, SyncFields, load_source, sync_fields};
use chronologue_config::ChronologueConfig;
use chronologue_core::{OutputFormat, TraceValidator, ValidationError};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::project::load_config;

#[derive(Debug, Serialize)]
struct Verdict {
    index: usize,
    id: Option<String>,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Verdict {
    fn new(index: usize, record: &Value, result: Result<(), ValidationError>) -> Self {
        let id = record.get("id").and_then(Value::as_str).map(str::to_string);
        match result {
            Ok(()) => Self {
                index,
                id,
                valid: true,
                rule: None,
                error: None,
            },
            Err(err) => Self {
                index,
                id,
                valid: false,
                rule: Some(err.rule()),
                error: Some(err.to_string()),
            },
        }
    }
}

fn validator_for(config: &ChronologueConfig) -> TraceValidator {
    TraceValidator::with_required_fields(config.validation.required_fields.iter().cloned())
}

fn load_traces(config: &ChronologueConfig, file: &str) -> Result<Vec<Value>> {
    load_source(Path::new(file), &config.source.collection_key)
}

/// Returns the process exit code: 1 when any trace is invalid.
pub(crate) fn handle_validate(
    file: String,
    cd: Option<String>,
    format: OutputFormat,
) -> Result<i32> {
    let config = load_config(cd.as_deref())?;
    let validator = validator_for(&config);
    let traces = load_traces(&config, &file)?;

    let verdicts: Vec<Verdict> = traces
        .iter()
        .enumerate()
        .map(|(index, record)| Verdict::new(index, record, validator.validate(record).map(drop)))
        .collect();
    let invalid = verdicts.iter().filter(|v| !v.valid).count();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&verdicts)?);
        }
        OutputFormat::Text => {
            for verdict in &verdicts {
                let id = verdict.id.as_deref().unwrap_or("unknown");
                match &verdict.error {
                    None => println!("ok       [{}] {id}", verdict.index),
                    Some(error) => println!("invalid  [{}] {id}: {error}", verdict.index),
                }
            }
            println!("{} valid, {invalid} invalid", verdicts.len() - invalid);
        }
    }

    Ok(if invalid > 0 { 1 } else { 0 })
}

pub(crate) fn handle_encode(
    file: String,
    id: String,
    cd: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(cd.as_deref())?;
    let traces = load_traces(&config, &file)?;
    let record = traces
        .iter()
        .find(|record| record.get("id").and_then(Value::as_str) == Some(id.as_str()))
        .with_context(|| format!("No trace with id '{id}' in {file}"))?;

    let trace = match validator_for(&config).validate(record) {
        Ok(trace) => trace,
        Err(err) => bail!("Trace '{id}' is invalid: {err}"),
    };
    let block = EventEncoder::from_config(&config).encode(&trace)?;

    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "uid": block.uid,
                "event": block.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => println!("{block}"),
    }
    Ok(())
}

pub(crate) fn handle_sync_fields(file: String, cd: Option<String>) -> Result<()> {
    let config = load_config(cd.as_deref())?;
    let validator = validator_for(&config);
    let encoder = EventEncoder::from_config(&config);
    let traces = load_traces(&config, &file)?;

    let mut mappings: Vec<SyncFields> = Vec::with_capacity(traces.len());
    for (index, record) in traces.iter().enumerate() {
        let result = validator
            .validate(record)
            .map_err(|err| err.to_string())
            .and_then(|trace| sync_fields(&encoder, &trace).map_err(|err| err.to_string()));
        match result {
            Ok(fields) => mappings.push(fields),
            Err(reason) => warn!(index, %reason, "skipping trace"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&mappings)?);
    Ok(())
}
