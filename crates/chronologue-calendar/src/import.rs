use std::path::Path;

use anyhow::{Context, Result};
use chronologue_core::{MemoryTrace, TraceValidator};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::batch::{FileOutcome, FileReport, plan_outputs};
use crate::decode::decode_all;
use crate::source::write_source;

/// Result of importing one calendar document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub traces: Vec<MemoryTrace>,
    /// Events that decoded but did not validate.
    pub rejected: usize,
}

/// Decode every event in `text` and keep those that validate.
pub fn import_calendar_text(
    text: &str,
    task_id: &str,
    validator: &TraceValidator,
) -> ImportReport {
    let mut report = ImportReport::default();
    for event in decode_all(text) {
        let record = event.to_record(task_id);
        match validator.validate(&record) {
            Ok(trace) => {
                debug!(trace_id = trace.display_id(), "imported event");
                report.traces.push(trace);
            }
            Err(err) => {
                warn!(
                    uid = event.id.as_deref().unwrap_or("unknown"),
                    rule = err.rule(),
                    error = %err,
                    "skipping invalid event"
                );
                report.rejected += 1;
            }
        }
    }
    report
}

pub fn import_calendar(
    path: &Path,
    task_id: &str,
    validator: &TraceValidator,
) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read calendar: {}", path.display()))?;
    Ok(import_calendar_text(&text, task_id, validator))
}

/// Import every `*.ics` in `input_dir` into `<output_dir>/<stem>.json`.
///
/// A document is written for every readable calendar, even when no event
/// validated. Per-file failures never stop the remaining files.
pub fn import_dir(
    input_dir: &Path,
    output_dir: &Path,
    task_id: &str,
    validator: &TraceValidator,
    collection_key: &str,
) -> Result<Vec<FileReport>> {
    let jobs = plan_outputs(input_dir, output_dir, "ics", "json")?;
    let reports = jobs
        .into_iter()
        .map(|(source, output)| {
            let outcome = import_file(&source, &output, task_id, validator, collection_key);
            if let Err(err) = &outcome {
                warn!(source = %source.display(), error = %format!("{err:#}"), "import failed");
            }
            FileReport { source, outcome }
        })
        .collect();
    Ok(reports)
}

/// Import one calendar file and write its traces to `output`.
pub fn import_file(
    source: &Path,
    output: &Path,
    task_id: &str,
    validator: &TraceValidator,
    collection_key: &str,
) -> Result<FileOutcome> {
    let report = import_calendar(source, task_id, validator)?;
    let events = report.traces.len();
    let records = report
        .traces
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()
        .context("Failed to serialize imported traces")?;
    write_source(output, collection_key, records)?;
    info!(
        output = %output.display(),
        events,
        rejected = report.rejected,
        "wrote imported traces"
    );
    Ok(FileOutcome::Written {
        path: output.to_path_buf(),
        events,
        skipped: report.rejected,
    })
}
