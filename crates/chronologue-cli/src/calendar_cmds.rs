use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chronologue_calendar::{
    FileReport, PartialTrace, decode_all, import_dir, import_file, output_path_for, preview_table,
    tempo_tokens, write_preview,
};
use chronologue_core::{OutputFormat, TraceValidator};
use serde_json::json;

use crate::project::load_config;
use crate::report::print_file_reports;

fn read_calendar(file: &str) -> Result<Vec<PartialTrace>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read calendar: {file}"))?;
    Ok(decode_all(&text))
}

/// Decoded events are always printed as JSON.
pub(crate) fn handle_decode(file: String) -> Result<()> {
    let events = read_calendar(&file)?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

pub(crate) fn handle_tempo(file: String, format: OutputFormat) -> Result<()> {
    let events = read_calendar(&file)?;

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = events
                .iter()
                .map(|event| {
                    json!({
                        "uid": event.id,
                        "title": event.title,
                        "start": event.start_iso(),
                        "tokens": tempo_tokens(event),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            for event in &events {
                let title = event.title.as_deref().unwrap_or("Untitled");
                println!("{title}: {}", tempo_tokens(event).join(" "));
            }
        }
    }
    Ok(())
}

/// Print the preview table, or write `<stem>_preview.md` into `output`.
pub(crate) fn handle_preview(file: String, output: Option<String>) -> Result<()> {
    match output {
        Some(dir) => {
            let path = write_preview(Path::new(&file), Path::new(&dir))?;
            println!("{}", path.display());
        }
        None => {
            let events = read_calendar(&file)?;
            println!("{}", preview_table(&events));
        }
    }
    Ok(())
}

/// Import a calendar file, or every `*.ics` in a directory.
///
/// Returns the process exit code: 1 when any file failed.
pub(crate) fn handle_import(
    input: String,
    output: String,
    task_id: Option<String>,
    cd: Option<String>,
    format: OutputFormat,
) -> Result<i32> {
    let config = load_config(cd.as_deref())?;
    let validator =
        TraceValidator::with_required_fields(config.validation.required_fields.iter().cloned());
    let task_id = task_id.unwrap_or_else(|| config.source.import_task_id.clone());
    let collection_key = &config.source.collection_key;

    let input = PathBuf::from(input);
    let output_dir = Path::new(&output);
    let reports = if input.is_dir() {
        import_dir(&input, output_dir, &task_id, &validator, collection_key)?
    } else {
        let target = output_path_for(&input, output_dir, "json");
        let outcome = import_file(&input, &target, &task_id, &validator, collection_key);
        vec![FileReport {
            source: input,
            outcome,
        }]
    };

    let failed = print_file_reports(&reports, &format);
    Ok(if failed > 0 { 1 } else { 0 })
}
