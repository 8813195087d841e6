use chronologue_calendar::{FileOutcome, FileReport};
use chronologue_core::OutputFormat;
use serde_json::json;

/// Print per-file outcomes and return the number of failed files.
pub(crate) fn print_file_reports(reports: &[FileReport], format: &OutputFormat) -> usize {
    let failed = reports.iter().filter(|r| r.outcome.is_err()).count();

    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = reports.iter().map(report_json).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Text => {
            for report in reports {
                let source = report.source.display();
                match &report.outcome {
                    Ok(FileOutcome::Written {
                        path,
                        events,
                        skipped,
                    }) => println!(
                        "{source} -> {} ({events} written, {skipped} skipped)",
                        path.display()
                    ),
                    Ok(FileOutcome::NothingToEmit { skipped }) => {
                        println!("{source}: nothing to emit ({skipped} skipped)")
                    }
                    Err(err) => println!("{source}: failed: {err:#}"),
                }
            }
        }
    }

    failed
}

fn report_json(report: &FileReport) -> serde_json::Value {
    let source = report.source.display().to_string();
    match &report.outcome {
        Ok(FileOutcome::Written {
            path,
            events,
            skipped,
        }) => json!({
            "source": source,
            "status": "written",
            "output": path.display().to_string(),
            "events": events,
            "skipped": skipped,
        }),
        Ok(FileOutcome::NothingToEmit { skipped }) => json!({
            "source": source,
            "status": "nothing_to_emit",
            "skipped": skipped,
        }),
        Err(err) => json!({
            "source": source,
            "status": "failed",
            "error": format!("{err:#}"),
        }),
    }
}
