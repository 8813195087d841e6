use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::decode::{PartialTrace, decode_all};

const HEADERS: [&str; 6] = [
    "Event Title",
    "Date",
    "Start Time",
    "Duration (min)",
    "Location",
    "Notes",
];

/// Render decoded events as a Markdown table, one row per event.
pub fn preview_table(events: &[PartialTrace]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 2);
    lines.push(format!("| {} |", HEADERS.join(" | ")));
    lines.push(format!("| {} |", ["---"; HEADERS.len()].join(" | ")));

    for event in events {
        let cells = [
            cell(event.title.as_deref().unwrap_or("Untitled")),
            event
                .start
                .map(|start| start.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            event
                .start
                .map(|start| start.format("%H:%M:%S").to_string())
                .unwrap_or_default(),
            event
                .duration_minutes
                .map(|minutes| minutes.to_string())
                .unwrap_or_default(),
            cell(event.location.as_deref().unwrap_or_default()),
            cell(event.content.as_deref().unwrap_or_default().trim()),
        ];
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}

/// Decode `ics_path` and write `<output_dir>/<stem>_preview.md`.
pub fn write_preview(ics_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let text = std::fs::read_to_string(ics_path)
        .with_context(|| format!("Failed to read calendar: {}", ics_path.display()))?;
    let table = preview_table(&decode_all(&text));

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
    let stem = ics_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "calendar".to_string());
    let output = output_dir.join(format!("{stem}_preview.md"));
    std::fs::write(&output, table)
        .with_context(|| format!("Failed to write preview: {}", output.display()))?;

    info!(output = %output.display(), "wrote preview");
    Ok(output)
}

/// Flatten line breaks and escape pipes so a value stays inside its cell.
fn cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;

    const HEADER: &str = "| Event Title | Date | Start Time | Duration (min) | Location | Notes |\n\
| --- | --- | --- | --- | --- | --- |";

    #[test]
    fn test_table_row_per_event() {
        let event = decode(
            "SUMMARY:Incubator check\n\
DESCRIPTION:Check CO2\\nlog readings\n\
DTSTART:20250513T090000Z\n\
DTEND:20250513T094500Z\n\
LOCATION:wetlab",
        );
        let table = preview_table(&[event]);
        assert_eq!(
            table,
            format!(
                "{HEADER}\n| Incubator check | 2025-05-13 | 09:00:00 | 45 | wetlab | Check CO2 log readings |"
            )
        );
    }

    #[test]
    fn test_missing_fields_leave_cells_blank() {
        let table = preview_table(&[PartialTrace::default()]);
        assert!(table.ends_with("| Untitled |  |  |  |  |  |"));
    }

    #[test]
    fn test_empty_event_list_is_header_only() {
        assert_eq!(preview_table(&[]), HEADER);
    }

    #[test]
    fn test_pipes_are_escaped() {
        let event = PartialTrace {
            title: Some("A | B".to_string()),
            ..Default::default()
        };
        assert!(preview_table(&[event]).contains("| A \\| B |"));
    }

    #[test]
    fn test_write_preview_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let ics = dir.path().join("wetlab_sample.ics");
        std::fs::write(
            &ics,
            "BEGIN:VEVENT\nSUMMARY:Stand-up\nDTSTART:20250513T090000Z\nEND:VEVENT\n",
        )
        .unwrap();

        let output = write_preview(&ics, &dir.path().join("markdown")).unwrap();
        assert!(output.ends_with("markdown/wetlab_sample_preview.md"));
        let content = std::fs::read_to_string(output).unwrap();
        assert!(content.contains("| Stand-up | 2025-05-13 | 09:00:00 |  |  |  |"));
    }

    #[test]
    fn test_write_preview_missing_calendar() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_preview(Path::new("/nonexistent.ics"), dir.path()).is_err());
    }
}
