use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::consolidate::Consolidator;
use crate::source::load_source;

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written {
        path: PathBuf,
        events: usize,
        skipped: usize,
    },
    /// Every trace was skipped (or there were none); no file was written.
    NothingToEmit { skipped: usize },
}

#[derive(Debug)]
pub struct FileReport {
    pub source: PathBuf,
    pub outcome: Result<FileOutcome>,
}

/// Consolidate one source document into `output`.
///
/// The output is written only when at least one trace encodes; parent
/// directories are created as needed.
pub fn consolidate_file(
    consolidator: &Consolidator,
    source: &Path,
    output: &Path,
    collection_key: &str,
) -> Result<FileOutcome> {
    let traces = load_source(source, collection_key)?;
    let consolidation = consolidator.consolidate(&traces);
    let skipped = consolidation.skipped.len();

    let Some(document) = consolidation.document else {
        warn!(source = %source.display(), skipped, "nothing to emit");
        return Ok(FileOutcome::NothingToEmit { skipped });
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(output, document.as_bytes())
        .with_context(|| format!("Failed to write calendar: {}", output.display()))?;

    let events = consolidation.blocks.len();
    info!(output = %output.display(), events, skipped, "wrote calendar");
    Ok(FileOutcome::Written {
        path: output.to_path_buf(),
        events,
        skipped,
    })
}

/// Files in `dir` (not recursive) with the given extension, sorted by path.
pub fn list_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let pattern = format!(
        "{}/*.{extension}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(err) => warn!(error = %err, "unreadable directory entry"),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Output path for a source: `<output_dir>/<stem>.<extension>`.
pub fn output_path_for(source: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{stem}.{extension}"))
}

/// Pair every `*.<source_ext>` in `input_dir` with `<output_dir>/<stem>.<output_ext>`.
pub fn plan_outputs(
    input_dir: &Path,
    output_dir: &Path,
    source_ext: &str,
    output_ext: &str,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    Ok(list_sources(input_dir, source_ext)?
        .into_iter()
        .map(|source| {
            let output = output_path_for(&source, output_dir, output_ext);
            (source, output)
        })
        .collect())
}

/// Consolidate every `*.json` in `input_dir` into `<output_dir>/<stem>.ics`,
/// one file at a time on the calling thread.
///
/// Failures are recorded per file and never stop the remaining files. The
/// `chronologue` binary runs the same plan concurrently.
pub fn consolidate_dir(
    consolidator: &Consolidator,
    input_dir: &Path,
    output_dir: &Path,
    collection_key: &str,
) -> Result<Vec<FileReport>> {
    let jobs = plan_outputs(input_dir, output_dir, "json", "ics")?;
    let reports = jobs
        .into_iter()
        .map(|(source, output)| {
            let outcome = consolidate_file(consolidator, &source, &output, collection_key);
            if let Err(err) = &outcome {
                warn!(source = %source.display(), error = %format!("{err:#}"), "source failed");
            }
            FileReport { source, outcome }
        })
        .collect();
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(path: &Path, value: serde_json::Value) {
        std::fs::write(path, serde_json::to_string(&value).unwrap()).unwrap();
    }

    fn lab_trace(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": "observation",
            "timestamp": "2024-04-07T09:00:00Z",
            "content": "Temperature drifted above target.",
            "task_id": "lab_ops",
            "location": "wetlab_sync"
        })
    }

    #[test]
    fn test_consolidate_file_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lab.json");
        write_json(&source, json!({"memory": [lab_trace("t1"), {"id": "bad"}]}));
        let output = dir.path().join("out/lab.ics");

        let outcome =
            consolidate_file(&Consolidator::default(), &source, &output, "memory").unwrap();
        assert_eq!(
            outcome,
            FileOutcome::Written {
                path: output.clone(),
                events: 1,
                skipped: 1
            }
        );
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("BEGIN:VCALENDAR\r"));
        assert!(written.contains("DTEND:20240407T091500Z\r"));
        assert!(written.ends_with("END:VCALENDAR"));
    }

    #[test]
    fn test_consolidate_file_nothing_to_emit() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.json");
        write_json(&source, json!({"memory": [{"id": "bad"}]}));
        let output = dir.path().join("empty.ics");

        let outcome =
            consolidate_file(&Consolidator::default(), &source, &output, "memory").unwrap();
        assert_eq!(outcome, FileOutcome::NothingToEmit { skipped: 1 });
        assert!(!output.exists());
    }

    #[test]
    fn test_consolidate_dir_isolates_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_json(&input.path().join("a.json"), json!({"memory": [lab_trace("t1")]}));
        std::fs::write(input.path().join("b.json"), "{not json").unwrap();
        write_json(&input.path().join("c.json"), json!({"memory": [lab_trace("t2")]}));
        std::fs::write(input.path().join("notes.txt"), "ignored").unwrap();

        let reports =
            consolidate_dir(&Consolidator::default(), input.path(), output.path(), "memory")
                .unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].source.ends_with("a.json"));
        assert!(reports[0].outcome.is_ok());
        assert!(reports[1].outcome.is_err());
        assert!(reports[2].outcome.is_ok());
        assert!(output.path().join("a.ics").exists());
        assert!(!output.path().join("b.ics").exists());
        assert!(output.path().join("c.ics").exists());
    }

    #[test]
    fn test_plan_outputs_pairs_sorted_sources() {
        let input = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("b.json"), "{}").unwrap();
        std::fs::write(input.path().join("a.json"), "{}").unwrap();
        std::fs::write(input.path().join("a.ics"), "").unwrap();

        let jobs = plan_outputs(input.path(), Path::new("out"), "json", "ics").unwrap();
        assert_eq!(
            jobs,
            vec![
                (input.path().join("a.json"), PathBuf::from("out/a.ics")),
                (input.path().join("b.json"), PathBuf::from("out/b.ics")),
            ]
        );
    }

    #[test]
    fn test_list_sources_rejects_missing_dir() {
        assert!(list_sources(Path::new("/nonexistent/dir"), "json").is_err());
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("in/lab.json"), Path::new("out"), "ics"),
            PathBuf::from("out/lab.ics")
        );
    }
}
