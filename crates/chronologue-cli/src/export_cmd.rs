use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chronologue_calendar::{Consolidator, FileReport, consolidate_file, plan_outputs};
use chronologue_core::OutputFormat;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::project::load_config;
use crate::report::print_file_reports;

/// Consolidate a source document, or every `*.json` in a directory.
///
/// Returns the process exit code: 1 when any file failed.
pub(crate) async fn handle_export(
    input: String,
    output: Option<String>,
    cd: Option<String>,
    format: OutputFormat,
) -> Result<i32> {
    let config = load_config(cd.as_deref())?;
    let consolidator = Arc::new(Consolidator::from_config(&config));
    let collection_key = config.source.collection_key.clone();

    let input = PathBuf::from(input);
    let jobs = plan_jobs(&input, output.as_deref().map(Path::new))?;
    debug!(files = jobs.len(), "exporting");

    let reports = run_jobs(consolidator, collection_key, jobs).await;
    let failed = print_file_reports(&reports, &format);
    Ok(if failed > 0 { 1 } else { 0 })
}

/// Pair each source with its output path.
fn plan_jobs(input: &Path, output: Option<&Path>) -> Result<Vec<(PathBuf, PathBuf)>> {
    if input.is_dir() {
        return plan_outputs(input, output.unwrap_or(input), "json", "ics");
    }

    if !input.exists() {
        anyhow::bail!("Input not found: {}", input.display());
    }
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("ics"),
    };
    Ok(vec![(input.to_path_buf(), target)])
}

/// Run every job on the blocking pool; reports come back sorted by source.
///
/// A job whose task fails to join still yields a failed report.
async fn run_jobs(
    consolidator: Arc<Consolidator>,
    collection_key: String,
    jobs: Vec<(PathBuf, PathBuf)>,
) -> Vec<FileReport> {
    let planned: Vec<PathBuf> = jobs.iter().map(|(source, _)| source.clone()).collect();
    let mut join_set = JoinSet::new();
    for (source, target) in jobs {
        let consolidator = Arc::clone(&consolidator);
        let collection_key = collection_key.clone();
        join_set.spawn_blocking(move || {
            let outcome = consolidate_file(&consolidator, &source, &target, &collection_key);
            FileReport { source, outcome }
        });
    }

    let mut reports = Vec::new();
    let mut join_failures = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined.context("export task join failure") {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("{e:#}");
                join_failures.push(format!("{e:#}"));
            }
        }
    }
    account_for_lost_jobs(&mut reports, &planned, &join_failures);
    reports.sort_by(|a, b| a.source.cmp(&b.source));
    reports
}

/// Add a failed report for every planned source that produced none.
fn account_for_lost_jobs(reports: &mut Vec<FileReport>, planned: &[PathBuf], failures: &[String]) {
    let reported: HashSet<PathBuf> = reports.iter().map(|r| r.source.clone()).collect();
    let cause = if failures.is_empty() {
        "task did not complete".to_string()
    } else {
        failures.join("; ")
    };
    for source in planned {
        if !reported.contains(source) {
            reports.push(FileReport {
                source: source.clone(),
                outcome: Err(anyhow!("Export of {} was lost: {cause}", source.display())),
            });
        }
    }
}
