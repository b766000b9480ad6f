//! Ledger inspection for `mbatch status`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::StatusArgs;
use crate::config::{self, BatchConfig};
use crate::ledger::{self, Ledger, StatusCounts};

/// Machine-readable status summary.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub ledger: PathBuf,
    pub batch_id: String,
    pub total: usize,
    pub counts: StatusCounts,
    pub items: Vec<StatusItem>,
}

/// One item row in the status summary.
#[derive(Debug, Serialize)]
pub struct StatusItem {
    pub filename: String,
    pub episode: Option<String>,
    pub status: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub error: Option<String>,
}

/// Summarize the current (or an explicit) batch ledger.
pub fn run_status(args: &StatusArgs) -> Result<()> {
    let ledger_dir = resolve_ledger_dir(args)?;
    let path = match &args.ledger {
        Some(path) => path.clone(),
        None => match ledger::latest_ledger_path(&ledger_dir)? {
            Some(path) => path,
            None => {
                println!("no batch ledger found in {}", ledger_dir.display());
                return Ok(());
            }
        },
    };
    let batch =
        Ledger::load(&path)?.with_context(|| format!("no ledger at {}", path.display()))?;
    let report = build_report(path, &batch);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("render status json")?
        );
    } else {
        print_report(&report);
    }
    Ok(())
}

fn resolve_ledger_dir(args: &StatusArgs) -> Result<PathBuf> {
    if let Some(dir) = &args.ledger_dir {
        return Ok(dir.clone());
    }
    if let Some(path) = &args.config {
        return Ok(config::load_config(path)?.ledger_dir);
    }
    Ok(BatchConfig::default().ledger_dir)
}

fn build_report(path: PathBuf, batch: &Ledger) -> StatusReport {
    let items = batch
        .videos
        .iter()
        .map(|item| StatusItem {
            filename: item.filename.clone(),
            episode: item.episode(),
            status: item.status.as_str().to_string(),
            start_time: item.start_time.clone(),
            end_time: item.end_time.clone(),
            error: item.error.clone(),
        })
        .collect();
    StatusReport {
        ledger: path,
        batch_id: batch.batch_id.clone(),
        total: batch.videos.len(),
        counts: batch.counts(),
        items,
    }
}

fn print_report(report: &StatusReport) {
    println!("batch {} ({})", report.batch_id, report.ledger.display());
    println!(
        "items: {} total / {} completed / {} failed / {} processing / {} pending",
        report.total,
        report.counts.completed,
        report.counts.failed,
        report.counts.processing,
        report.counts.pending
    );
    for item in &report.items {
        let episode = item.episode.as_deref().unwrap_or("--");
        let mut line = format!("  [{}] ep {} {}", item.status, episode, item.filename);
        if let Some(error) = &item.error {
            line.push_str(&format!(" ({error})"));
        }
        println!("{line}");
    }
}
