//! Verify command CLI handler.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Stage};
use crate::store::Store;
use crate::verify::{self, IntegrityReport};
use std::path::PathBuf;

pub fn run(
    config: &PipelineConfig,
    store_path: Option<PathBuf>,
    json: bool,
    strict: bool,
    write_report: bool,
) -> anyhow::Result<()> {
    let report = verify_store(config, store_path, json, write_report)?;
    if strict && !report.is_healthy() {
        anyhow::bail!(
            "integrity check failed: {}",
            report
                .violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        );
    }
    Ok(())
}

/// Audit the store, print and persist the report. Shared with `setup`.
pub(super) fn verify_store(
    config: &PipelineConfig,
    store_path: Option<PathBuf>,
    json: bool,
    write_report: bool,
) -> anyhow::Result<IntegrityReport> {
    let store_path = store_path.unwrap_or_else(|| config.store_path());
    if !store_path.is_file() {
        return Err(PipelineError::InputNotFound {
            stage: Stage::Verify,
            what: "store",
            path: store_path,
        }
        .into());
    }

    let store = Store::open(&store_path, Stage::Verify)?;
    let report = verify::verify(&store)?;

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S %:z").to_string();
    let markdown = verify::render_markdown(&report, &generated_at)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("{}", "=".repeat(60));
        eprint!("{}", markdown);
        eprintln!("{}", "=".repeat(60));
    }

    if write_report {
        let path = store_path
            .parent()
            .map(|dir| dir.join(&config.report))
            .unwrap_or_else(|| config.report_path());
        verify::write_report(&path, &markdown)?;
        if !json {
            eprintln!("Report saved to {}", path.display());
        }
    }

    for violation in &report.violations {
        log::warn!("{}", violation);
    }
    Ok(report)
}
