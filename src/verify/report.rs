//! Markdown rendering of the integrity report.

use super::{IntegrityReport, Verdict};
use crate::error::PipelineError;
use crate::model::Entity;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

fn mark(orphans: u64) -> String {
    if orphans == 0 {
        "OK 0".to_string()
    } else {
        format!("FAIL {}", orphans)
    }
}

/// Render the report. `generated_at` is printed verbatim.
pub fn render_markdown(
    report: &IntegrityReport,
    generated_at: &str,
) -> Result<String, fmt::Error> {
    let mut md = String::new();

    writeln!(md, "# Database Integrity Report - REURB")?;
    writeln!(md)?;
    writeln!(md, "**Generated:** {}", generated_at)?;
    writeln!(
        md,
        "**Overall status:** {}",
        match report.verdict {
            Verdict::Healthy => "HEALTHY",
            Verdict::Unhealthy => "PROBLEMS FOUND",
        }
    )?;
    writeln!(md)?;

    writeln!(md, "## Record Counts")?;
    writeln!(md)?;
    writeln!(md, "| Table | Rows |")?;
    writeln!(md, "|-------|------|")?;
    for entity in Entity::ALL {
        writeln!(md, "| **{}** | {} |", entity.label(), report.counts.get(entity))?;
    }
    writeln!(md)?;

    writeln!(md, "## Relationship Validation")?;
    writeln!(md)?;
    writeln!(md, "| Check | Result |")?;
    writeln!(md, "|-------|--------|")?;
    writeln!(
        md,
        "| Orphan quadras (no project) | {} |",
        mark(report.orphans.quadras_without_project)
    )?;
    writeln!(
        md,
        "| Orphan properties (no quadra) | {} |",
        mark(report.orphans.properties_without_quadra)
    )?;
    writeln!(
        md,
        "| Orphan surveys (no property) | {} |",
        mark(report.orphans.surveys_without_property)
    )?;
    writeln!(
        md,
        "| Valid properties | {} / {} |",
        report.valid_properties, report.counts.properties
    )?;
    writeln!(md)?;

    writeln!(md, "## Properties by Status")?;
    writeln!(md)?;
    writeln!(md, "```")?;
    for s in &report.status_distribution {
        writeln!(md, "{:<20} : {:>4} records", s.label(), s.count)?;
    }
    writeln!(md, "```")?;
    writeln!(md)?;

    writeln!(md, "## Properties by Quadra")?;
    writeln!(md)?;
    writeln!(md, "```")?;
    for q in &report.quadra_distribution {
        writeln!(md, "Quadra {:<10} : {:>4} lots", q.name, q.count)?;
    }
    writeln!(md, "```")?;
    writeln!(md)?;

    writeln!(md, "## Survey Sync State")?;
    writeln!(md)?;
    writeln!(md, "```")?;
    for s in &report.survey_sync.by_status {
        writeln!(md, "{:<20} : {:>4} surveys", s.label(), s.count)?;
    }
    if report.survey_sync.unknown_status > 0 {
        writeln!(
            md,
            "{:<20} : {:>4} surveys",
            "unknown status", report.survey_sync.unknown_status
        )?;
    }
    writeln!(md, "{:<20} : {:>4} surveys", "dirty", report.survey_sync.dirty)?;
    writeln!(
        md,
        "{:<20} : {:>4} surveys",
        "never synced", report.survey_sync.never_synced
    )?;
    writeln!(md, "```")?;
    writeln!(md)?;

    writeln!(md, "## Conclusion")?;
    writeln!(md)?;
    match report.verdict {
        Verdict::Healthy => {
            writeln!(md, "**Status:** DATABASE CONSISTENT")?;
            writeln!(md)?;
            writeln!(md, "Every record has valid relationships:")?;
            writeln!(md, "- every quadra belongs to an existing project")?;
            writeln!(md, "- every property belongs to an existing quadra")?;
            writeln!(md, "- every survey belongs to an existing property")?;
        }
        Verdict::Unhealthy => {
            writeln!(md, "**Status:** PROBLEMS DETECTED")?;
            writeln!(md)?;
            writeln!(md, "Inconsistent records:")?;
            writeln!(
                md,
                "- Orphan quadras: {}",
                report.orphans.quadras_without_project
            )?;
            writeln!(
                md,
                "- Orphan properties: {}",
                report.orphans.properties_without_quadra
            )?;
            writeln!(
                md,
                "- Orphan surveys: {}",
                report.orphans.surveys_without_property
            )?;
            writeln!(md)?;
            writeln!(
                md,
                "Recommendation: clean up the orphan rows or load the missing parents, then verify again."
            )?;
        }
    }
    writeln!(md)?;
    writeln!(md, "---")?;
    writeln!(md, "*Report generated by reurb-seed at {}*", generated_at)?;

    Ok(md)
}

pub fn write_report(path: &Path, markdown: &str) -> crate::error::Result<()> {
    fs::write(path, markdown).map_err(|e| PipelineError::io(path, e))
}
