//! Integrity verifier.
//!
//! Audits the persisted hierarchy with set queries: table counts, orphans
//! at each foreign-key edge, lot status distribution and lots per quadra.
//! Orphans make the verdict unhealthy but are never an error.

mod report;

pub use report::{render_markdown, write_report};

use crate::error::{PipelineError, Result, Stage};
use crate::model::{Entity, SyncStatus};
use crate::store::Store;
use serde::Serialize;

/// Display label for a missing status
pub const NO_STATUS: &str = "(none)";

/// Row counts of the four tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub projects: u64,
    pub quadras: u64,
    pub properties: u64,
    pub surveys: u64,
}

impl EntityCounts {
    pub fn get(&self, entity: Entity) -> u64 {
        match entity {
            Entity::Project => self.projects,
            Entity::Quadra => self.quadras,
            Entity::Property => self.properties,
            Entity::Survey => self.surveys,
        }
    }
}

/// A foreign-key edge whose child rows reference a missing parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityViolation {
    pub child: Entity,
    pub parent: Entity,
    pub column: &'static str,
    pub orphans: u64,
}

impl std::fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}.{} reference a missing {} row",
            self.orphans,
            self.child.table(),
            self.column,
            self.parent.table()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanCounts {
    pub quadras_without_project: u64,
    pub properties_without_quadra: u64,
    pub surveys_without_property: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    /// `None` for rows whose status is NULL
    pub status: Option<String>,
    pub count: u64,
}

impl StatusCount {
    pub fn label(&self) -> &str {
        self.status.as_deref().unwrap_or(NO_STATUS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuadraCount {
    pub id: String,
    pub name: String,
    pub count: u64,
}

/// Synchronization state of field surveys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SurveySync {
    /// Surveys per known status, in draft → pending_sync → synced order
    pub by_status: Vec<StatusCount>,
    /// Surveys whose status is not a known sync status
    pub unknown_status: u64,
    /// Local edits not yet pushed
    pub dirty: u64,
    pub never_synced: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Healthy,
    Unhealthy,
}

/// Everything the verifier measured. Deterministic for a given store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub verdict: Verdict,
    pub counts: EntityCounts,
    pub orphans: OrphanCounts,
    /// Lots whose quadra resolves
    pub valid_properties: u64,
    pub status_distribution: Vec<StatusCount>,
    pub quadra_distribution: Vec<QuadraCount>,
    pub survey_sync: SurveySync,
    pub violations: Vec<IntegrityViolation>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.verdict == Verdict::Healthy
    }
}

/// `SELECT COUNT(*)` of `child` rows whose reference has no parent row
fn orphan_query(child: Entity) -> Option<String> {
    let (parent, column) = child.parent()?;
    Some(format!(
        "SELECT COUNT(*) FROM {child} c WHERE NOT EXISTS \
         (SELECT 1 FROM {parent} p WHERE p.id = c.{column})",
        child = child.table(),
        parent = parent.table(),
        column = column
    ))
}

/// Run every audit query against the store.
pub fn verify(store: &Store) -> Result<IntegrityReport> {
    audit(store).map_err(|e| PipelineError::store(Stage::Verify, e))
}

fn audit(store: &Store) -> duckdb::Result<IntegrityReport> {
    let counts = EntityCounts {
        projects: store.table_count(Entity::Project)?,
        quadras: store.table_count(Entity::Quadra)?,
        properties: store.table_count(Entity::Property)?,
        surveys: store.table_count(Entity::Survey)?,
    };

    let mut violations = Vec::new();
    let mut orphans_at = |child: Entity| -> duckdb::Result<u64> {
        let Some(sql) = orphan_query(child) else {
            return Ok(0);
        };
        let n = store.count(&sql)?;
        if n > 0 {
            if let Some((parent, column)) = child.parent() {
                violations.push(IntegrityViolation {
                    child,
                    parent,
                    column,
                    orphans: n,
                });
            }
        }
        Ok(n)
    };
    let orphans = OrphanCounts {
        quadras_without_project: orphans_at(Entity::Quadra)?,
        properties_without_quadra: orphans_at(Entity::Property)?,
        surveys_without_property: orphans_at(Entity::Survey)?,
    };

    let valid_properties = store.count(
        "SELECT COUNT(*) FROM reurb_properties pr \
         WHERE EXISTS (SELECT 1 FROM reurb_quadras q WHERE q.id = pr.quadra_id)",
    )?;

    let status_distribution = status_counts(
        store,
        "SELECT status, COUNT(*) AS n FROM reurb_properties \
         GROUP BY status ORDER BY n DESC, status NULLS FIRST",
    )?;

    let mut stmt = store.connection().prepare(
        "SELECT q.id, COALESCE(q.name, ''), COUNT(pr.id) AS n \
         FROM reurb_quadras q LEFT JOIN reurb_properties pr ON pr.quadra_id = q.id \
         GROUP BY q.id, q.name ORDER BY n DESC, q.name, q.id",
    )?;
    let quadra_distribution = stmt
        .query_map([], |row| {
            Ok(QuadraCount {
                id: row.get(0)?,
                name: row.get(1)?,
                count: row.get::<_, i64>(2)?.max(0) as u64,
            })
        })?
        .collect::<duckdb::Result<Vec<_>>>()?;

    let survey_sync = survey_sync(store)?;

    let verdict = if violations.is_empty() {
        Verdict::Healthy
    } else {
        Verdict::Unhealthy
    };

    Ok(IntegrityReport {
        verdict,
        counts,
        orphans,
        valid_properties,
        status_distribution,
        quadra_distribution,
        survey_sync,
        violations,
    })
}

fn status_counts(store: &Store, sql: &str) -> duckdb::Result<Vec<StatusCount>> {
    let mut stmt = store.connection().prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(StatusCount {
            status: row.get(0)?,
            count: row.get::<_, i64>(1)?.max(0) as u64,
        })
    })?;
    rows.collect()
}

fn survey_sync(store: &Store) -> duckdb::Result<SurveySync> {
    let raw = status_counts(
        store,
        "SELECT status, COUNT(*) AS n FROM reurb_surveys \
         GROUP BY status ORDER BY status NULLS FIRST",
    )?;

    let mut sync = SurveySync::default();
    let known = [SyncStatus::Draft, SyncStatus::PendingSync, SyncStatus::Synced];
    for status in known {
        let count = raw
            .iter()
            .filter(|r| parse_sync(r) == Some(status))
            .map(|r| r.count)
            .sum();
        sync.by_status.push(StatusCount {
            status: Some(status.to_string()),
            count,
        });
    }
    sync.unknown_status = raw
        .iter()
        .filter(|r| parse_sync(r).is_none())
        .map(|r| r.count)
        .sum();
    sync.dirty = store.count("SELECT COUNT(*) FROM reurb_surveys WHERE is_dirty = 1")?;
    sync.never_synced = store.count("SELECT COUNT(*) FROM reurb_surveys WHERE last_sync IS NULL")?;
    Ok(sync)
}

fn parse_sync(row: &StatusCount) -> Option<SyncStatus> {
    row.status.as_deref()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_query_per_edge() {
        assert!(orphan_query(Entity::Project).is_none());
        let sql = orphan_query(Entity::Property).unwrap();
        assert!(sql.contains("FROM reurb_properties c WHERE NOT EXISTS"));
        assert!(sql.contains("FROM reurb_quadras p WHERE p.id = c.quadra_id"));
    }

    #[test]
    fn test_violation_display() {
        let v = IntegrityViolation {
            child: Entity::Survey,
            parent: Entity::Property,
            column: "property_id",
            orphans: 3,
        };
        assert_eq!(
            v.to_string(),
            "3 reurb_surveys.property_id reference a missing reurb_properties row"
        );
    }
}
