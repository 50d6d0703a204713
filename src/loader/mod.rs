//! Batch loader.
//!
//! Partitions tuples into fixed-size, order-preserving batches and runs one
//! multi-row upsert per batch, strictly in sequence. The first rejected
//! batch stops the run; everything committed before it stays.

use crate::convert::UPSERT_VERB;
use crate::error::{excerpt, PipelineError, Result, Stage};
use crate::model::{PROPERTY_COLUMNS, PROPERTY_TABLE};
use crate::store::Store;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Characters of a failing statement kept in error messages
pub const EXCERPT_LEN: usize = 200;

/// Split `items` into contiguous groups of at most `size`, in order.
pub fn partition<T>(items: &[T], size: usize) -> Result<Vec<&[T]>> {
    if size == 0 {
        return Err(PipelineError::Config(
            "batch size must be at least 1".to_string(),
        ));
    }
    Ok(items.chunks(size).collect())
}

/// One multi-row upsert for a batch of tuple literals.
pub fn upsert_statement<S: AsRef<str>>(table: &str, columns: &[&str], batch: &[S]) -> String {
    let rows: Vec<&str> = batch.iter().map(|t| t.as_ref().trim()).collect();
    format!(
        "{} {} ({}) VALUES\n{};",
        UPSERT_VERB,
        table,
        columns.join(", "),
        rows.join(",\n")
    )
}

/// Statistics from a load run
#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    pub batches: usize,
    /// Tuples submitted so far
    pub attempted: usize,
    /// Rows the store reported as written
    pub inserted: usize,
    pub duration_secs: f64,
}

impl std::fmt::Display for LoadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} records in {} batches ({:.2}s)",
            self.inserted, self.attempted, self.batches, self.duration_secs
        )
    }
}

pub struct BatchLoader<'a> {
    store: &'a Store,
    table: &'a str,
    columns: &'a [&'a str],
    batch_size: usize,
    progress: bool,
}

impl<'a> BatchLoader<'a> {
    /// Loader for the property table
    pub fn new(store: &'a Store, batch_size: usize) -> Self {
        Self {
            store,
            table: PROPERTY_TABLE,
            columns: &PROPERTY_COLUMNS,
            batch_size,
            progress: false,
        }
    }

    pub fn with_target(mut self, table: &'a str, columns: &'a [&'a str]) -> Self {
        self.table = table;
        self.columns = columns;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Delete the lots of every quadra belonging to `project_id`, as a
    /// clean slate before reloading that project's export.
    pub fn clear_project(&self, project_id: &str) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE quadra_id IN (SELECT id FROM reurb_quadras WHERE project_id = ?)",
            self.table
        );
        let deleted = self
            .store
            .connection()
            .execute(&sql, duckdb::params![project_id])
            .map_err(|e| PipelineError::store(Stage::Load, e))?;
        log::info!("cleared {} lots of project {}", deleted, project_id);
        Ok(deleted)
    }

    /// Load all tuples, one upsert per batch.
    pub fn load<S: AsRef<str>>(&self, tuples: &[S]) -> Result<LoadStats> {
        let start = Instant::now();
        let batches = partition(tuples, self.batch_size)?;
        let mut stats = LoadStats::default();

        let pb = if self.progress {
            let pb = ProgressBar::new(tuples.len() as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        for (idx, batch) in batches.into_iter().enumerate() {
            let sql = upsert_statement(self.table, self.columns, batch);
            stats.attempted += batch.len();

            let written = self.store.execute(&sql).map_err(|source| {
                if let Some(pb) = &pb {
                    pb.abandon_with_message(format!("batch {} failed", idx + 1));
                }
                PipelineError::Load {
                    batch: idx + 1,
                    committed: stats.inserted,
                    excerpt: excerpt(&sql, EXCERPT_LEN),
                    source,
                }
            })?;

            stats.inserted += written;
            stats.batches += 1;

            match &pb {
                Some(pb) => {
                    pb.set_position(stats.attempted as u64);
                    pb.set_message(format!("(batch {})", stats.batches));
                }
                None => log::debug!(
                    "batch {}: {} records (attempted {}, inserted {})",
                    stats.batches,
                    batch.len(),
                    stats.attempted,
                    stats.inserted
                ),
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        stats.duration_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_sizes() {
        let items: Vec<usize> = (0..250).collect();
        let batches = partition(&items, 100).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(batches.concat(), items);
    }

    #[test]
    fn test_partition_exact_and_empty() {
        let items = vec![1, 2, 3, 4];
        assert_eq!(partition(&items, 2).unwrap().len(), 2);
        assert_eq!(partition(&items, 10).unwrap().len(), 1);
        assert!(partition::<u8>(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn test_partition_zero_is_config_error() {
        let err = partition(&[1, 2], 0).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_upsert_statement() {
        let sql = upsert_statement("t", &["id", "name"], &["('a', 'x')", " ('b', 'y') "]);
        assert_eq!(
            sql,
            "INSERT OR REPLACE INTO t (id, name) VALUES\n('a', 'x'),\n('b', 'y');"
        );
    }

    #[test]
    fn test_load_into_small_table() {
        let store = Store::open_in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE t (id VARCHAR PRIMARY KEY, name VARCHAR);")
            .unwrap();
        let tuples: Vec<String> = (0..7).map(|i| format!("('id{}', 'n{}')", i, i)).collect();

        let loader = BatchLoader::new(&store, 3).with_target("t", &["id", "name"]);
        let stats = loader.load(&tuples).unwrap();
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.attempted, 7);
        assert_eq!(stats.inserted, 7);
        assert_eq!(store.count("SELECT COUNT(*) FROM t").unwrap(), 7);
    }

    #[test]
    fn test_failing_batch_keeps_earlier_batches() {
        let store = Store::open_in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE t (id VARCHAR PRIMARY KEY, n INTEGER);")
            .unwrap();
        let tuples = vec!["('a', 1)", "('b', 2)", "('c', 'not a number')", "('d', 4)"];

        let loader = BatchLoader::new(&store, 2).with_target("t", &["id", "n"]);
        let err = loader.load(&tuples).unwrap_err();
        match err {
            PipelineError::Load {
                batch,
                committed,
                excerpt,
                ..
            } => {
                assert_eq!(batch, 2);
                assert_eq!(committed, 2);
                assert!(excerpt.starts_with("INSERT OR REPLACE INTO t (id, n) VALUES ('c'"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.count("SELECT COUNT(*) FROM t").unwrap(), 2);
    }
}
