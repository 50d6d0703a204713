//! Seed orchestrator.
//!
//! Runs the schema file, then each seed entry in order, statement by
//! statement. Entries are file names relative to the data directory or
//! glob patterns; a pattern expands in numeric part order so
//! `parte-10` runs after `parte-9`.

use crate::error::{excerpt, PipelineError, Result, Stage};
use crate::input;
use crate::loader::EXCERPT_LEN;
use crate::model::Entity;
use crate::store::Store;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Configuration for a seed run
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub data_dir: PathBuf,
    /// Required schema file name
    pub schema: String,
    /// Seed entries, run in order
    pub entries: Vec<String>,
    pub progress: bool,
}

/// Outcome of one executed seed file
#[derive(Debug, Clone)]
pub struct SeedFileStats {
    pub path: PathBuf,
    pub statements: usize,
}

/// Statistics from a seed run
#[derive(Debug, Default)]
pub struct SeedStats {
    pub files: Vec<SeedFileStats>,
    /// Entries that matched nothing and were skipped
    pub skipped: Vec<String>,
    /// Final row count per table, root first
    pub counts: Vec<(Entity, u64)>,
}

impl SeedStats {
    pub fn statements(&self) -> usize {
        self.files.iter().map(|f| f.statements).sum()
    }
}

/// Check if an entry contains glob pattern characters.
pub fn is_glob_pattern(entry: &str) -> bool {
    entry.contains('*') || entry.contains('?') || entry.contains('[')
}

/// Expand one seed entry into existing files.
///
/// A literal entry yields itself if it exists; a pattern yields its matches
/// sorted by the last number in the file name, then by name.
pub fn expand_entry(data_dir: &Path, entry: &str) -> Result<Vec<PathBuf>> {
    let joined = data_dir.join(entry);

    if !is_glob_pattern(entry) {
        return Ok(if joined.is_file() { vec![joined] } else { Vec::new() });
    }

    let pattern = joined.to_string_lossy();
    let paths = glob::glob(&pattern).map_err(|e| {
        PipelineError::Config(format!("invalid seed pattern '{}': {}", entry, e))
    })?;

    let mut files = Vec::new();
    for path in paths {
        let path = path.map_err(|e| PipelineError::io(e.path().to_path_buf(), e.into_error()))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| part_number(a).cmp(&part_number(b)).then_with(|| a.cmp(b)));
    Ok(files)
}

/// Last run of digits in the file stem, e.g. 12 for `seed-properties-parte-12.sql`
fn part_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem
        .chars()
        .rev()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.chars().rev().collect::<String>().parse().ok()
}

/// Split a script on `;` into executable statements.
///
/// Semicolons inside single-quoted literals, double-quoted identifiers and
/// `--` comments do not split. Leading comment lines are dropped from each
/// fragment; fragments left empty are discarded.
pub fn split_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b';' => {
                    push_statement(&mut statements, &sql[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
        i += 1;
    }
    push_statement(&mut statements, &sql[start..]);
    statements
}

fn push_statement(statements: &mut Vec<String>, fragment: &str) {
    let body = strip_leading_comments(fragment);
    if !body.is_empty() {
        statements.push(body.to_string());
    }
}

fn strip_leading_comments(fragment: &str) -> &str {
    let mut rest = fragment.trim_start();
    while rest.starts_with("--") {
        rest = match rest.find('\n') {
            Some(pos) => rest[pos + 1..].trim_start(),
            None => "",
        };
    }
    rest.trim_end()
}

/// Execute every statement of one seed file, in order.
pub fn run_file(store: &Store, path: &Path) -> Result<usize> {
    let sql = input::read_text(path, Stage::Seed, "seed file")?;
    let statements = split_statements(&sql);

    for (idx, statement) in statements.iter().enumerate() {
        store
            .execute(statement)
            .map_err(|source| PipelineError::Seed {
                file: path.to_path_buf(),
                statement: idx + 1,
                excerpt: excerpt(statement, EXCERPT_LEN),
                source,
            })?;
        log::debug!(
            "{} [{}/{}] {}",
            path.display(),
            idx + 1,
            statements.len(),
            excerpt(statement, 60)
        );
    }
    Ok(statements.len())
}

/// Schema, then every seed entry, then final counts.
pub fn run(store: &Store, config: &SeedConfig) -> Result<SeedStats> {
    let mut stats = SeedStats::default();

    store.apply_schema(&config.data_dir.join(&config.schema), Stage::Seed)?;
    eprintln!("Schema applied: {}", config.schema);

    let mut files = Vec::new();
    for entry in &config.entries {
        let matched = expand_entry(&config.data_dir, entry)?;
        if matched.is_empty() {
            log::warn!("seed entry '{}' matched no file, skipping", entry);
            stats.skipped.push(entry.clone());
        }
        files.extend(matched);
    }

    let pb = if config.progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    for path in files {
        if let Some(pb) = &pb {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            pb.set_message(name);
        }
        let statements = match run_file(store, &path) {
            Ok(n) => n,
            Err(e) => {
                if let Some(pb) = &pb {
                    pb.abandon();
                }
                return Err(e);
            }
        };
        if let Some(pb) = &pb {
            pb.inc(1);
        } else {
            eprintln!("  {} ({} statements)", path.display(), statements);
        }
        stats.files.push(SeedFileStats { path, statements });
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    stats.counts = store
        .counts()
        .map_err(|e| PipelineError::store(Stage::Seed, e))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_statements_basic() {
        let sql = "CREATE TABLE a (x INT);\nINSERT INTO a VALUES (1);\n\n";
        assert_eq!(
            split_statements(sql),
            vec!["CREATE TABLE a (x INT)", "INSERT INTO a VALUES (1)"]
        );
    }

    #[test]
    fn test_semicolon_in_literal_does_not_split() {
        let sql = "INSERT INTO a VALUES ('x; y', 'it''s; fine');";
        assert_eq!(split_statements(sql).len(), 1);
    }

    #[test]
    fn test_comment_prefixed_statement_kept() {
        let sql = "-- Projects\n-- more notes; with a semicolon\nINSERT INTO a VALUES (1);\n-- trailing comment only\n";
        assert_eq!(split_statements(sql), vec!["INSERT INTO a VALUES (1)"]);
    }

    #[test]
    fn test_part_number_ordering() {
        let dir = TempDir::new().unwrap();
        for n in [1, 2, 10, 9] {
            fs::write(dir.path().join(format!("seed-properties-parte-{}.sql", n)), "").unwrap();
        }
        let files = expand_entry(dir.path(), "seed-properties-parte-*.sql").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "seed-properties-parte-1.sql",
                "seed-properties-parte-2.sql",
                "seed-properties-parte-9.sql",
                "seed-properties-parte-10.sql"
            ]
        );
    }

    #[test]
    fn test_missing_literal_entry_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(expand_entry(dir.path(), "seed.sql").unwrap().is_empty());
        assert!(expand_entry(dir.path(), "parte-*.sql").unwrap().is_empty());
    }
}
