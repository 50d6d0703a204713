//! Convert stage: exported dump → numbered seed files.
//!
//! The dump is rewritten by the literal transformer, split into tuples,
//! checked against the 24-column property shape and written out as
//! self-contained upsert files of at most `batch_size` rows each.

mod literals;
mod tuples;
mod warnings;

pub use literals::{
    extract_values, find_values_keyword, header_columns, prepare, rewrite_booleans,
    strip_schema_qualifier, to_upsert, transform, ArrayMode, TransformOptions, UPSERT_VERB,
};
pub use tuples::{check_arity, duplicate_ids, split_fields, split_tuples, ScanMode};
pub use warnings::ConvertWarning;

use crate::error::{ParseError, PipelineError, Result, Stage};
use crate::input;
use crate::loader::{partition, upsert_statement};
use crate::model::{PROPERTY_COLUMNS, PROPERTY_TABLE};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// File name prefix of generated property seed files
pub const SEED_PART_PREFIX: &str = "seed-properties-parte-";

/// Name of the `n`-th (1-based) property seed file
pub fn seed_part_name(n: usize) -> String {
    format!("{}{}.sql", SEED_PART_PREFIX, n)
}

/// Configuration for the convert stage
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Exported dump, optionally compressed
    pub input: PathBuf,
    /// Directory receiving the seed files
    pub output_dir: PathBuf,
    pub batch_size: usize,
    pub scan_mode: ScanMode,
    pub array_mode: ArrayMode,
    /// Parse and report without writing
    pub dry_run: bool,
    pub progress: bool,
}

/// Statistics from the convert stage
#[derive(Debug, Default)]
pub struct ConvertStats {
    /// Tuples found in the dump
    pub tuples: usize,
    /// Seed files written, in part order
    pub files: Vec<PathBuf>,
    pub warnings: Vec<ConvertWarning>,
}

/// Turn raw dump text into validated property tuples.
///
/// A header column list, when present, must match the property columns
/// exactly, and every tuple must carry 24 fields.
pub fn parse_dump(
    text: &str,
    scan_mode: ScanMode,
    options: &TransformOptions,
) -> std::result::Result<Vec<String>, ParseError> {
    if let Some(columns) = header_columns(text) {
        if columns.iter().map(String::as_str).ne(PROPERTY_COLUMNS.iter().copied()) {
            return Err(ParseError::new(format!(
                "dump columns ({}) do not match the {} columns of {}",
                columns.join(", "),
                PROPERTY_COLUMNS.len(),
                PROPERTY_TABLE
            )));
        }
    }

    let body = prepare(text, options)?;
    let tuples = split_tuples(&body, scan_mode)?;
    check_arity(&tuples, PROPERTY_COLUMNS.len())?;
    Ok(tuples.into_iter().map(str::to_string).collect())
}

/// Read and parse a dump file, labelling failures with `stage`.
pub fn read_dump(
    path: &Path,
    stage: Stage,
    scan_mode: ScanMode,
    array_mode: ArrayMode,
    progress: bool,
) -> Result<Vec<String>> {
    let text = if progress {
        let total = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} reading",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );
        let pb_clone = pb.clone();
        let text = input::read_text_with_progress(
            path,
            stage,
            "dump",
            Some(move |bytes| pb_clone.set_position(bytes)),
        )?;
        pb.finish_and_clear();
        text
    } else {
        input::read_text(path, stage, "dump")?
    };

    let options = TransformOptions { arrays: array_mode };
    let tuples =
        parse_dump(&text, scan_mode, &options).map_err(|e| e.in_stage(stage, Some(path)))?;
    log::debug!(
        "{}: {} tuples parsed from {} ({} scan, {} arrays)",
        stage,
        tuples.len(),
        path.display(),
        scan_mode,
        array_mode
    );
    Ok(tuples)
}

/// Render one self-contained seed file for a batch of tuples.
pub fn render_seed_file<S: AsRef<str>>(batch: &[S], generated_at: &str) -> String {
    format!(
        "-- REURB properties (lots) converted from the Supabase export\n\
         -- Generated: {}\n\
         -- Records in this file: {}\n\n\
         {}\n",
        generated_at,
        batch.len(),
        upsert_statement(PROPERTY_TABLE, &PROPERTY_COLUMNS, batch)
    )
}

/// Run the convert stage.
pub fn run(config: ConvertConfig) -> Result<ConvertStats> {
    let mut stats = ConvertStats::default();

    let tuples = read_dump(
        &config.input,
        Stage::Convert,
        config.scan_mode,
        config.array_mode,
        config.progress,
    )?;
    stats.tuples = tuples.len();

    for id in duplicate_ids(&tuples) {
        stats.warnings.push(ConvertWarning::DuplicateId { id });
    }
    if tuples.is_empty() {
        stats.warnings.push(ConvertWarning::EmptyDump);
    }

    let batches = partition(&tuples, config.batch_size)?;

    if config.dry_run {
        for n in 1..=batches.len() {
            stats.files.push(config.output_dir.join(seed_part_name(n)));
        }
        return Ok(stats);
    }

    fs::create_dir_all(&config.output_dir)
        .map_err(|e| PipelineError::io(&config.output_dir, e))?;
    for path in remove_stale_parts(&config.output_dir)? {
        stats.warnings.push(ConvertWarning::StaleSeedFile { path });
    }

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    for (idx, batch) in batches.into_iter().enumerate() {
        let path = config.output_dir.join(seed_part_name(idx + 1));
        fs::write(&path, render_seed_file(batch, &generated_at))
            .map_err(|e| PipelineError::io(&path, e))?;
        log::debug!("wrote {} ({} records)", path.display(), batch.len());
        stats.files.push(path);
    }

    Ok(stats)
}

/// Delete previously generated seed parts so a smaller dump leaves no
/// higher-numbered leftovers for the seed glob to pick up.
fn remove_stale_parts(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(SEED_PART_PREFIX) && name.ends_with(".sql") {
            let path = entry.path();
            fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}
