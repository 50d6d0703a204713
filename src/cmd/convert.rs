//! Convert command CLI handler.

use crate::config::PipelineConfig;
use crate::convert::{self, ConvertConfig, ConvertStats};
use crate::input::Compression;
use std::path::PathBuf;
use std::time::Instant;

pub fn run(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    dry_run: bool,
    progress: bool,
) -> anyhow::Result<()> {
    let stats = convert_dump(config, input, output, dry_run, progress)?;
    if stats.tuples == 0 {
        anyhow::bail!("no rows found in dump");
    }
    Ok(())
}

/// Run the convert stage and print its summary. Shared with `setup`.
pub(super) fn convert_dump(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    dry_run: bool,
    progress: bool,
) -> anyhow::Result<ConvertStats> {
    let input = input.unwrap_or_else(|| config.dump_path());
    let output_dir = output.unwrap_or_else(|| config.data_dir.clone());

    let compression = Compression::from_path(&input);
    if compression != Compression::None {
        eprintln!("Detected compression: {}", compression);
    }
    eprintln!(
        "Converting {} [scan: {}, arrays: {}, batch size: {}]",
        input.display(),
        config.scan_mode,
        config.array_mode,
        config.batch_size
    );

    let start = Instant::now();
    let stats = convert::run(ConvertConfig {
        input,
        output_dir,
        batch_size: config.batch_size,
        scan_mode: config.scan_mode,
        array_mode: config.array_mode,
        dry_run,
        progress,
    })?;

    for warning in &stats.warnings {
        log::warn!("{}", warning);
    }

    print_stats(&stats, dry_run, start.elapsed().as_secs_f64());
    Ok(stats)
}

fn print_stats(stats: &ConvertStats, dry_run: bool, elapsed: f64) {
    eprintln!();
    if dry_run {
        eprintln!("Dry run: {} records would be written to:", stats.tuples);
    } else {
        eprintln!("Conversion summary:");
    }
    for file in &stats.files {
        eprintln!("  {}", file.display());
    }
    eprintln!("  Records: {}", stats.tuples);
    eprintln!("  Seed files: {}", stats.files.len());
    if !stats.warnings.is_empty() {
        eprintln!("  Warnings: {}", stats.warnings.len());
    }
    eprintln!("  Time: {:.3}s", elapsed);
}
