//! Seed command CLI handler.

use crate::config::PipelineConfig;
use crate::error::Stage;
use crate::seed::{self, SeedConfig, SeedStats};
use crate::store::{remove_store_files, Store};
use std::path::PathBuf;
use std::time::Instant;

pub fn run(
    config: &PipelineConfig,
    store_path: Option<PathBuf>,
    fresh: bool,
    progress: bool,
) -> anyhow::Result<SeedStats> {
    let store_path = store_path.unwrap_or_else(|| config.store_path());
    let schema = config.schema_path();
    if !schema.is_file() {
        return Err(crate::error::PipelineError::InputNotFound {
            stage: Stage::Seed,
            what: "schema file",
            path: schema,
        }
        .into());
    }

    if fresh {
        for removed in remove_store_files(&store_path)? {
            eprintln!("Removed previous store file {}", removed.display());
        }
    }

    let start = Instant::now();
    let store = Store::open(&store_path, Stage::Seed)?;
    eprintln!("Seeding {}", store_path.display());

    let stats = seed::run(
        &store,
        &SeedConfig {
            data_dir: config.data_dir.clone(),
            schema: config.schema.clone(),
            entries: config.seed_files.clone(),
            progress,
        },
    )?;

    eprintln!();
    eprintln!("Seed summary:");
    eprintln!(
        "  Files: {} ({} statements)",
        stats.files.len(),
        stats.statements()
    );
    if !stats.skipped.is_empty() {
        eprintln!("  Skipped: {}", stats.skipped.join(", "));
    }
    for (entity, count) in &stats.counts {
        eprintln!("  {}: {}", entity.label(), count);
    }
    eprintln!("  Time: {:.3}s", start.elapsed().as_secs_f64());
    Ok(stats)
}
