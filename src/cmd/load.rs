//! Load command CLI handler.

use crate::config::PipelineConfig;
use crate::convert;
use crate::error::Stage;
use crate::loader::BatchLoader;
use crate::model::Entity;
use crate::store::Store;
use std::path::PathBuf;

pub fn run(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    store_path: Option<PathBuf>,
    replace_project: Option<String>,
    progress: bool,
) -> anyhow::Result<()> {
    let input = input.unwrap_or_else(|| config.dump_path());
    let store_path = store_path.unwrap_or_else(|| config.store_path());

    let tuples = convert::read_dump(
        &input,
        Stage::Load,
        config.scan_mode,
        config.array_mode,
        progress,
    )?;
    for id in convert::duplicate_ids(&tuples) {
        log::warn!("duplicate id {} in {}", id, input.display());
    }
    eprintln!("Found {} records in {}", tuples.len(), input.display());

    let store = Store::open(&store_path, Stage::Load)?;
    store.apply_schema(&config.schema_path(), Stage::Load)?;

    let loader = BatchLoader::new(&store, config.batch_size).with_progress(progress);
    if let Some(project) = &replace_project {
        let deleted = loader.clear_project(project)?;
        eprintln!("Removed {} existing lots of project {}", deleted, project);
    }

    let stats = loader.load(&tuples)?;
    let total = store.table_count(Entity::Property)?;

    eprintln!();
    eprintln!("Load summary:");
    eprintln!("  Batches: {}", stats.batches);
    eprintln!("  Records: {} attempted, {} written", stats.attempted, stats.inserted);
    eprintln!("  {} now holds {} rows", Entity::Property.table(), total);
    eprintln!("  Time: {:.3}s", stats.duration_secs);
    Ok(())
}
