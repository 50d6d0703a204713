//! Batch loader tests against an in-memory DuckDB store carrying the real
//! schema.

use reurb_seed::convert::{parse_dump, ScanMode, TransformOptions};
use reurb_seed::loader::{partition, BatchLoader};
use reurb_seed::model::Entity;
use reurb_seed::seed::split_statements;
use reurb_seed::store::Store;
use reurb_seed::{PipelineError, Stage};
use std::path::PathBuf;
use test_data_gen::{DumpOptions, GeneratedData, Generator, Scale};

fn schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("database/schema.sql")
}

fn store_with_schema() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.apply_schema(&schema_path(), Stage::Load).unwrap();
    store
}

fn tuples_of(data: &GeneratedData) -> Vec<String> {
    let dump = data.render_dump(&DumpOptions::default());
    parse_dump(&dump, ScanMode::QuoteAware, &TransformOptions::default()).unwrap()
}

fn seed_parents(store: &Store, data: &GeneratedData) {
    for statement in split_statements(&data.render_seed()) {
        store.execute(&statement).unwrap();
    }
}

// =============================================================================
// Batching
// =============================================================================

#[test]
fn test_load_250_in_batches_of_100() {
    let data = Generator::new(11, Scale::Medium).generate();
    let tuples: Vec<String> = tuples_of(&data).into_iter().take(250).collect();
    assert_eq!(tuples.len(), 250);

    let sizes: Vec<usize> = partition(&tuples, 100)
        .unwrap()
        .iter()
        .map(|b| b.len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);

    let store = store_with_schema();
    let stats = BatchLoader::new(&store, 100).load(&tuples).unwrap();
    assert_eq!(stats.batches, 3);
    assert_eq!(stats.attempted, 250);
    assert_eq!(stats.inserted, 250);
    assert_eq!(store.table_count(Entity::Property).unwrap(), 250);
}

#[test]
fn test_load_empty_input_runs_no_batches() {
    let store = store_with_schema();
    let stats = BatchLoader::new(&store, 100).load::<String>(&[]).unwrap();
    assert_eq!(stats.batches, 0);
    assert_eq!(store.table_count(Entity::Property).unwrap(), 0);
}

#[test]
fn test_zero_batch_size_rejected_before_any_write() {
    let data = Generator::new(11, Scale::Small).generate();
    let tuples = tuples_of(&data);
    let store = store_with_schema();

    let err = BatchLoader::new(&store, 0).load(&tuples).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert_eq!(store.table_count(Entity::Property).unwrap(), 0);
}

// =============================================================================
// Upsert semantics
// =============================================================================

#[test]
fn test_reload_is_idempotent() {
    let data = Generator::new(3, Scale::Small).generate();
    let tuples = tuples_of(&data);
    let store = store_with_schema();

    BatchLoader::new(&store, 10).load(&tuples).unwrap();
    let first = store.counts().unwrap();
    BatchLoader::new(&store, 7).load(&tuples).unwrap();
    assert_eq!(store.counts().unwrap(), first);
    assert_eq!(store.table_count(Entity::Property).unwrap(), 48);
}

#[test]
fn test_reload_replaces_changed_rows() {
    let data = Generator::new(3, Scale::Small).generate();
    let tuples = tuples_of(&data);
    let store = store_with_schema();
    BatchLoader::new(&store, 100).load(&tuples).unwrap();

    let id = data.properties[0].id().to_string();
    let mut changed = tuples.clone();
    changed[0] = changed[0].replacen("'Lote 1'", "'Lote 1A'", 1);
    BatchLoader::new(&store, 100).load(&changed).unwrap();

    let name: String = store
        .connection()
        .query_row(
            "SELECT name FROM reurb_properties WHERE id = ?",
            duckdb::params![id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "Lote 1A");
    assert_eq!(store.table_count(Entity::Property).unwrap(), 48);
}

#[test]
fn test_failing_batch_keeps_earlier_batches() {
    let data = Generator::new(5, Scale::Medium).generate();
    let mut tuples: Vec<String> = tuples_of(&data).into_iter().take(150).collect();
    tuples[120] = "('broken')".to_string();

    let store = store_with_schema();
    let err = BatchLoader::new(&store, 100).load(&tuples).unwrap_err();
    match err {
        PipelineError::Load {
            batch,
            committed,
            excerpt,
            ..
        } => {
            assert_eq!(batch, 2);
            assert_eq!(committed, 100);
            assert!(excerpt.starts_with("INSERT OR REPLACE INTO reurb_properties"));
        }
        other => panic!("expected a load error, got {other:?}"),
    }
    assert_eq!(store.table_count(Entity::Property).unwrap(), 100);
}

#[test]
fn test_booleans_and_arrays_land_as_integers_and_json() {
    let data = Generator::new(9, Scale::Small).generate();
    let store = store_with_schema();
    BatchLoader::new(&store, 100).load(&tuples_of(&data)).unwrap();

    let bad_flags = store
        .count("SELECT COUNT(*) FROM reurb_properties WHERE possui_conflito NOT IN (0, 1)")
        .unwrap();
    assert_eq!(bad_flags, 0);

    let mut stmt = store
        .connection()
        .prepare("SELECT images, documentos_comprobatorios FROM reurb_properties")
        .unwrap();
    let rows: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows.len(), 48);
    for (images, documents) in rows {
        serde_json::from_str::<Vec<String>>(&images).unwrap();
        let documents: Vec<String> = serde_json::from_str(&documents).unwrap();
        assert!(!documents.is_empty());
    }
}

// =============================================================================
// Project replacement
// =============================================================================

#[test]
fn test_clear_project_removes_only_its_lots() {
    let data = Generator::new(21, Scale::Small).generate();
    let store = store_with_schema();
    seed_parents(&store, &data);

    let loader = BatchLoader::new(&store, 100);
    loader.load(&tuples_of(&data)).unwrap();
    assert_eq!(store.table_count(Entity::Property).unwrap(), 48);

    let deleted = loader.clear_project(&data.projects[0].id).unwrap();
    assert_eq!(deleted, 24);
    assert_eq!(store.table_count(Entity::Property).unwrap(), 24);

    assert_eq!(loader.clear_project("no-such-project").unwrap(), 0);
}
