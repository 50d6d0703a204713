//! YAML configuration for the pipeline.
//!
//! Every field has a default reproducing the fixed layout under `database/`,
//! so no configuration file is needed for the common case.

use crate::convert::{ArrayMode, ScanMode};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of tuples per upsert statement
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the dump, schema, seed files, store and report
    pub data_dir: PathBuf,
    /// Exported `reurb_properties` dump (may be compressed)
    pub dump: String,
    pub schema: String,
    /// Store file name
    pub store: String,
    /// Integrity report file name
    pub report: String,
    /// Tuples per upsert statement
    pub batch_size: usize,
    /// Seed entries run after the schema, in order. Entries may be globs.
    pub seed_files: Vec<String>,
    pub scan_mode: ScanMode,
    pub array_mode: ArrayMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("database"),
            dump: "reurb_properties_rows.sql".to_string(),
            schema: "schema.sql".to_string(),
            store: "sisreurb.duckdb".to_string(),
            report: "INTEGRITY_REPORT.md".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            seed_files: vec![
                "seed.sql".to_string(),
                "seed-properties-parte-*.sql".to_string(),
            ],
            scan_mode: ScanMode::default(),
            array_mode: ArrayMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml_ng::from_str(content)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        let names = [
            ("dump", &self.dump),
            ("schema", &self.schema),
            ("store", &self.store),
            ("report", &self.report),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(PipelineError::Config(format!("{} must not be empty", field)));
            }
        }
        if self.seed_files.iter().any(|s| s.trim().is_empty()) {
            return Err(PipelineError::Config(
                "seed_files must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = dir;
        self
    }

    pub fn dump_path(&self) -> PathBuf {
        self.data_dir.join(&self.dump)
    }

    pub fn schema_path(&self) -> PathBuf {
        self.data_dir.join(&self.schema)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store)
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir.join(&self.report)
    }
}
