//! Pipeline error types.
//!
//! Every fatal condition names the stage that raised it. Integrity
//! violations are not errors; they are values in the verifier's report.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline stage, used to label errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Convert,
    Load,
    Seed,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Convert => write!(f, "convert"),
            Stage::Load => write!(f, "load"),
            Stage::Seed => write!(f, "seed"),
            Stage::Verify => write!(f, "verify"),
        }
    }
}

/// Malformed dump text. Raised by the literal transformer and the tuple
/// splitter, never recovered from with a best guess.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the scanned text, when known
    pub offset: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Attach stage and source file, turning this into a fatal pipeline error.
    pub fn in_stage(self, stage: Stage, path: Option<&Path>) -> PipelineError {
        let message = match self.offset {
            Some(offset) => format!("{} (at byte {})", self.message, offset),
            None => self.message,
        };
        PipelineError::Parse {
            stage,
            path: path.map(Path::to_path_buf),
            message,
        }
    }
}

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required input file is missing. Raised before anything is written.
    #[error("{stage}: {what} not found: {}", .path.display())]
    InputNotFound {
        stage: Stage,
        what: &'static str,
        path: PathBuf,
    },

    /// Dump text could not be parsed. Raised before anything is loaded.
    #[error("{stage}: parse error{}: {message}", display_path(.path))]
    Parse {
        stage: Stage,
        path: Option<PathBuf>,
        message: String,
    },

    /// A load batch was rejected. Batches before it stay committed.
    #[error(
        "load: batch {batch} failed after {committed} records committed: {source}\n  SQL: {excerpt}"
    )]
    Load {
        /// 1-based batch ordinal
        batch: usize,
        committed: usize,
        excerpt: String,
        #[source]
        source: duckdb::Error,
    },

    /// A seed statement was rejected.
    #[error("seed: statement {statement} of {} failed: {source}\n  SQL: {excerpt}", .file.display())]
    Seed {
        file: PathBuf,
        /// 1-based statement ordinal within the file
        statement: usize,
        excerpt: String,
        #[source]
        source: duckdb::Error,
    },

    /// Opening or querying the store failed.
    #[error("{stage}: store error: {source}")]
    Store {
        stage: Stage,
        #[source]
        source: duckdb::Error,
    },

    #[error("I/O error for path {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" in {}", p.display()),
        None => String::new(),
    }
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn store(stage: Stage, source: duckdb::Error) -> Self {
        PipelineError::Store { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// First `max` characters of a statement on one line, for error messages.
pub fn excerpt(sql: &str, max: usize) -> String {
    let flat: String = sql
        .trim()
        .chars()
        .take(max)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if sql.trim().chars().count() > max {
        format!("{}...", flat)
    } else {
        flat
    }
}
