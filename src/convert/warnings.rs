//! Non-fatal findings of the convert stage.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertWarning {
    /// The same primary key appears in more than one tuple. If both land in
    /// one batch the store rejects that batch.
    DuplicateId { id: String },
    /// The dump holds a VALUES clause with no tuples
    EmptyDump,
    /// A seed part left over from an earlier, larger conversion was removed
    StaleSeedFile { path: PathBuf },
}

impl std::fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertWarning::DuplicateId { id } => {
                write!(f, "Duplicate id {} (later rows replace earlier ones)", id)
            }
            ConvertWarning::EmptyDump => write!(f, "Dump contains no rows"),
            ConvertWarning::StaleSeedFile { path } => {
                write!(f, "Removed stale seed file {}", path.display())
            }
        }
    }
}
