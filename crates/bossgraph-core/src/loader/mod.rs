//! Relation loaders: where anchor sets come from.
//!
//! A loader hands the engine one partition's direct parent edges at a time.
//! Partition scoping is entirely the loader's job. The engine never sees a
//! partition key, and an unscoped relation fed to it will happily merge
//! unrelated hierarchies whose ids collide.
//!
//! ## Submodules
//!
//! - [`sqlite`] — `employees`/`companies` tables over `rusqlite`, plus the
//!   recursive-CTE formulation of the same closure.
//! - [`json`] — employee documents and bare edge lists.

use std::hash::Hash;
use std::path::PathBuf;

use crate::edge::AnchorSet;
use crate::error::{ClosureError, ErrorCode};
use crate::id::EntityId;

pub mod json;
pub mod sqlite;

pub use json::{JsonLoader, edges_from_json, edges_from_path};
pub use sqlite::SqliteLoader;

/// Errors raised while materializing an anchor set.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column '{column}' holds a {kind} value; ids must be integer or text")]
    UnsupportedKey {
        column: &'static str,
        kind: rusqlite::types::Type,
    },

    #[error(transparent)]
    Closure(#[from] ClosureError),
}

impl LoadError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Sqlite(_) => ErrorCode::StorageError,
            Self::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::InputNotFound,
                _ => ErrorCode::StorageError,
            },
            Self::Json(_) => ErrorCode::InputParseError,
            Self::UnsupportedKey { .. } => ErrorCode::UnsupportedKey,
            Self::Closure(err) => err.code(),
        }
    }
}

/// Source of per-partition anchor sets.
pub trait RelationLoader {
    type Key: Clone + Eq + Hash;

    /// Every partition key known to this source, sorted.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the source cannot be read.
    fn partitions(&self) -> Result<Vec<EntityId>, LoadError>;

    /// All `(id, parent_id)` pairs in `partition` whose parent is non-null.
    ///
    /// An unknown partition yields an empty anchor set, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the source cannot be read.
    fn load_anchors(&self, partition: &EntityId) -> Result<AnchorSet<Self::Key>, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_io_maps_to_input_not_found() {
        let err = LoadError::Io {
            path: PathBuf::from("/nope.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.code(), ErrorCode::InputNotFound);
        assert!(err.to_string().contains("/nope.json"));
    }

    #[test]
    fn closure_errors_keep_their_code() {
        let err = LoadError::from(ClosureError::InvalidEdge { id: "7".into() });
        assert_eq!(err.code(), ErrorCode::InvalidEdge);
        assert!(err.to_string().contains("'7'"));
    }
}
