//! JSON relation sources.
//!
//! Two shapes are accepted:
//!
//! - an employee document, partitioned by `company_id`:
//!
//!   ```json
//!   {"employees": [{"id": 2, "boss_id": 1, "company_id": 10}]}
//!   ```
//!
//!   Rows with a `null` (or missing) `boss_id` have no boss and are skipped,
//!   exactly as the SQL loader's `boss_id IS NOT NULL` filter does.
//!
//! - a bare edge list forming one implicit partition:
//!
//!   ```json
//!   [{"id": "A", "parent_id": "B"}]
//!   ```
//!
//!   Here every row claims to be an edge, so a `null` parent is malformed
//!   input and is rejected with [`ClosureError::InvalidEdge`].
//!
//! [`ClosureError::InvalidEdge`]: crate::error::ClosureError::InvalidEdge

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{LoadError, RelationLoader};
use crate::edge::{AnchorSet, Edge};
use crate::id::EntityId;

/// One row of an employee document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EntityId,
    #[serde(default)]
    pub boss_id: Option<EntityId>,
    pub company_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmployeeDocument {
    employees: Vec<EmployeeRecord>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    id: EntityId,
    #[serde(default)]
    parent_id: Option<EntityId>,
}

/// In-memory [`RelationLoader`] over parsed employee records.
#[derive(Debug, Clone, Default)]
pub struct JsonLoader {
    records: Vec<EmployeeRecord>,
}

impl JsonLoader {
    #[must_use]
    pub const fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }

    /// Parse an employee document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] if the document is malformed.
    pub fn parse(input: &str) -> Result<Self, LoadError> {
        let doc: EmployeeDocument = serde_json::from_str(input)?;
        Ok(Self::new(doc.employees))
    }

    /// Read and parse an employee document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, or
    /// [`LoadError::Json`] if it is malformed.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        Self::parse(&read_input(path)?)
    }

    #[must_use]
    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }
}

impl RelationLoader for JsonLoader {
    type Key = EntityId;

    fn partitions(&self) -> Result<Vec<EntityId>, LoadError> {
        let partitions: BTreeSet<&EntityId> =
            self.records.iter().map(|r| &r.company_id).collect();
        Ok(partitions.into_iter().cloned().collect())
    }

    fn load_anchors(&self, partition: &EntityId) -> Result<AnchorSet<EntityId>, LoadError> {
        Ok(self
            .records
            .iter()
            .filter(|r| &r.company_id == partition)
            .filter_map(|r| {
                r.boss_id
                    .as_ref()
                    .map(|boss| Edge::new(r.id.clone(), boss.clone()))
            })
            .collect())
    }
}

/// Parse a bare edge list, rejecting null parents.
///
/// # Errors
///
/// Returns [`LoadError::Json`] for malformed JSON, or
/// [`LoadError::Closure`] wrapping `InvalidEdge` for a null parent.
pub fn edges_from_json(input: &str) -> Result<AnchorSet<EntityId>, LoadError> {
    let rows: Vec<RawEdge> = serde_json::from_str(input)?;
    let anchors = AnchorSet::try_from_rows(rows.into_iter().map(|r| (r.id, r.parent_id)))?;
    Ok(anchors)
}

/// Read a bare edge list from disk. See [`edges_from_json`].
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, otherwise as
/// [`edges_from_json`].
pub fn edges_from_path(path: &Path) -> Result<AnchorSet<EntityId>, LoadError> {
    edges_from_json(&read_input(path)?)
}

fn read_input(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
