//! SQLite-backed relation loader.
//!
//! # Schema
//!
//! ```sql
//! companies(id PRIMARY KEY, name)
//! employees(id PRIMARY KEY, name, boss_id NULL, company_id NOT NULL)
//! ```
//!
//! Id columns are declared without a type so SQLite keeps integers as
//! integers and text (including UUIDs) as text. Both map to [`EntityId`].
//!
//! # Recursive formulation
//!
//! [`sql_closure`] runs the same closure as a `WITH RECURSIVE` query. The
//! `UNION` (not `UNION ALL`) is what makes it terminate on cyclic data:
//! SQLite only queues a row that has never been produced before.

#![allow(clippy::module_name_repetitions)]

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row, params};
use std::path::Path;
use tracing::instrument;

use super::{LoadError, RelationLoader};
use crate::edge::{AnchorSet, Edge};
use crate::id::EntityId;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS companies (
    id   PRIMARY KEY,
    name TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS employees (
    id         PRIMARY KEY,
    name       TEXT NOT NULL DEFAULT '',
    boss_id    NULL,
    company_id NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_employees_company_boss
    ON employees(company_id, boss_id);
";

const PARTITIONS_SQL: &str = "SELECT DISTINCT company_id FROM employees ORDER BY company_id";

const ANCHORS_SQL: &str = "
SELECT id, boss_id
FROM employees
WHERE company_id = ?1 AND boss_id IS NOT NULL
";

const CLOSURE_SQL: &str = "
WITH RECURSIVE
anchor(id, boss_id) AS (
    SELECT id, boss_id
    FROM employees
    WHERE company_id = ?1 AND boss_id IS NOT NULL
),
closure(id, boss_id) AS (
    SELECT id, boss_id FROM anchor WHERE id <> boss_id
    UNION
    SELECT closure.id, anchor.boss_id
    FROM closure
    JOIN anchor ON closure.boss_id = anchor.id
    WHERE closure.id <> anchor.boss_id
)
SELECT id, boss_id FROM closure
";

/// Create the `companies`/`employees` tables if they do not exist.
///
/// # Errors
///
/// Returns [`LoadError::Sqlite`] if the DDL fails.
pub fn ensure_schema(conn: &Connection) -> Result<(), LoadError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Open an existing database read-only. Returns `None` if the file is absent.
///
/// # Errors
///
/// Returns [`LoadError::Sqlite`] if the file exists but cannot be opened.
pub fn try_open(path: &Path) -> Result<Option<Connection>, LoadError> {
    if !path.exists() {
        return Ok(None);
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(Some(conn))
}

/// Insert one company row.
///
/// # Errors
///
/// Returns [`LoadError::Sqlite`] on constraint or I/O failure.
pub fn insert_company(conn: &Connection, id: &EntityId, name: &str) -> Result<(), LoadError> {
    conn.execute(
        "INSERT INTO companies (id, name) VALUES (?1, ?2)",
        params![id, name],
    )?;
    Ok(())
}

/// Insert one employee row. `boss_id = None` stores `NULL`.
///
/// # Errors
///
/// Returns [`LoadError::Sqlite`] on constraint or I/O failure.
pub fn insert_employee(
    conn: &Connection,
    id: &EntityId,
    boss_id: Option<&EntityId>,
    company_id: &EntityId,
) -> Result<(), LoadError> {
    conn.execute(
        "INSERT INTO employees (id, name, boss_id, company_id) VALUES (?1, ?1, ?2, ?3)",
        params![id, boss_id, company_id],
    )?;
    Ok(())
}

/// Run the closure for one company entirely inside SQLite.
///
/// Returns the same pairs as [`crate::closure::compute_closure`] over the
/// partition's anchors, in unspecified order.
///
/// # Errors
///
/// Returns a [`LoadError`] on query failure or non-id column values.
#[instrument(skip(conn))]
pub fn sql_closure(conn: &Connection, company_id: &EntityId) -> Result<Vec<Edge<EntityId>>, LoadError> {
    let mut stmt = conn.prepare(CLOSURE_SQL)?;
    let mut rows = stmt.query(params![company_id])?;

    let mut pairs = Vec::new();
    while let Some(row) = rows.next()? {
        pairs.push(edge_from_row(row)?);
    }
    Ok(pairs)
}

// ---------------------------------------------------------------------------
// SqliteLoader
// ---------------------------------------------------------------------------

/// [`RelationLoader`] over the `employees` table, partitioned by company.
#[derive(Debug, Clone, Copy)]
pub struct SqliteLoader<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteLoader<'c> {
    #[must_use]
    pub const fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub const fn connection(&self) -> &'c Connection {
        self.conn
    }
}

impl RelationLoader for SqliteLoader<'_> {
    type Key = EntityId;

    fn partitions(&self) -> Result<Vec<EntityId>, LoadError> {
        let mut stmt = self.conn.prepare(PARTITIONS_SQL)?;
        let mut rows = stmt.query([])?;

        let mut partitions = Vec::new();
        while let Some(row) = rows.next()? {
            partitions.push(id_column(row, 0, "company_id")?);
        }
        Ok(partitions)
    }

    #[instrument(skip(self))]
    fn load_anchors(&self, partition: &EntityId) -> Result<AnchorSet<EntityId>, LoadError> {
        let mut stmt = self.conn.prepare(ANCHORS_SQL)?;
        let mut rows = stmt.query(params![partition])?;

        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(edge_from_row(row)?);
        }
        tracing::debug!(edges = edges.len(), "loaded anchors");
        Ok(AnchorSet::new(edges))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn edge_from_row(row: &Row<'_>) -> Result<Edge<EntityId>, LoadError> {
    let id = id_column(row, 0, "id")?;
    let boss_id = id_column(row, 1, "boss_id")?;
    Ok(Edge::new(id, boss_id))
}

fn id_column(row: &Row<'_>, idx: usize, column: &'static str) -> Result<EntityId, LoadError> {
    let value: ValueRef<'_> = row.get_ref(idx)?;
    EntityId::from_sql_value(value).ok_or(LoadError::UnsupportedKey {
        column,
        kind: value.data_type(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
