//! Input selection shared by the commands that read a hierarchy.

use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bossgraph_core::loader::sqlite::try_open;
use bossgraph_core::loader::{JsonLoader, SqliteLoader, edges_from_path};
use bossgraph_core::{AnchorSet, EntityId, LoadError, RelationLoader};
use clap::Args;
use rusqlite::Connection;

/// Where to read the reporting relation from.
#[derive(Args, Debug, Default, Clone)]
pub struct SourceArgs {
    /// SQLite database with `employees(id, boss_id, company_id)`.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["input", "edges"], requires = "company")]
    pub db: Option<PathBuf>,

    /// JSON document `{"employees": [{"id", "boss_id", "company_id"}]}`.
    #[arg(long, value_name = "PATH", conflicts_with = "edges")]
    pub input: Option<PathBuf>,

    /// JSON edge list `[{"id", "parent_id"}]`, treated as one partition.
    #[arg(long, value_name = "PATH", conflicts_with = "company")]
    pub edges: Option<PathBuf>,

    /// Company (partition) to compute. Integers are parsed as integer ids.
    #[arg(long, value_name = "ID", value_parser = parse_entity_id)]
    pub company: Option<EntityId>,
}

/// Goes through `FromStr`; clap would otherwise pick `From<String>` and
/// read every id as text.
fn parse_entity_id(raw: &str) -> Result<EntityId, Infallible> {
    raw.parse()
}

/// Where to read every partition from.
#[derive(Args, Debug, Default, Clone)]
pub struct PartitionSourceArgs {
    /// SQLite database with `employees(id, boss_id, company_id)`.
    #[arg(long, value_name = "PATH", conflicts_with = "input")]
    pub db: Option<PathBuf>,

    /// JSON document `{"employees": [{"id", "boss_id", "company_id"}]}`.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,
}

/// Anchors for one partition plus the handle they were read from.
pub struct LoadedAnchors {
    pub partition: Option<EntityId>,
    pub anchors: AnchorSet<EntityId>,
    /// Kept open so the SQL engine can run against the same database.
    pub connection: Option<Connection>,
}

/// Read the anchor set selected by `args`.
pub fn load_anchors(args: &SourceArgs) -> Result<LoadedAnchors> {
    if let Some(path) = &args.db {
        let Some(company) = args.company.clone() else {
            bail!("--db requires --company");
        };
        let conn = open_db(path)?;
        let anchors = SqliteLoader::new(&conn)
            .load_anchors(&company)
            .with_context(|| format!("loading company {company} from {}", path.display()))?;
        return Ok(LoadedAnchors {
            partition: Some(company),
            anchors,
            connection: Some(conn),
        });
    }

    if let Some(path) = &args.input {
        let loader = JsonLoader::from_path(path)?;
        let company = match &args.company {
            Some(company) => company.clone(),
            None => single_partition(&loader, path)?,
        };
        let anchors = loader.load_anchors(&company)?;
        return Ok(LoadedAnchors {
            partition: Some(company),
            anchors,
            connection: None,
        });
    }

    if let Some(path) = &args.edges {
        return Ok(LoadedAnchors {
            partition: None,
            anchors: edges_from_path(path)?,
            connection: None,
        });
    }

    bail!("no input given: pass --db, --input or --edges")
}

/// Open a database read-only, reporting a missing file as such.
pub fn open_db(path: &Path) -> Result<Connection> {
    match try_open(path)? {
        Some(conn) => Ok(conn),
        None => Err(LoadError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "database not found"),
        }
        .into()),
    }
}

fn single_partition(loader: &JsonLoader, path: &Path) -> Result<EntityId> {
    let mut partitions = loader.partitions()?;
    match partitions.len() {
        1 => Ok(partitions.remove(0)),
        0 => bail!("{} contains no employees", path.display()),
        n => bail!(
            "{} contains {n} companies; pass --company to pick one",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: SourceArgs,
    }

    #[test]
    fn company_parses_as_entity_id() {
        let parsed = Wrapper::parse_from(["test", "--db", "org.db", "--company", "42"]);
        assert_eq!(parsed.args.company, Some(EntityId::Int(42)));

        let parsed = Wrapper::parse_from(["test", "--input", "org.json", "--company", "acme"]);
        assert_eq!(parsed.args.company, Some(EntityId::from("acme")));
    }

    #[test]
    fn numeric_company_matches_integer_partition() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("org.json");
        std::fs::write(
            &path,
            r#"{"employees": [
                {"id": 1, "boss_id": 2, "company_id": 1},
                {"id": 3, "boss_id": 4, "company_id": 2}
            ]}"#,
        )
        .expect("write");

        let input = path.to_string_lossy().into_owned();
        let parsed = Wrapper::parse_from(["test", "--input", input.as_str(), "--company", "1"]);
        let loaded = load_anchors(&parsed.args).expect("load");
        assert_eq!(loaded.partition, Some(EntityId::Int(1)));
        assert_eq!(loaded.anchors.len(), 1);
    }

    #[test]
    fn db_requires_company() {
        assert!(Wrapper::try_parse_from(["test", "--db", "org.db"]).is_err());
    }

    #[test]
    fn sources_are_exclusive() {
        assert!(Wrapper::try_parse_from(["test", "--input", "a.json", "--edges", "b.json"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "--edges", "b.json", "--company", "1"]).is_err());
    }

    #[test]
    fn missing_db_is_input_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = open_db(&dir.path().join("absent.db")).err().expect("missing db");
        assert_eq!(
            crate::output::error_code_of(&err),
            bossgraph_core::ErrorCode::InputNotFound
        );
    }

    #[test]
    fn input_without_company_needs_single_partition() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("org.json");
        std::fs::write(
            &path,
            r#"{"employees": [
                {"id": 1, "boss_id": 2, "company_id": 10},
                {"id": 3, "boss_id": 4, "company_id": 20}
            ]}"#,
        )
        .expect("write");

        let args = SourceArgs {
            input: Some(path.clone()),
            ..SourceArgs::default()
        };
        let err = load_anchors(&args).err().expect("ambiguous");
        assert!(err.to_string().contains("2 companies"));

        let args = SourceArgs {
            input: Some(path),
            company: Some(EntityId::Int(20)),
            ..SourceArgs::default()
        };
        let loaded = load_anchors(&args).expect("load");
        assert_eq!(loaded.anchors.len(), 1);
        assert_eq!(loaded.partition, Some(EntityId::Int(20)));
    }
}
