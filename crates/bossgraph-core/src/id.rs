//! Opaque entity identifiers.
//!
//! The engine is generic over any hashable key. [`EntityId`] is the concrete
//! key the loaders and the CLI use: relational stores hand back either
//! integer or text primary keys (UUIDs travel as text), and JSON documents
//! may carry either.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// An integer or text entity key.
///
/// Ordering puts every integer before every text value; within a variant the
/// natural order applies. The ordering is only used for stable output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    /// Convert a borrowed SQLite value, returning `None` for storage classes
    /// that cannot be an id (`NULL`, `REAL`, `BLOB`).
    #[must_use]
    pub fn from_sql_value(value: ValueRef<'_>) -> Option<Self> {
        match value {
            ValueRef::Integer(i) => Some(Self::Int(i)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .ok()
                .map(|s| Self::Text(s.to_string())),
            ValueRef::Null | ValueRef::Real(_) | ValueRef::Blob(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Parses integers as [`EntityId::Int`] and anything else as text.
/// Surrounding whitespace is dropped in both cases.
///
/// Note that zero-padded values such as `"007"` become `Int(7)`.
impl FromStr for EntityId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_string()), Self::Int))
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl ToSql for EntityId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Int(i) => Ok(ToSqlOutput::from(*i)),
            Self::Text(s) => Ok(ToSqlOutput::from(s.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_sort_before_text() {
        let mut ids = vec![
            EntityId::from("b"),
            EntityId::from(10),
            EntityId::from("a"),
            EntityId::from(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                EntityId::Int(2),
                EntityId::Int(10),
                EntityId::Text("a".into()),
                EntityId::Text("b".into()),
            ]
        );
    }

    #[test]
    fn parse_prefers_integers() {
        assert_eq!("42".parse::<EntityId>(), Ok(EntityId::Int(42)));
        assert_eq!(
            "acme".parse::<EntityId>(),
            Ok(EntityId::Text("acme".into()))
        );
        assert_eq!(
            "3f2b-uuid".parse::<EntityId>(),
            Ok(EntityId::Text("3f2b-uuid".into()))
        );
    }

    #[test]
    fn parse_trims_text_and_integers_alike() {
        assert_eq!(" 42 ".parse::<EntityId>(), Ok(EntityId::Int(42)));
        assert_eq!(
            " acme\t".parse::<EntityId>(),
            Ok(EntityId::Text("acme".into()))
        );
    }

    #[test]
    fn json_accepts_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_str(r#"[1, "x", -3]"#).expect("parse ids");
        assert_eq!(
            ids,
            vec![EntityId::Int(1), EntityId::Text("x".into()), EntityId::Int(-3)]
        );
        assert_eq!(
            serde_json::to_string(&ids).expect("serialize"),
            r#"[1,"x",-3]"#
        );
    }

    #[test]
    fn sql_values_map_to_ids() {
        assert_eq!(
            EntityId::from_sql_value(ValueRef::Integer(5)),
            Some(EntityId::Int(5))
        );
        assert_eq!(
            EntityId::from_sql_value(ValueRef::Text(b"u-1")),
            Some(EntityId::Text("u-1".into()))
        );
        assert_eq!(EntityId::from_sql_value(ValueRef::Null), None);
        assert_eq!(EntityId::from_sql_value(ValueRef::Real(1.5)), None);
    }

    #[test]
    fn display_is_bare_value() {
        assert_eq!(EntityId::Int(7).to_string(), "7");
        assert_eq!(EntityId::from("ceo").to_string(), "ceo");
    }
}
