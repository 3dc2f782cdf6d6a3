//! Parent-pointer edges and the immutable anchor relation.
//!
//! # Edge Direction
//!
//! An [`Edge`] `(id, parent_id)` means "`id` reports to `parent_id`". The
//! same shape is used for closure pairs, where `parent_id` is any ancestor
//! reachable from `id`, not just the direct boss.
//!
//! # Anchor set
//!
//! [`AnchorSet`] is the one-hop relation for a single partition. It is built
//! once and never mutated. Duplicate edges are absorbed, and the relation is
//! indexed by child so the closure engine can extend a pair by one level
//! with a single lookup.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::ClosureError;

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// An ordered `(id, parent_id)` pair. `parent_id` is never null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge<K> {
    pub id: K,
    pub parent_id: K,
}

impl<K> Edge<K> {
    #[must_use]
    pub const fn new(id: K, parent_id: K) -> Self {
        Self { id, parent_id }
    }

    /// Build an edge from a raw relation row whose parent may be null.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::InvalidEdge`] when `parent_id` is `None`.
    pub fn try_from_row(id: K, parent_id: Option<K>) -> Result<Self, ClosureError>
    where
        K: Display,
    {
        match parent_id {
            Some(parent_id) => Ok(Self { id, parent_id }),
            None => Err(ClosureError::InvalidEdge { id: id.to_string() }),
        }
    }
}

impl<K: PartialEq> Edge<K> {
    /// `true` when the entity points at itself.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.id == self.parent_id
    }
}

impl<K> From<(K, K)> for Edge<K> {
    fn from((id, parent_id): (K, K)) -> Self {
        Self { id, parent_id }
    }
}

// ---------------------------------------------------------------------------
// AnchorSet
// ---------------------------------------------------------------------------

/// The direct parent relation for one partition.
#[derive(Debug, Clone)]
pub struct AnchorSet<K> {
    edges: HashSet<Edge<K>>,
    /// `id -> {parent_id}`. Usually one parent per id, but not assumed.
    parents: HashMap<K, HashSet<K>>,
}

impl<K: Eq + Hash> PartialEq for AnchorSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.edges == other.edges
    }
}

impl<K: Eq + Hash> Eq for AnchorSet<K> {}

impl<K> Default for AnchorSet<K> {
    fn default() -> Self {
        Self {
            edges: HashSet::new(),
            parents: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> AnchorSet<K> {
    /// Build an anchor set from materialized edges. Duplicates collapse.
    #[must_use]
    pub fn new<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = Edge<K>>,
    {
        let mut set = Self::default();
        for edge in edges {
            set.insert(edge);
        }
        set
    }

    /// Build an anchor set from raw `(id, parent_id)` rows, rejecting any
    /// row with a null parent.
    ///
    /// Callers that want "no boss" rows skipped must filter them first; this
    /// is the boundary check, not a filter.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::InvalidEdge`] for the first null parent.
    pub fn try_from_rows<I>(rows: I) -> Result<Self, ClosureError>
    where
        I: IntoIterator<Item = (K, Option<K>)>,
        K: Display,
    {
        let mut set = Self::default();
        for (id, parent_id) in rows {
            set.insert(Edge::try_from_row(id, parent_id)?);
        }
        Ok(set)
    }

    fn insert(&mut self, edge: Edge<K>) {
        self.parents
            .entry(edge.id.clone())
            .or_default()
            .insert(edge.parent_id.clone());
        self.edges.insert(edge);
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge<K>> {
        self.edges.iter()
    }

    /// `true` if `id` directly reports to `parent_id`.
    #[must_use]
    pub fn contains(&self, id: &K, parent_id: &K) -> bool {
        self.parents
            .get(id)
            .is_some_and(|parents| parents.contains(parent_id))
    }

    /// Direct parents of `id` (empty if `id` has none in this partition).
    pub fn parents_of<'a>(&'a self, id: &K) -> impl Iterator<Item = &'a K> + use<'a, K> {
        self.parents.get(id).into_iter().flatten()
    }

    /// Edges where an entity reports to itself.
    pub fn self_loops(&self) -> impl Iterator<Item = &Edge<K>> {
        self.edges.iter().filter(|edge| edge.is_self_loop())
    }

    /// Every id that appears on either side of an edge.
    #[must_use]
    pub fn entities(&self) -> HashSet<&K> {
        self.edges
            .iter()
            .flat_map(|edge| [&edge.id, &edge.parent_id])
            .collect()
    }
}

impl<K: Clone + Eq + Hash + Ord + Display> AnchorSet<K> {
    /// BLAKE3 hash of the sorted edge list, `blake3:`-prefixed.
    ///
    /// Stable across insertion order and duplicates, so callers can use it
    /// to skip recomputation when the relation has not changed.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut edges: Vec<&Edge<K>> = self.edges.iter().collect();
        edges.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for edge in edges {
            hasher.update(edge.id.to_string().as_bytes());
            hasher.update(b"\x00");
            hasher.update(edge.parent_id.to_string().as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }
}

impl<K: Clone + Eq + Hash> FromIterator<Edge<K>> for AnchorSet<K> {
    fn from_iter<I: IntoIterator<Item = Edge<K>>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<K: Clone + Eq + Hash> FromIterator<(K, K)> for AnchorSet<K> {
    fn from_iter<I: IntoIterator<Item = (K, K)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Edge::from))
    }
}
