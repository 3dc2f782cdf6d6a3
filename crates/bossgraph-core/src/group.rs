//! Folding closure pairs into ancestor → descendants groups.
//!
//! Pure aggregation: the input is already cycle-resolved, so there is
//! nothing to guard against here. An ancestor key exists only when at least
//! one descendant maps to it; there are no empty groups.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use serde::{Serialize, Serializer};

use crate::edge::Edge;

/// `ancestor_id -> {descendant ids}`.
#[derive(Debug, Clone)]
pub struct ClosureGroups<K> {
    groups: HashMap<K, HashSet<K>>,
}

impl<K> Default for ClosureGroups<K> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> PartialEq for ClosureGroups<K> {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl<K: Eq + Hash> Eq for ClosureGroups<K> {}

impl<K: Clone + Eq + Hash> ClosureGroups<K> {
    /// Number of ancestors with at least one descendant.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn get(&self, ancestor: &K) -> Option<&HashSet<K>> {
        self.groups.get(ancestor)
    }

    #[must_use]
    pub fn contains_key(&self, ancestor: &K) -> bool {
        self.groups.contains_key(ancestor)
    }

    /// Descendants of `ancestor`; empty for ids that have no subordinates.
    pub fn descendants_of<'a>(&'a self, ancestor: &K) -> impl Iterator<Item = &'a K> + use<'a, K> {
        self.groups.get(ancestor).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &HashSet<K>)> {
        self.groups.iter()
    }

    /// Total number of `(ancestor, descendant)` memberships.
    #[must_use]
    pub fn membership_count(&self) -> usize {
        self.groups.values().map(HashSet::len).sum()
    }
}

impl<K: Clone + Ord> ClosureGroups<K> {
    /// Ordered copy for stable display and serialization.
    #[must_use]
    pub fn to_sorted(&self) -> BTreeMap<K, BTreeSet<K>> {
        self.groups
            .iter()
            .map(|(ancestor, descendants)| {
                (ancestor.clone(), descendants.iter().cloned().collect())
            })
            .collect()
    }
}

#[derive(Serialize)]
struct GroupEntry<'a, K> {
    ancestor: &'a K,
    descendants: Vec<&'a K>,
}

/// Serializes as an array of `{"ancestor", "descendants"}` entries sorted
/// by ancestor, members sorted too.
///
/// Not an object keyed by ancestor: `1` and `"1"` are distinct ids but
/// would collapse onto the same JSON key.
impl<K: Ord + Serialize> Serialize for ClosureGroups<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<GroupEntry<'_, K>> = self
            .groups
            .iter()
            .map(|(ancestor, descendants)| {
                let mut descendants: Vec<&K> = descendants.iter().collect();
                descendants.sort_unstable();
                GroupEntry {
                    ancestor,
                    descendants,
                }
            })
            .collect();
        entries.sort_unstable_by(|a, b| a.ancestor.cmp(b.ancestor));
        serializer.collect_seq(entries)
    }
}

/// Group every `(id, ancestor)` pair by ancestor.
#[must_use]
pub fn group_by_ancestor<'a, K, I>(closure: I) -> ClosureGroups<K>
where
    K: Clone + Eq + Hash + 'a,
    I: IntoIterator<Item = &'a Edge<K>>,
{
    let mut groups: HashMap<K, HashSet<K>> = HashMap::new();
    for edge in closure {
        groups
            .entry(edge.parent_id.clone())
            .or_default()
            .insert(edge.id.clone());
    }
    ClosureGroups { groups }
}
