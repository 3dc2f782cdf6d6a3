//! Transitive closure of a parent-pointer relation.
//!
//! # Algorithm
//!
//! Level-synchronous BFS expansion to a fixed point:
//!
//! ```text
//! closure  := anchors            (minus self-loops)
//! frontier := closure
//! while frontier is not empty:
//!     next := { (id, a2) | (id, a1) in frontier, (a1, a2) in anchors }
//!     next := next - { (id, id) }          cycle guard
//!     next := next - closure               dedup against full history
//!     closure  := closure ∪ next
//!     frontier := next
//! ```
//!
//! The dedup step runs against every pair discovered so far, not only the
//! previous level. A cycle can regenerate a pair found several levels ago,
//! and only the full-history check guarantees the frontier eventually
//! empties. The loop runs at most `n²` pairs for `n` distinct ids; for tree
//! input it runs one round per level of depth.
//!
//! # Self-loops
//!
//! An anchor `(x, x)` is never seeded into the closure, so no entity is ever
//! its own ancestor. It stays in the anchor index, where extending through it
//! can only regenerate pairs that already exist.
//!
//! # Limits
//!
//! [`ClosureEngine`] carries optional [`ClosureLimits`]. The worst case is
//! quadratic in entity count, so callers facing untrusted input can cap
//! rounds, pairs or wall-clock time. Tripping a limit discards all work and
//! returns [`ClosureError::ComputationLimitExceeded`].

#![allow(clippy::module_name_repetitions)]

use std::collections::HashSet;
use std::collections::hash_set;
use std::convert::Infallible;
use std::hash::Hash;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::edge::{AnchorSet, Edge};
use crate::error::{ClosureError, LimitKind};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Defensive bounds on a single closure computation. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureLimits {
    /// Maximum number of expansion rounds. A chain of depth `d` needs `d`.
    pub max_iterations: Option<u64>,
    /// Maximum number of distinct pairs in the closure.
    pub max_pairs: Option<u64>,
    /// Maximum wall-clock time for one computation.
    pub max_duration: Option<Duration>,
}

impl ClosureLimits {
    /// No limits at all.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_iterations: None,
            max_pairs: None,
            max_duration: None,
        }
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.max_iterations.is_none() && self.max_pairs.is_none() && self.max_duration.is_none()
    }
}

/// Counters describing one closure computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClosureStats {
    /// Distinct anchor edges in the input.
    pub anchors: usize,
    /// Expansion rounds executed, including the final empty one.
    pub iterations: u64,
    /// Distinct `(id, ancestor)` pairs in the result.
    pub pairs: usize,
    /// Reflexive anchors left out of the seed.
    pub self_loops_skipped: usize,
    /// Candidates dropped because they would make an entity its own ancestor.
    pub cycle_guard_hits: usize,
    /// Candidates dropped because the pair was already known.
    pub duplicate_hits: usize,
}

/// The deduplicated `(id, ancestor)` relation produced by the engine.
#[derive(Debug, Clone)]
pub struct ClosureSet<K> {
    pairs: HashSet<Edge<K>>,
    stats: ClosureStats,
}

impl<K: Eq + Hash> PartialEq for ClosureSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs && self.stats == other.stats
    }
}

impl<K: Eq + Hash> Eq for ClosureSet<K> {}

impl<K: Clone + Eq + Hash> ClosureSet<K> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `true` if `ancestor` is reachable from `id`.
    #[must_use]
    pub fn contains(&self, id: &K, ancestor: &K) -> bool {
        self.pairs
            .contains(&Edge::new(id.clone(), ancestor.clone()))
    }

    pub fn iter(&self) -> hash_set::Iter<'_, Edge<K>> {
        self.pairs.iter()
    }

    #[must_use]
    pub const fn stats(&self) -> &ClosureStats {
        &self.stats
    }

    #[must_use]
    pub fn into_edges(self) -> HashSet<Edge<K>> {
        self.pairs
    }
}

impl<'a, K> IntoIterator for &'a ClosureSet<K> {
    type Item = &'a Edge<K>;
    type IntoIter = hash_set::Iter<'a, Edge<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl<K> IntoIterator for ClosureSet<K> {
    type Item = Edge<K>;
    type IntoIter = hash_set::IntoIter<Edge<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Closure engine with optional defensive limits.
///
/// The engine holds no state between calls; one instance can serve any
/// number of concurrent computations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureEngine {
    limits: ClosureLimits,
}

impl ClosureEngine {
    #[must_use]
    pub const fn new(limits: ClosureLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub const fn unbounded() -> Self {
        Self::new(ClosureLimits::unbounded())
    }

    #[must_use]
    pub const fn limits(&self) -> &ClosureLimits {
        &self.limits
    }

    /// Compute the closure of `anchors`, enforcing the configured limits.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::ComputationLimitExceeded`] if any limit trips.
    /// Nothing is returned for the work done up to that point.
    #[instrument(skip_all, fields(anchors = anchors.len()))]
    pub fn compute<K>(&self, anchors: &AnchorSet<K>) -> Result<ClosureSet<K>, ClosureError>
    where
        K: Clone + Eq + Hash,
    {
        let budget = Limited {
            limits: self.limits,
            started: Instant::now(),
        };
        let result = expand(anchors, &budget);
        if let Err(err) = &result {
            warn!(error = %err, "closure computation aborted");
        }
        result
    }
}

/// Compute the closure of `anchors` with no limits. Total over any finite
/// input, including cyclic and self-referencing relations.
#[must_use]
pub fn compute_closure<K>(anchors: &AnchorSet<K>) -> ClosureSet<K>
where
    K: Clone + Eq + Hash,
{
    match expand(anchors, &Unlimited) {
        Ok(closure) => closure,
        Err(never) => match never {},
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Clock reads inside a round happen once per this many inserted pairs.
const CLOCK_STRIDE: usize = 1024;

/// Checked around every expansion round, and on every insert so that a
/// single wide round cannot overshoot the pair or time bound.
trait Budget {
    type Error;

    fn check(&self, iterations: u64, pairs: usize) -> Result<(), Self::Error>;

    /// Called right after the closure grows to `pairs` entries.
    fn check_growth(&self, pairs: usize) -> Result<(), Self::Error>;
}

struct Unlimited;

impl Budget for Unlimited {
    type Error = Infallible;

    fn check(&self, _iterations: u64, _pairs: usize) -> Result<(), Infallible> {
        Ok(())
    }

    fn check_growth(&self, _pairs: usize) -> Result<(), Infallible> {
        Ok(())
    }
}

struct Limited {
    limits: ClosureLimits,
    started: Instant,
}

impl Limited {
    fn check_pairs(&self, pairs: usize) -> Result<(), ClosureError> {
        let pairs = u64::try_from(pairs).unwrap_or(u64::MAX);
        if let Some(max) = self.limits.max_pairs {
            if pairs > max {
                return Err(ClosureError::limit(LimitKind::Pairs, max, pairs));
            }
        }
        Ok(())
    }

    fn check_clock(&self) -> Result<(), ClosureError> {
        if let Some(max) = self.limits.max_duration {
            let elapsed = self.started.elapsed();
            if elapsed > max {
                return Err(ClosureError::duration_limit(max, elapsed));
            }
        }
        Ok(())
    }
}

impl Budget for Limited {
    type Error = ClosureError;

    fn check(&self, iterations: u64, pairs: usize) -> Result<(), ClosureError> {
        if let Some(max) = self.limits.max_iterations {
            if iterations > max {
                return Err(ClosureError::limit(LimitKind::Iterations, max, iterations));
            }
        }
        self.check_pairs(pairs)?;
        self.check_clock()
    }

    fn check_growth(&self, pairs: usize) -> Result<(), ClosureError> {
        self.check_pairs(pairs)?;
        if pairs.is_multiple_of(CLOCK_STRIDE) {
            self.check_clock()?;
        }
        Ok(())
    }
}

fn expand<K, B>(anchors: &AnchorSet<K>, budget: &B) -> Result<ClosureSet<K>, B::Error>
where
    K: Clone + Eq + Hash,
    B: Budget,
{
    let mut stats = ClosureStats {
        anchors: anchors.len(),
        ..ClosureStats::default()
    };

    // Step 1: seed with the direct relationships.
    let mut closure: HashSet<Edge<K>> = HashSet::with_capacity(anchors.len());
    for edge in anchors.iter() {
        if edge.is_self_loop() {
            stats.self_loops_skipped += 1;
            continue;
        }
        if closure.insert(edge.clone()) {
            budget.check_growth(closure.len())?;
        }
    }
    let mut frontier: Vec<Edge<K>> = closure.iter().cloned().collect();
    budget.check(0, closure.len())?;

    // Step 2: extend every frontier pair by one more level until nothing new
    // turns up.
    while !frontier.is_empty() {
        stats.iterations += 1;
        budget.check(stats.iterations, closure.len())?;

        let mut next_frontier: Vec<Edge<K>> = Vec::new();
        for edge in &frontier {
            for ancestor in anchors.parents_of(&edge.parent_id) {
                if *ancestor == edge.id {
                    stats.cycle_guard_hits += 1;
                    continue;
                }
                let candidate = Edge::new(edge.id.clone(), ancestor.clone());
                // `insert` is the history check: it fails for pairs found at
                // any earlier level and for repeats within this level.
                if closure.insert(candidate.clone()) {
                    budget.check_growth(closure.len())?;
                    next_frontier.push(candidate);
                } else {
                    stats.duplicate_hits += 1;
                }
            }
        }

        debug!(
            depth = stats.iterations,
            frontier = next_frontier.len(),
            closure = closure.len(),
            "expanded frontier"
        );
        budget.check(stats.iterations, closure.len())?;
        frontier = next_frontier;
    }

    stats.pairs = closure.len();
    info!(
        anchors = stats.anchors,
        pairs = stats.pairs,
        iterations = stats.iterations,
        self_loops = stats.self_loops_skipped,
        "closure computed"
    );

    Ok(ClosureSet {
        pairs: closure,
        stats,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
