//! Closures for many partitions at once.
//!
//! Loading is sequential because loaders such as a SQLite connection are
//! not `Sync`. Once every anchor set is materialized the per-partition
//! closures are independent, so they run on the rayon pool, each owning its
//! own working sets.

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, instrument};

use crate::closure::{ClosureEngine, ClosureStats};
use crate::error::{ClosureError, ErrorCode};
use crate::group::{ClosureGroups, group_by_ancestor};
use crate::id::EntityId;
use crate::loader::{LoadError, RelationLoader};

/// Grouped closure for one partition.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "K: Ord + Serialize"))]
pub struct PartitionClosure<K> {
    pub stats: ClosureStats,
    pub groups: ClosureGroups<K>,
}

/// Failure for one partition; the whole fan-out stops on the first one.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    #[error("failed to list partitions: {0}")]
    List(#[source] LoadError),

    #[error("partition {partition}: {source}")]
    Load {
        partition: EntityId,
        #[source]
        source: LoadError,
    },

    #[error("partition {partition}: {source}")]
    Closure {
        partition: EntityId,
        #[source]
        source: ClosureError,
    },
}

impl PartitionError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::List(source) | Self::Load { source, .. } => source.code(),
            Self::Closure { source, .. } => source.code(),
        }
    }
}

/// Load and close every partition in `partitions`.
///
/// # Errors
///
/// Returns the first [`PartitionError`] encountered. No partial map is
/// returned.
#[instrument(skip_all, fields(partitions = partitions.len()))]
pub fn compute_partitions<L>(
    engine: &ClosureEngine,
    loader: &L,
    partitions: &[EntityId],
) -> Result<BTreeMap<EntityId, PartitionClosure<L::Key>>, PartitionError>
where
    L: RelationLoader,
    L::Key: Send + Sync,
{
    let mut loaded = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let anchors = loader
            .load_anchors(partition)
            .map_err(|source| PartitionError::Load {
                partition: partition.clone(),
                source,
            })?;
        loaded.push((partition.clone(), anchors));
    }

    let results = loaded
        .into_par_iter()
        .map(|(partition, anchors)| {
            let closure = engine
                .compute(&anchors)
                .map_err(|source| PartitionError::Closure {
                    partition: partition.clone(),
                    source,
                })?;
            let result = PartitionClosure {
                stats: *closure.stats(),
                groups: group_by_ancestor(&closure),
            };
            Ok((partition, result))
        })
        .collect::<Result<BTreeMap<_, _>, PartitionError>>()?;

    info!(partitions = results.len(), "partitions computed");
    Ok(results)
}

/// [`compute_partitions`] over every partition the loader knows about.
///
/// # Errors
///
/// As [`compute_partitions`], plus a load error if the partition list itself
/// cannot be read.
pub fn compute_all_partitions<L>(
    engine: &ClosureEngine,
    loader: &L,
) -> Result<BTreeMap<EntityId, PartitionClosure<L::Key>>, PartitionError>
where
    L: RelationLoader,
    L::Key: Send + Sync,
{
    let partitions = loader.partitions().map_err(PartitionError::List)?;
    compute_partitions(engine, loader, &partitions)
}
