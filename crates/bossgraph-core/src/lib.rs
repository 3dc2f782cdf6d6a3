//! bossgraph-core library.
//!
//! Computes the transitive closure of a parent-pointer ("reports to")
//! relation without looping on cycles, and groups the result by ancestor.
//!
//! ```
//! use bossgraph_core::{AnchorSet, compute_closure, group_by_ancestor};
//!
//! let anchors: AnchorSet<u32> = [(2, 5), (1, 9), (3, 9)].into_iter().collect();
//! let closure = compute_closure(&anchors);
//! let groups = group_by_ancestor(&closure);
//! assert_eq!(groups.get(&9).map(|d| d.len()), Some(2));
//! ```
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums at the engine and loader seams,
//!   `anyhow::Result` for configuration and the CLI.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

#![forbid(unsafe_code)]

pub mod closure;
pub mod config;
pub mod cycles;
pub mod edge;
pub mod error;
pub mod group;
pub mod id;
pub mod loader;
pub mod partition;

pub use closure::{ClosureEngine, ClosureLimits, ClosureSet, ClosureStats, compute_closure};
pub use edge::{AnchorSet, Edge};
pub use error::{ClosureError, ErrorCode, LimitKind};
pub use group::{ClosureGroups, group_by_ancestor};
pub use id::EntityId;
pub use loader::{LoadError, RelationLoader};
pub use partition::{PartitionClosure, PartitionError, compute_all_partitions, compute_partitions};
