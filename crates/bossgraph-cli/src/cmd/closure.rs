//! `bossgraph closure` — every (descendant, ancestor) pair, grouped by ancestor.

use std::io::Write;

use anyhow::{Context, Result, bail};
use bossgraph_core::config::Config;
use bossgraph_core::loader::sqlite::sql_closure;
use bossgraph_core::{
    ClosureEngine, ClosureGroups, ClosureLimits, ClosureStats, EntityId, group_by_ancestor,
};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::info;

use super::source::{SourceArgs, load_anchors};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render};

/// Arguments for `bossgraph closure`.
#[derive(Args, Debug, Default)]
pub struct ClosureArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Where to run the computation.
    #[arg(long, value_enum, default_value_t = Engine::Memory)]
    pub engine: Engine,

    /// Abort after this many expansion rounds (overrides config).
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u64>,

    /// Abort once the closure holds more than this many pairs (overrides config).
    #[arg(long, value_name = "N")]
    pub max_pairs: Option<u64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// In-process fixed-point expansion with limits.
    #[default]
    Memory,
    /// SQLite `WITH RECURSIVE` query (requires `--db`, ignores limits).
    Sql,
}

impl Engine {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sql => "sql",
        }
    }
}

#[derive(Debug, Serialize)]
struct ClosureOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    partition: Option<EntityId>,
    engine: &'static str,
    anchors_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<ClosureStats>,
    groups: ClosureGroups<EntityId>,
}

/// CLI flags win over the config file, field by field.
pub fn effective_limits(
    config: &Config,
    max_iterations: Option<u64>,
    max_pairs: Option<u64>,
) -> ClosureLimits {
    let mut limits = config.limits.to_limits();
    if max_iterations.is_some() {
        limits.max_iterations = max_iterations;
    }
    if max_pairs.is_some() {
        limits.max_pairs = max_pairs;
    }
    limits
}

/// Execute `bossgraph closure`.
pub fn run_closure(args: &ClosureArgs, config: &Config, output: OutputMode) -> Result<()> {
    let loaded = load_anchors(&args.source)?;
    let anchors_hash = loaded.anchors.content_hash();

    let (stats, groups) = match args.engine {
        Engine::Memory => {
            let engine = ClosureEngine::new(effective_limits(
                config,
                args.max_iterations,
                args.max_pairs,
            ));
            let closure = engine
                .compute(&loaded.anchors)
                .context("computing closure")?;
            (Some(*closure.stats()), group_by_ancestor(&closure))
        }
        Engine::Sql => {
            let (Some(conn), Some(partition)) = (&loaded.connection, &loaded.partition) else {
                bail!("--engine sql requires --db");
            };
            let pairs = sql_closure(conn, partition).context("running recursive query")?;
            (None, group_by_ancestor(&pairs))
        }
    };

    info!(
        engine = args.engine.as_str(),
        ancestors = groups.len(),
        pairs = groups.membership_count(),
        "closure computed"
    );

    let payload = ClosureOutput {
        partition: loaded.partition,
        engine: args.engine.as_str(),
        anchors_hash,
        stats,
        groups,
    };
    render(output, &payload, render_closure_human)
}

fn render_closure_human(
    payload: &ClosureOutput,
    mode: OutputMode,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if mode == OutputMode::Pretty {
        let heading = payload.partition.as_ref().map_or_else(
            || "Closure".to_string(),
            |partition| format!("Closure for company {partition}"),
        );
        pretty_section(w, &heading)?;
        pretty_kv(w, "engine", payload.engine)?;
        if let Some(stats) = &payload.stats {
            pretty_kv(w, "anchors", stats.anchors.to_string())?;
            pretty_kv(w, "pairs", stats.pairs.to_string())?;
            pretty_kv(w, "iterations", stats.iterations.to_string())?;
        }
        pretty_kv(w, "hash", &payload.anchors_hash)?;
        pretty_rule(w)?;
        if payload.groups.is_empty() {
            writeln!(w, "No reporting relationships.")?;
            return Ok(());
        }
    }

    write_groups(&payload.groups, w)
}

/// One `ancestor: d1 d2 ...` line per ancestor, both levels sorted.
pub fn write_groups(groups: &ClosureGroups<EntityId>, w: &mut dyn Write) -> std::io::Result<()> {
    for (ancestor, descendants) in groups.to_sorted() {
        let line: Vec<String> = descendants.iter().map(ToString::to_string).collect();
        writeln!(w, "{ancestor}: {}", line.join(" "))?;
    }
    Ok(())
}
