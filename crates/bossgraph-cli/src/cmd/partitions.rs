//! `bossgraph partitions` — closures for every company, computed in parallel.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Result, bail};
use bossgraph_core::config::Config;
use bossgraph_core::loader::{JsonLoader, SqliteLoader};
use bossgraph_core::{
    ClosureEngine, ClosureGroups, ClosureStats, EntityId, PartitionClosure, compute_all_partitions,
};
use clap::Args;
use serde::{Serialize, Serializer};

use super::closure::{effective_limits, write_groups};
use super::source::{PartitionSourceArgs, open_db};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Arguments for `bossgraph partitions`.
#[derive(Args, Debug, Default)]
pub struct PartitionsArgs {
    #[command(flatten)]
    pub source: PartitionSourceArgs,

    /// Per-partition round limit (overrides config).
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u64>,

    /// Per-partition pair limit (overrides config).
    #[arg(long, value_name = "N")]
    pub max_pairs: Option<u64>,
}

/// Per-company results, sorted by company.
///
/// Serialized as an array of entries rather than an object keyed by company:
/// `1` and `"1"` are different companies but the same JSON key.
struct PartitionsOutput(BTreeMap<EntityId, PartitionClosure<EntityId>>);

#[derive(Serialize)]
struct PartitionEntry<'a> {
    partition: &'a EntityId,
    stats: &'a ClosureStats,
    groups: &'a ClosureGroups<EntityId>,
}

impl Serialize for PartitionsOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|(partition, result)| PartitionEntry {
            partition,
            stats: &result.stats,
            groups: &result.groups,
        }))
    }
}

/// Execute `bossgraph partitions`.
pub fn run_partitions(args: &PartitionsArgs, config: &Config, output: OutputMode) -> Result<()> {
    let engine = ClosureEngine::new(effective_limits(
        config,
        args.max_iterations,
        args.max_pairs,
    ));

    let results = if let Some(path) = &args.source.db {
        let conn = open_db(path)?;
        compute_all_partitions(&engine, &SqliteLoader::new(&conn))?
    } else if let Some(path) = &args.source.input {
        compute_all_partitions(&engine, &JsonLoader::from_path(path)?)?
    } else {
        bail!("no input given: pass --db or --input");
    };

    render(output, &PartitionsOutput(results), render_partitions_human)
}

fn render_partitions_human(
    results: &PartitionsOutput,
    mode: OutputMode,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if results.0.is_empty() {
        if mode == OutputMode::Pretty {
            writeln!(w, "No companies found.")?;
        }
        return Ok(());
    }

    for (idx, (partition, result)) in results.0.iter().enumerate() {
        if mode == OutputMode::Pretty {
            if idx > 0 {
                writeln!(w)?;
            }
            pretty_section(w, &format!("Company {partition}"))?;
            pretty_kv(w, "pairs", result.stats.pairs.to_string())?;
            pretty_kv(w, "iterations", result.stats.iterations.to_string())?;
        } else {
            writeln!(w, "[{partition}]")?;
        }
        write_groups(&result.groups, w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::render_to;
    use bossgraph_core::compute_partitions;

    const DOC: &str = r#"{"employees": [
        {"id": 2, "boss_id": 5, "company_id": 1},
        {"id": 1, "boss_id": 9, "company_id": 1},
        {"id": 3, "boss_id": 9, "company_id": 1},
        {"id": 4, "boss_id": 3, "company_id": 2}
    ]}"#;

    fn results() -> PartitionsOutput {
        let loader = JsonLoader::parse(DOC).expect("parse");
        let results = compute_partitions(
            &ClosureEngine::unbounded(),
            &loader,
            &[EntityId::Int(1), EntityId::Int(2)],
        )
        .expect("compute");
        PartitionsOutput(results)
    }

    #[test]
    fn text_output_has_section_per_company() {
        let mut out = Vec::new();
        render_partitions_human(&results(), OutputMode::Text, &mut out).expect("render");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "[1]\n5: 2\n9: 1 3\n[2]\n3: 4\n"
        );
    }

    #[test]
    fn pretty_output_names_companies() {
        let mut out = Vec::new();
        render_partitions_human(&results(), OutputMode::Pretty, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("Company 1"));
        assert!(rendered.contains("Company 2"));
    }

    #[test]
    fn empty_text_output_is_empty() {
        let mut out = Vec::new();
        render_partitions_human(&PartitionsOutput(BTreeMap::new()), OutputMode::Text, &mut out).expect("render");
        assert!(out.is_empty());
    }

    #[test]
    fn json_keeps_int_and_text_companies_apart() {
        let loader = JsonLoader::parse(
            r#"{"employees": [
                {"id": 2, "boss_id": 5, "company_id": 1},
                {"id": 7, "boss_id": 8, "company_id": "1"}
            ]}"#,
        )
        .expect("parse");
        let results = compute_partitions(
            &ClosureEngine::unbounded(),
            &loader,
            &[EntityId::Int(1), EntityId::from("1")],
        )
        .expect("compute");

        let mut out = Vec::new();
        render_to(
            &mut out,
            OutputMode::Json,
            &PartitionsOutput(results),
            render_partitions_human,
        )
        .expect("render");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        let entries = value.as_array().expect("array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["partition"], serde_json::json!(1));
        assert_eq!(entries[0]["groups"][0]["descendants"], serde_json::json!([2]));
        assert_eq!(entries[1]["partition"], serde_json::json!("1"));
        assert_eq!(entries[1]["groups"][0]["ancestor"], serde_json::json!(8));
        assert_eq!(entries[1]["stats"]["pairs"], serde_json::json!(1));
    }
}
