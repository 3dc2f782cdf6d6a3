//! `bossgraph cycles` — list reporting cycles in the direct-boss relation.

use std::io::Write;

use anyhow::Result;
use bossgraph_core::EntityId;
use bossgraph_core::cycles::find_cycles;
use clap::Args;
use serde::Serialize;

use super::source::{SourceArgs, load_anchors};
use crate::output::{OutputMode, render};

/// Arguments for `bossgraph cycles`.
#[derive(Args, Debug, Default)]
pub struct CyclesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    partition: Option<EntityId>,
    cycles: Vec<Vec<EntityId>>,
}

/// Execute `bossgraph cycles`.
pub fn run_cycles(args: &CyclesArgs, output: OutputMode) -> Result<()> {
    let loaded = load_anchors(&args.source)?;
    let payload = CyclesOutput {
        partition: loaded.partition,
        cycles: find_cycles(&loaded.anchors),
    };
    render(output, &payload, render_cycles_human)
}

fn render_cycles_human(
    payload: &CyclesOutput,
    mode: OutputMode,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if mode == OutputMode::Text {
        for cycle in &payload.cycles {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            writeln!(w, "{}", members.join(" "))?;
        }
        return Ok(());
    }

    if payload.cycles.is_empty() {
        writeln!(w, "No reporting cycles found.")?;
        return Ok(());
    }

    writeln!(w, "Reporting cycles ({})", payload.cycles.len())?;
    for (idx, cycle) in payload.cycles.iter().enumerate() {
        if cycle.len() == 1 {
            writeln!(w, "\nCycle {} (reports to self):", idx + 1)?;
        } else {
            writeln!(w, "\nCycle {}:", idx + 1)?;
        }
        for id in cycle {
            writeln!(w, "  - {id}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_args_parse_edges() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: CyclesArgs,
        }

        let parsed = Wrapper::parse_from(["test", "--edges", "e.json"]);
        assert!(parsed.args.source.edges.is_some());
    }

    #[test]
    fn render_cycles_human_no_cycles() {
        let payload = CyclesOutput {
            partition: None,
            cycles: Vec::new(),
        };
        let mut out = Vec::new();

        render_cycles_human(&payload, OutputMode::Pretty, &mut out).expect("render");

        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("No reporting cycles found."));
    }

    #[test]
    fn render_cycles_human_lists_groups() {
        let payload = CyclesOutput {
            partition: None,
            cycles: vec![
                vec![EntityId::Int(1), EntityId::Int(2)],
                vec![EntityId::from("ceo")],
            ],
        };

        let mut out = Vec::new();
        render_cycles_human(&payload, OutputMode::Pretty, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("Cycle 1:"));
        assert!(rendered.contains("  - 2"));
        assert!(rendered.contains("Cycle 2 (reports to self):"));

        let mut out = Vec::new();
        render_cycles_human(&payload, OutputMode::Text, &mut out).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "1 2\nceo\n");
    }
}
