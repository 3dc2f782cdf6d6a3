#![forbid(unsafe_code)]

mod cmd;
mod output;

use bossgraph_core::config::{Config, resolve_config};
use bossgraph_core::ErrorCode;
use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "bossgraph: cycle-safe reporting-chain closure",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (defaults to pretty on a terminal, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file to use instead of `.bossgraph/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Compute everyone's ancestors, grouped by ancestor",
        long_about = "Compute the transitive closure of the reports-to relation for one company \
                      and print, for every ancestor, the set of people who report to it directly \
                      or indirectly. Cycles in the input are tolerated.",
        after_help = "EXAMPLES:\n    # Company 1 from a SQLite database\n    bossgraph closure --db org.db --company 1\n\n    # Cross-check with the recursive SQL query\n    bossgraph closure --db org.db --company 1 --engine sql\n\n    # A bare edge list, as JSON\n    bossgraph closure --edges edges.json --format json"
    )]
    Closure(cmd::closure::ClosureArgs),

    #[command(
        about = "List reporting cycles",
        long_about = "List strongly connected groups in the direct reports-to relation, \
                      including people who report to themselves.",
        after_help = "EXAMPLES:\n    # Cycles in company 1\n    bossgraph cycles --db org.db --company 1"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        about = "Compute closures for every company",
        long_about = "Compute the grouped closure of every company in the input, in parallel.",
        after_help = "EXAMPLES:\n    # All companies in a database\n    bossgraph partitions --db org.db\n\n    # All companies in an employee document\n    bossgraph partitions --input employees.json --format json"
    )]
    Partitions(cmd::partitions::PartitionsArgs),

    #[command(
        about = "Show configuration",
        after_help = "EXAMPLES:\n    # Effective configuration\n    bossgraph config\n\n    # Project file only\n    bossgraph config --project"
    )]
    Config(cmd::config::ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BOSSGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "bossgraph=debug,info"
        } else {
            "bossgraph=info,warn"
        })
    });

    let format = env::var("BOSSGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let config = match resolve_config(&project_root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let output = resolve_output_mode(cli.format, cli.json, &Config::default());
            render_error(
                output,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            )?;
            std::process::exit(1);
        }
    };
    let output = resolve_output_mode(cli.format, cli.json, &config);
    debug!(?output, ?config, "configuration resolved");

    let command_result = match &cli.command {
        Commands::Closure(args) => cmd::closure::run_closure(args, &config, output),
        Commands::Cycles(args) => cmd::cycles::run_cycles(args, output),
        Commands::Partitions(args) => cmd::partitions::run_partitions(args, &config, output),
        Commands::Config(args) => cmd::config::run_config(args, &config, &project_root, output),
    };

    if let Err(err) = command_result {
        info!(error = %err, "command failed");
        render_error(output, &CliError::from(&err))?;
        std::process::exit(1);
    }

    Ok(())
}
