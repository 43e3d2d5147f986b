use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use layers::LayerRegistry;
use tools::{LoadingLine, Replay, Scenario, ToolConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Replays layer reconciliation scenarios against an in-memory map",
    after_help = "ATLAS_DEFAULT_PROJECTION sets the fallback projection (default EPSG:3857).\nATLAS_VIEWPORT sets the map size as <width>x<height> (default 800x600).\nRUST_LOG controls diagnostics on stderr."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario file; prints one JSON line per loading flag change, then a summary
    Replay {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Only print the summary line
        #[arg(long)]
        quiet: bool,
    },

    /// List the registered layer types
    Types,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Replay { scenario, quiet } => cmd_replay(&scenario, quiet),
        Command::Types => cmd_types(),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn cmd_replay(path: &Path, quiet: bool) -> Result<(), String> {
    let tool = ToolConfig::from_env().map_err(|e| e.to_string())?;
    let scenario = Scenario::load(path).map_err(|e| e.to_string())?;
    let registry = Rc::new(LayerRegistry::with_defaults());
    let mut replay = Replay::for_scenario(registry, &scenario, &tool);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for step in &scenario.steps {
        let events = replay.apply(step).map_err(|e| e.to_string())?;
        if quiet {
            continue;
        }
        for event in events {
            let line = serde_json::to_string(&LoadingLine::from(event))
                .map_err(|e| format!("encode event: {e}"))?;
            writeln!(out, "{line}").map_err(|e| format!("write stdout: {e}"))?;
        }
    }

    let summary = serde_json::to_string(&replay.summary())
        .map_err(|e| format!("encode summary: {e}"))?;
    writeln!(out, "{summary}").map_err(|e| format!("write stdout: {e}"))?;
    Ok(())
}

fn cmd_types() -> Result<(), String> {
    let registry = LayerRegistry::with_defaults();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for name in registry.types() {
        writeln!(out, "{name}").map_err(|e| format!("write stdout: {e}"))?;
    }
    Ok(())
}
