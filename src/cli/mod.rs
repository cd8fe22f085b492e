pub mod completions;
pub mod export;
pub mod inspect;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// tilemap-export - Export tile maps for a game engine
#[derive(Parser, Debug)]
#[command(name = "tilemap-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log more detail (-v: info, files written; -vv: debug, every record)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export map documents to map, tileset and spritesheet files
    Export(export::ExportArgs),

    /// Summarize map documents without writing anything
    Inspect(inspect::InspectArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

/// Filter directives used when `RUST_LOG` is unset.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "warn,tilemap_export=info",
        _ => "warn,tilemap_export=debug",
    }
}
