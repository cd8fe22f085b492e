use clap::Parser;
use miette::Result;
use tilemap_export::cli::{init_logging, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => tilemap_export::cli::export::run(args)?,
        Commands::Inspect(args) => tilemap_export::cli::inspect::run(args)?,
        Commands::Completions(args) => tilemap_export::cli::completions::run(args)?,
    }

    Ok(())
}
