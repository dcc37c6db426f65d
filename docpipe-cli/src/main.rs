use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};

mod commands;
mod config;
mod logging;

use commands::*;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "docpipe")]
#[command(about = "Query and aggregate JSON document collections")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(long, default_value = "docpipe.toml", env = "DOCPIPE_CONFIG")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Pretty-print JSON output (overrides the config file)
    #[arg(long)]
    pretty: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select documents matching criteria
    Find(FindArgs),
    /// Run an aggregation pipeline
    Aggregate(AggregateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(&cli.config)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(pretty) = cli.pretty {
        config.output.pretty = pretty;
    }

    logging::init_logging(&config.logging);
    debug!(config = %cli.config.display(), "configuration loaded");

    let result = match cli.command {
        Commands::Find(args) => execute_find_command(args, config.output.pretty),
        Commands::Aggregate(args) => execute_aggregate_command(args, config.output.pretty),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
