use anyhow::{Context, Result};
use clap::Args;
use docpipe_core::Aggregator;
use std::path::PathBuf;
use tracing::info;

use super::{load_collection, parse_json_arg, render_documents};

#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// JSON file holding an array of documents
    pub collection: PathBuf,

    /// Pipeline as a JSON array of stages (JSON or @file)
    #[arg(short, long)]
    pub pipeline: String,
}

pub fn execute_aggregate_command(args: AggregateArgs, pretty: bool) -> Result<String> {
    let collection = load_collection(&args.collection)?;
    let pipeline = parse_json_arg(&args.pipeline)?;
    let aggregator = Aggregator::from_value(&pipeline).context("invalid pipeline")?;

    let results = aggregator.run_owned(collection);
    info!(
        collection = %args.collection.display(),
        stages = aggregator.stages().len(),
        results = results.len(),
        "aggregation completed"
    );

    render_documents(&results, pretty)
}
