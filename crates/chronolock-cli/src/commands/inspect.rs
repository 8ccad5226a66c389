use std::sync::Arc;

use clap::Args;
use chronolock_core::{Config, LockMode, StaticPriceOracle, SystemClock};

use super::read_artifact;

#[derive(Args)]
pub struct InspectArgs {
    /// Artifact string, or "-" to read it from stdin
    artifact: String,
}

pub fn run(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let artifact = read_artifact(&args.artifact)?;
    let mode = LockMode::detect(artifact.as_str());
    let workflow = config.workflow(
        mode,
        Arc::new(SystemClock),
        Arc::new(StaticPriceOracle::new()),
    )?;

    let summary = workflow.inspect(&artifact)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
