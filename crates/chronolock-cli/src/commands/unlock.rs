use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use chronolock_core::{Config, LockMode, PriceOracle, StaticPriceOracle, SystemClock};
use tracing::debug;

use super::read_artifact;

#[derive(Args)]
pub struct UnlockArgs {
    /// Artifact string, or "-" to read it from stdin
    artifact: String,
    /// Use a fixed price instead of the price source, e.g. --price XAUUSD=2500
    #[arg(long = "price", value_parser = parse_price)]
    prices: Vec<(String, f64)>,
    /// Price lookup timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Print note and metadata as JSON
    #[arg(long)]
    json: bool,
}

fn parse_price(raw: &str) -> Result<(String, f64), String> {
    let (symbol, price) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got '{raw}'"))?;
    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid price '{price}': {e}"))?;
    Ok((symbol.trim().to_string(), price))
}

pub fn run(args: UnlockArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let artifact = read_artifact(&args.artifact)?;
    let mode = LockMode::detect(artifact.as_str());

    let oracle: Arc<dyn PriceOracle> = if args.prices.is_empty() {
        config.price_oracle()?
    } else {
        Arc::new(args.prices.into_iter().collect::<StaticPriceOracle>())
    };

    let mut workflow = config.workflow(mode, Arc::new(SystemClock), oracle)?;
    if let Some(ms) = args.timeout_ms {
        workflow = workflow.with_lookup_timeout(Duration::from_millis(ms));
    }

    debug!(%mode, len = artifact.as_str().len(), "unlocking artifact");
    let runtime = tokio::runtime::Runtime::new()?;
    let unlocked = runtime.block_on(workflow.unlock_detailed(&artifact))?;

    if args.json {
        let out = serde_json::json!({
            "note": unlocked.note,
            "positions": unlocked.positions,
            "mode": unlocked.mode,
            "id": unlocked.id,
            "created_at": unlocked.created_at,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", unlocked.note);
        if let Some(positions) = &unlocked.positions {
            eprintln!("positions: {positions}");
        }
    }
    Ok(())
}
