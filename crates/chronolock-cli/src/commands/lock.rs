use std::sync::Arc;

use clap::Args;
use chronolock_core::{
    build_condition_set, Comparator, ConditionDescriptor, Config, LockMode, Note,
    PositionSequence, StaticPriceOracle, SystemClock,
};

#[derive(Args)]
pub struct LockArgs {
    /// Note text
    note: String,
    /// Keep the note locked for this many days
    #[arg(long)]
    time_lock_days: Option<i64>,
    /// Keep the note locked until SYMBOL's price passes --threshold
    #[arg(long, requires = "threshold")]
    price_lock: Option<String>,
    /// Price threshold for --price-lock
    #[arg(long, requires = "price_lock", allow_negative_numbers = true)]
    threshold: Option<f64>,
    /// Comparator for --price-lock (>, >=, <, <=)
    #[arg(long, requires = "price_lock")]
    comparator: Option<String>,
    /// Lock mode (offchain, onchain); defaults to lock.mode from config
    #[arg(long)]
    mode: Option<String>,
    /// Include a word position sequence of this length (12 or 24)
    #[arg(long)]
    positions: Option<usize>,
    /// Shuffle the position sequence
    #[arg(long, requires = "positions")]
    shuffle: bool,
    /// Print artifact and metadata as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: LockArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mode = match args.mode.as_deref() {
        Some(raw) => raw.parse::<LockMode>()?,
        None => config.lock.mode,
    };

    let mut descriptors = Vec::new();
    if let Some(offset_days) = args.time_lock_days {
        descriptors.push(ConditionDescriptor::TimeLock { offset_days });
    }
    if let (Some(symbol), Some(threshold)) = (args.price_lock, args.threshold) {
        let comparator = match args.comparator.as_deref() {
            Some(raw) => raw.parse::<Comparator>()?,
            None => config.lock.default_comparator,
        };
        descriptors.push(ConditionDescriptor::PriceLock {
            symbol,
            threshold,
            comparator: Some(comparator),
        });
    }
    let conditions = build_condition_set(&descriptors, &SystemClock)?;

    let positions = match args.positions {
        Some(word_count) if args.shuffle => Some(PositionSequence::shuffled_with_seed(word_count, None)?),
        Some(word_count) => Some(PositionSequence::sequential(word_count)?),
        None => None,
    };

    // Locking never consults prices.
    let workflow = config.workflow(
        mode,
        Arc::new(SystemClock),
        Arc::new(StaticPriceOracle::new()),
    )?;
    let artifact = workflow.lock_with(&Note::from(args.note), &conditions, positions.as_ref())?;

    if args.json {
        let summary = workflow.inspect(&artifact)?;
        let out = serde_json::json!({
            "artifact": artifact,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{artifact}");
        if let Some(positions) = &positions {
            eprintln!("positions: {positions}");
        }
    }
    Ok(())
}
