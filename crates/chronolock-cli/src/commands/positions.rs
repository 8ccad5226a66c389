use clap::Args;
use chronolock_core::{Config, PositionSequence};

#[derive(Args)]
pub struct PositionsArgs {
    /// Number of words (12 or 24); defaults to positions.word_count from config
    #[arg(long)]
    words: Option<usize>,
    /// Shuffle instead of counting up
    #[arg(long)]
    shuffle: bool,
    /// Seed for a reproducible shuffle
    #[arg(long, requires = "shuffle")]
    seed: Option<u64>,
    /// Print as a JSON array
    #[arg(long)]
    json: bool,
}

pub fn run(args: PositionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let word_count = match args.words {
        Some(n) => n,
        None => Config::load()?.positions.word_count,
    };
    let positions = if args.shuffle {
        PositionSequence::shuffled_with_seed(word_count, args.seed)?
    } else {
        PositionSequence::sequential(word_count)?
    };

    if args.json {
        println!("{}", serde_json::to_string(&positions)?);
    } else {
        println!("{positions}");
    }
    Ok(())
}
