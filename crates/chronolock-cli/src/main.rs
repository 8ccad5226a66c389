use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "chronolock-cli", version, about = "ChronoLock CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lock a note behind time and price conditions
    Lock(commands::lock::LockArgs),
    /// Unlock an artifact if all of its conditions hold
    Unlock(commands::unlock::UnlockArgs),
    /// Show artifact metadata without unlocking
    Inspect(commands::inspect::InspectArgs),
    /// Generate a seed-phrase word position sequence
    Positions(commands::positions::PositionsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Lock(args) => commands::lock::run(args),
        Commands::Unlock(args) => commands::unlock::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Positions(args) => commands::positions::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
