use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use connect_four_arena::{
    Competitor, PluginStrategy, RandomStrategy, TournamentConfig, TournamentResult,
    TournamentRunner,
};

/// Pit two Connect-Four strategies against each other.
#[derive(Parser)]
#[command(name = "connect-four-arena", about = "Connect-Four strategy tournament")]
struct Cli {
    /// Path to JSON configuration file
    #[arg(long, default_value = "arena.json")]
    config: PathBuf,

    /// Override number of games
    #[arg(long)]
    games: Option<usize>,

    /// Override per-move time budget in milliseconds
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Override number of games played concurrently
    #[arg(long)]
    parallel: Option<usize>,

    /// Seed for the fallback move generator
    #[arg(long)]
    seed: Option<u64>,

    /// Strategy plugin (shared library) replacing the second competitor
    #[arg(long)]
    plugin: Option<PathBuf>,

    /// Print the final result as JSON
    #[arg(long)]
    json: bool,

    /// Print every finished board and per-move logs
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let outcome = runtime.block_on(run(cli));
    // Strategies abandoned after a timeout may still be running
    runtime.shutdown_background();
    outcome
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = TournamentConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(games) = cli.games {
        config.games_count = games;
    }
    if let Some(budget_ms) = cli.budget_ms {
        config.move_time_budget = Duration::from_millis(budget_ms);
    }
    if let Some(parallel) = cli.parallel {
        config.parallel_games = parallel;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.verbose |= cli.verbose;

    let first = match config.seed {
        Some(seed) => RandomStrategy::with_seed(seed.wrapping_add(1)),
        None => RandomStrategy::new(),
    };
    let mut competitors = vec![Competitor::new("random", first)];

    match &cli.plugin {
        Some(path) => {
            let plugin = PluginStrategy::load(path)
                .with_context(|| format!("loading plugin {}", path.display()))?;
            let name = plugin.name().to_string();
            competitors.push(Competitor::new(name, plugin));
        }
        None => {
            let second = match config.seed {
                Some(seed) => RandomStrategy::with_seed(seed.wrapping_add(2)),
                None => RandomStrategy::new(),
            };
            competitors.push(Competitor::new("alter ego", second));
        }
    }

    let json = cli.json;
    let runner = TournamentRunner::new(config, competitors)?;
    let result = runner.run().await?;
    report(&result, json)
}

fn report(result: &TournamentResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        result.display();
    }
    Ok(())
}
