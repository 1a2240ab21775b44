use std::io;

use anyhow::Result;
use clap::Parser;
use jmphlt::batch::{BatchConfig, GameSummary, run_batch};
use jmphlt::engine::EngineConfig;
use jmphlt::session::Session;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jmphlt", about = "Jumps and halts: a dice-driven board of tiny instructions")]
struct Cli {
    /// Give up on a turn after this many consecutive jumps (default: follow
    /// jump chains forever).
    #[arg(long)]
    hop_limit: Option<usize>,

    /// Play this many games non-interactively and print one CSV row each.
    #[arg(long)]
    batch: Option<usize>,

    /// Board size for batch mode.
    #[arg(long, default_value_t = 36)]
    size: usize,

    /// Map seed for batch mode (0 for a random board).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    seed: i64,

    /// Seed the batch dice for reproducible runs.
    #[arg(long)]
    dice_seed: Option<u64>,

    /// In batch mode, stop a game that has not halted after this many turns.
    #[arg(long, default_value_t = 100_000)]
    turn_limit: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.batch {
        Some(games) => {
            let defaults = BatchConfig::default();
            let config = BatchConfig {
                games,
                board_size: cli.size,
                seed: cli.seed as u64,
                dice_seed: cli.dice_seed,
                hop_limit: cli.hop_limit.unwrap_or(defaults.hop_limit),
                turn_limit: cli.turn_limit,
            };
            run_batch_mode(&config)
        }
        None => {
            let config = EngineConfig {
                hop_limit: cli.hop_limit,
            };
            let stdin = io::stdin();
            let mut session = Session::new(stdin.lock(), io::stdout(), config);
            session.run()?;
            Ok(())
        }
    }
}

fn run_batch_mode(config: &BatchConfig) -> Result<()> {
    let start = std::time::Instant::now();
    let report = run_batch(config)?;
    let elapsed = start.elapsed();

    println!("{}", GameSummary::CSV_HEADER);
    for game in &report.games {
        println!("{game}");
    }

    eprintln!("Batch results:");
    eprintln!("  Board:        {}", report.map);
    eprintln!("  Games:        {}", report.games.len());
    eprintln!("  Halted:       {}", report.halted());
    eprintln!("  Cycles:       {}", report.cycles());
    eprintln!("  Turn limited: {}", report.turn_limited());
    eprintln!("  Mean turns:   {:.2}", report.mean_turns());
    if let Some((lo, hi)) = report.score_range() {
        eprintln!("  Score range:  {lo}..={hi}");
    }
    eprintln!("  Elapsed:      {elapsed:.2?}");
    Ok(())
}
