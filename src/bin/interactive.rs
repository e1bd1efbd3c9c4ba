use anyhow::{Context, Result};
use clap::Parser;
use grid_2048::config::{Config, GameConfig, LoadableConfig};
use grid_2048::game::Game;
use grid_2048::{logging, tui};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "interactive", version, about = "Play in the terminal")]
struct Args {
    /// TOML config with a [board] section
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed the tile spawner
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // stdout belongs to the board; logs go to stderr and stay quiet unless RUST_LOG is set
    logging::init_logger("warn");
    let args = Args::parse();
    let board_cfg = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .board,
        None => GameConfig::default(),
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = Game::new(&board_cfg, rng)?;
    let state = tui::run(&mut game).context("terminal error")?;
    println!("Final score: {} after {} moves", state.score, state.moves);
    Ok(())
}
