use anyhow::Result;
use clap::Parser;
use grid_2048::config::{Config, GameConfig, LoadableConfig};
use grid_2048::engine::{Board, Direction};
use grid_2048::game::{Game, GameState};
use grid_2048::harness::{run_episode, EpisodeOptions};
use grid_2048::logging;
use grid_2048::policy::{Policy, RandomPolicy};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

/// Play one game with the random policy and print every board.
#[derive(Debug, Parser)]
#[command(name = "grid-2048", version)]
struct Args {
    /// TOML config with a [board] section
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Seed for both the engine and the policy
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Prints each board the wrapped policy is shown, skipping repeats left by
/// moves that changed nothing.
struct Printing<P> {
    inner: P,
    last: Option<Board>,
}

impl<P> Printing<P> {
    fn new(inner: P) -> Self { Printing { inner, last: None } }

    fn show(&mut self, board: &Board) {
        if self.last.as_ref() != Some(board) {
            println!("{board}");
            self.last = Some(board.clone());
        }
    }
}

impl<P: Policy> Policy for Printing<P> {
    fn select_move(&mut self, state: &GameState) -> Direction {
        self.show(&state.board);
        self.inner.select_move(state)
    }
}

fn main() -> Result<()> {
    logging::init_logger("warn");
    let args = Args::parse();
    let board_cfg = match &args.config {
        Some(path) => Config::from_file(path)?.board,
        None => GameConfig::default(),
    };

    let (mut game, policy) = match args.seed {
        Some(seed) => (Game::from_seed(&board_cfg, seed)?, RandomPolicy::from_seed(seed.wrapping_add(1))),
        None => (Game::new(&board_cfg, StdRng::from_entropy())?, RandomPolicy::from_entropy()),
    };

    let mut printer = Printing::new(policy);
    let result = run_episode(&mut game, &mut printer, &EpisodeOptions::default());
    printer.show(game.board());
    println!(
        "Moves made: {}, Invalid moves: {}, Score: {}, Highest tile: {}, Won: {}",
        result.moves, result.invalid_moves, result.score, result.highest_tile, result.won
    );
    Ok(())
}
