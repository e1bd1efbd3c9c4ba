//! Episode runner and batch statistics.
//!
//! Episodes are independent, so a batch fans them out over a rayon pool and
//! collects the per-episode results in episode order before aggregating.
//! Aggregation runs once on the collected vector, which keeps a seeded batch
//! bit-for-bit reproducible regardless of how work was scheduled.
//!
//! ```
//! use grid_2048::config::{BenchmarkConfig, GameConfig};
//! use grid_2048::harness::run_batch_seeded;
//!
//! let bench = BenchmarkConfig { episodes: 8, seed: Some(1), ..BenchmarkConfig::default() };
//! let stats = run_batch_seeded(&GameConfig::default(), &bench, None).unwrap();
//! assert_eq!(stats.episodes, 8);
//! assert!(stats.score.mean > 0.0);
//! ```

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

use crate::config::{BenchmarkConfig, GameConfig};
use crate::error::{ConfigError, HarnessError};
use crate::game::{Game, GameState};
use crate::policy::{Policy, RandomPolicy};

/// Per-episode limits. Not part of the engine contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpisodeOptions {
    /// Stop after this many moves even if the game is not lost.
    pub max_steps: Option<u64>,
}

/// Summary of one finished (or truncated) episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpisodeResult {
    pub won: bool,
    pub lost: bool,
    pub score: u64,
    pub moves: u64,
    pub invalid_moves: u64,
    pub highest_tile: u64,
    /// The step cap ended the episode before a loss.
    pub truncated: bool,
}

impl EpisodeResult {
    fn from_state(state: &GameState, truncated: bool) -> Self {
        Self {
            won: state.won,
            lost: state.lost,
            score: state.score,
            moves: state.moves,
            invalid_moves: state.invalid_moves,
            highest_tile: state.board.highest_tile(),
            truncated,
        }
    }

    /// Moves that actually changed the board.
    #[inline]
    pub fn valid_moves(&self) -> u64 { self.moves - self.invalid_moves }
}

/// Drive `game` with `policy` until a move leaves the board lost.
///
/// At least one move is always made; `won` and `lost` are recorded as the
/// engine reports them, including when both hold.
pub fn run_episode<R, P>(game: &mut Game<R>, policy: &mut P, opts: &EpisodeOptions) -> EpisodeResult
where
    R: Rng,
    P: Policy + ?Sized,
{
    let mut state = game.state();
    loop {
        if opts.max_steps.is_some_and(|cap| state.moves >= cap) {
            tracing::debug!(moves = state.moves, score = state.score, "episode hit step cap");
            return EpisodeResult::from_state(&state, true);
        }
        let dir = policy.select_move(&state);
        state = game.update(dir).state;
        if state.lost {
            return EpisodeResult::from_state(&state, false);
        }
    }
}

/// Mean and population standard deviation of a metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub std: f64,
}

impl Summary {
    /// An empty input yields zeros.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self { mean, std: var.sqrt() }
    }
}

/// Aggregate over a batch of episodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub episodes: usize,
    pub win_rate: Summary,
    pub score: Summary,
    pub steps: Summary,
    /// Steps minus invalid moves.
    pub valid_steps: Summary,
    pub best_score: u64,
    pub best_tile: u64,
    pub truncated: usize,
}

impl AggregateStats {
    pub fn from_results(results: &[EpisodeResult]) -> Self {
        let metric = |f: fn(&EpisodeResult) -> f64| {
            let values: Vec<f64> = results.iter().map(f).collect();
            Summary::from_values(&values)
        };
        Self {
            episodes: results.len(),
            win_rate: metric(|r| if r.won { 1.0 } else { 0.0 }),
            score: metric(|r| r.score as f64),
            steps: metric(|r| r.moves as f64),
            valid_steps: metric(|r| r.valid_moves() as f64),
            best_score: results.iter().map(|r| r.score).max().unwrap_or(0),
            best_tile: results.iter().map(|r| r.highest_tile).max().unwrap_or(0),
            truncated: results.iter().filter(|r| r.truncated).count(),
        }
    }
}

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[INFO] Win rate: {:.4} +/- {:.4}", self.win_rate.mean, self.win_rate.std)?;
        writeln!(f, "[INFO] Avg score: {:.2} +/- {:.2}", self.score.mean, self.score.std)?;
        writeln!(f, "[INFO] Avg length: {:.2} +/- {:.2}", self.steps.mean, self.steps.std)?;
        write!(
            f,
            "[INFO] Avg length (w/o invalid moves): {:.4} +/- {:.4}",
            self.valid_steps.mean, self.valid_steps.std
        )
    }
}

/// Run `n` independent episodes in parallel on the current rayon pool.
///
/// `make_game` and `make_policy` receive the episode index and must build
/// fresh, unshared instances.
pub fn run_batch<R, P, G, M>(
    n: usize,
    make_game: G,
    make_policy: M,
    opts: &EpisodeOptions,
    progress: Option<&ProgressBar>,
) -> Result<AggregateStats, ConfigError>
where
    R: Rng,
    P: Policy,
    G: Fn(usize) -> Result<Game<R>, ConfigError> + Sync,
    M: Fn(usize) -> P + Sync,
{
    let results = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut game = make_game(i)?;
            let mut policy = make_policy(i);
            let result = run_episode(&mut game, &mut policy, opts);
            if let Some(pb) = progress {
                pb.inc(1);
            }
            Ok(result)
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;
    Ok(AggregateStats::from_results(&results))
}

/// Engine and policy seeds for episode `index` of a batch seeded with `base`.
#[inline]
pub fn episode_seeds(base: u64, index: usize) -> (u64, u64) {
    let i = (index as u64).wrapping_mul(2);
    (base.wrapping_add(i), base.wrapping_add(i).wrapping_add(1))
}

/// Random-policy batch as described by `bench`. With a seed the outcome is
/// reproducible; without one every episode draws from entropy. `threads`
/// builds a dedicated pool, otherwise the global pool is used.
pub fn run_batch_seeded(
    config: &GameConfig,
    bench: &BenchmarkConfig,
    progress: Option<&ProgressBar>,
) -> Result<AggregateStats, HarnessError> {
    let spawn = config.validate()?;
    let opts = EpisodeOptions { max_steps: bench.max_steps };
    let n = bench.episodes;
    tracing::info!(
        episodes = n,
        rows = config.rows(),
        cols = config.cols(),
        spawn_values = ?spawn.values(),
        seed = ?bench.seed,
        "starting batch"
    );

    let run = || match bench.seed {
        Some(base) => run_batch(
            n,
            |i| Game::from_seed(config, episode_seeds(base, i).0),
            |i| RandomPolicy::from_seed(episode_seeds(base, i).1),
            &opts,
            progress,
        ),
        None => run_batch(
            n,
            |_| Game::new(config, StdRng::from_entropy()),
            |_| RandomPolicy::from_entropy(),
            &opts,
            progress,
        ),
    };

    let stats = match bench.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            pool.install(run)?
        }
        None => run()?,
    };

    if stats.truncated > 0 {
        tracing::warn!(truncated = stats.truncated, "episodes stopped by the step cap");
    }
    tracing::info!(
        episodes = stats.episodes,
        mean_score = stats.score.mean,
        best_tile = stats.best_tile,
        "batch finished"
    );
    Ok(stats)
}
