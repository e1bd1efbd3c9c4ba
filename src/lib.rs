//! grid-2048: a sliding-tile merge puzzle engine for boards of any size.
//!
//! This crate provides:
//! - A `Board` with one direction-parameterized slide/merge transform (`engine` module)
//! - A `Game` engine that owns the board, spawns tiles and tracks score/moves (`game` module)
//! - A uniformly random `Policy` for benchmarking (`policy` module)
//! - A parallel episode runner with summary statistics (`harness` module)
//! - A terminal front-end for human play (`tui` module)
//!
//! Quick start:
//! ```
//! use grid_2048::config::GameConfig;
//! use grid_2048::engine::Direction;
//! use grid_2048::game::Game;
//!
//! // Deterministic engine with a seeded RNG
//! let mut game = Game::from_seed(&GameConfig::default(), 42).unwrap();
//! let step = game.update(Direction::Left);
//! assert_eq!(step.state.moves, 1);
//! assert!(step.state.board.count_empty() >= 14);
//! ```
//!
//! Full episode with the random policy:
//! ```
//! use grid_2048::config::GameConfig;
//! use grid_2048::game::Game;
//! use grid_2048::harness::{run_episode, EpisodeOptions};
//! use grid_2048::policy::RandomPolicy;
//!
//! let mut game = Game::from_seed(&GameConfig::default(), 7).unwrap();
//! let mut policy = RandomPolicy::from_seed(8);
//! let result = run_episode(&mut game, &mut policy, &EpisodeOptions::default());
//! assert!(result.lost);
//! ```
//!
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod harness;
pub mod logging;
pub mod policy;
pub mod tui;
