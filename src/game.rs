use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{GameConfig, SpawnRule};
use crate::engine::{win_tile, Board, Direction};
use crate::error::{ConfigError, InvalidDirectionError};

/// Read-only snapshot of an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub score: u64,
    /// Calls to `update`, valid or not.
    pub moves: u64,
    /// Calls to `update` that left the board unchanged.
    pub invalid_moves: u64,
    pub won: bool,
    pub lost: bool,
}

/// What one `update` call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: GameState,
    /// Merge reward earned by this move alone.
    pub reward: u64,
    /// Whether this move altered the board (and so spawned a tile).
    pub changed: bool,
}

/// Single-episode game engine. Owns its board and its random source.
///
/// ```
/// use grid_2048::config::GameConfig;
/// use grid_2048::engine::Direction;
/// use grid_2048::game::Game;
///
/// let mut game = Game::from_seed(&GameConfig::default(), 42).unwrap();
/// assert_eq!(game.board().count_empty(), 15);
/// let step = game.update(Direction::Left);
/// assert_eq!(step.state.moves, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Game<R = StdRng> {
    board: Board,
    spawn: SpawnRule,
    win_tile: Option<u64>,
    score: u64,
    moves: u64,
    invalid_moves: u64,
    rng: R,
}

impl Game<StdRng> {
    /// Engine driven by a `StdRng` seeded with `seed`.
    pub fn from_seed(config: &GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// Allocate an empty board of the configured size and spawn the first tile.
    pub fn new(config: &GameConfig, rng: R) -> Result<Self, ConfigError> {
        let spawn = config.validate()?;
        let board = Board::empty(config.rows(), config.cols())?;
        let mut game = Self::assemble(board, spawn, rng);
        game.spawn();
        Ok(game)
    }

    /// Start from a given board instead of an empty one. No initial spawn.
    pub fn with_board(config: &GameConfig, board: Board, rng: R) -> Result<Self, ConfigError> {
        let spawn = config.validate()?;
        if board.rows() != config.rows() || board.cols() != config.cols() {
            return Err(ConfigError::BoardShape { rows: config.rows(), cols: config.cols() });
        }
        Ok(Self::assemble(board, spawn, rng))
    }

    fn assemble(board: Board, spawn: SpawnRule, rng: R) -> Self {
        let win_tile = win_tile(board.rows(), board.cols());
        Self { board, spawn, win_tile, score: 0, moves: 0, invalid_moves: 0, rng }
    }

    #[inline]
    pub fn board(&self) -> &Board { &self.board }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    #[inline]
    pub fn moves(&self) -> u64 { self.moves }

    #[inline]
    pub fn invalid_moves(&self) -> u64 { self.invalid_moves }

    /// The tile that wins this board, if representable.
    #[inline]
    pub fn win_tile(&self) -> Option<u64> { self.win_tile }

    #[inline]
    pub fn occupied(&self, r: usize, c: usize) -> bool { self.board.occupied(r, c) }

    pub fn is_won(&self) -> bool {
        self.win_tile.is_some_and(|t| self.board.contains(t))
    }

    pub fn is_lost(&self) -> bool { self.board.is_lost() }

    /// Place one tile drawn from the spawn rule on a random empty cell and
    /// return its position.
    ///
    /// Panics on a full board.
    pub fn spawn(&mut self) -> (usize, usize) {
        let (r, c) = self.board.random_empty_cell(&mut self.rng);
        let value = self.spawn.sample(&mut self.rng);
        self.board.set(r, c, value);
        tracing::trace!(r, c, value, "spawned tile");
        (r, c)
    }

    /// Apply one move: slide/merge, spawn if anything changed, update counters.
    pub fn update(&mut self, dir: Direction) -> Step {
        let shift = self.board.shift(dir);
        if shift.changed {
            self.spawn();
        } else {
            self.invalid_moves += 1;
            tracing::trace!(%dir, "move left the board unchanged");
        }
        self.moves += 1;
        self.score = self.score.saturating_add(shift.reward);
        Step { state: self.state(), reward: shift.reward, changed: shift.changed }
    }

    /// Parse a direction token (`L`, `right`, ...) and apply it. An
    /// unrecognised token leaves the engine untouched.
    pub fn update_action(&mut self, action: &str) -> Result<Step, InvalidDirectionError> {
        let dir = action.parse::<Direction>()?;
        Ok(self.update(dir))
    }

    pub fn state(&self) -> GameState {
        GameState {
            board: self.board.clone(),
            score: self.score,
            moves: self.moves,
            invalid_moves: self.invalid_moves,
            won: self.is_won(),
            lost: self.is_lost(),
        }
    }
}
