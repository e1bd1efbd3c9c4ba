//! Move-selection policies that drive an engine without a human.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::Direction;
use crate::game::GameState;

/// Picks the next direction for a given state.
pub trait Policy {
    fn select_move(&mut self, state: &GameState) -> Direction;
}

/// Uniformly random direction, ignoring the state entirely. Moves that would
/// not change the board are still proposed, so the engine records them as
/// invalid.
#[derive(Debug, Clone)]
pub struct RandomPolicy<R = StdRng> {
    rng: R,
}

impl RandomPolicy<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomPolicy<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Policy for RandomPolicy<R> {
    #[inline]
    fn select_move(&mut self, _state: &GameState) -> Direction {
        Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())]
    }
}
