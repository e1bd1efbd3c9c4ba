use std::io;

/// Malformed construction parameters. Fatal for the instance being built.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("board size {rows}x{cols} is empty or too large")]
    InvalidSize { rows: usize, cols: usize },
    #[error("spawn_values must not be empty")]
    EmptySpawnValues,
    #[error("spawn_values has {values} entries but spawn_probs has {probs}")]
    SpawnLengthMismatch { values: usize, probs: usize },
    #[error("spawn value {0} is not a power of two in 2..=2^62")]
    InvalidSpawnValue(u64),
    #[error("spawn probability {0} is negative or not finite")]
    InvalidProbability(f64),
    #[error("spawn probabilities sum to {0}, expected 1")]
    ProbabilitySum(f64),
    #[error("seeded board does not match a {rows}x{cols} grid")]
    BoardShape { rows: usize, cols: usize },
    #[error("tile value {0} is neither empty nor a power of two in 2..=2^62")]
    InvalidTile(u64),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A direction token outside `L`/`R`/`U`/`D` (and their long forms).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid direction: {0:?}")]
pub struct InvalidDirectionError(pub String);

/// Failures while setting up a batch of episodes.
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
