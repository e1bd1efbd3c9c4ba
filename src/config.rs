//! Configuration consumed at construction time.
//!
//! A config file is TOML with a `[board]` section and an optional
//! `[benchmark]` section:
//!
//! ```toml
//! [board]
//! size = [4, 4]
//! spawn_values = [2, 4]
//! spawn_probs = [0.9, 0.1]
//!
//! [benchmark]
//! episodes = 100000
//! ```

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::{cell_count, is_tile_value, MAX_TILE};
use crate::error::ConfigError;

const PROB_TOLERANCE: f64 = 1e-6;

/// Board dimensions and spawn distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// `[rows, cols]`.
    pub size: [usize; 2],
    pub spawn_values: Vec<u64>,
    pub spawn_probs: Vec<f64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { size: [4, 4], spawn_values: vec![2, 4], spawn_probs: vec![0.9, 0.1] }
    }
}

impl GameConfig {
    #[inline]
    pub fn rows(&self) -> usize { self.size[0] }

    #[inline]
    pub fn cols(&self) -> usize { self.size[1] }

    /// Check dimensions and the spawn distribution, producing the sampler.
    pub fn validate(&self) -> Result<SpawnRule, ConfigError> {
        let [rows, cols] = self.size;
        cell_count(rows, cols)?;
        SpawnRule::new(self.spawn_values.clone(), &self.spawn_probs)
    }
}

/// Knobs for the statistics harness. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub episodes: usize,
    /// Base seed; `None` seeds every episode from entropy.
    pub seed: Option<u64>,
    /// Per-episode step cap.
    pub max_steps: Option<u64>,
    /// Worker threads; `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self { episodes: 100_000, seed: None, max_steps: None, threads: None }
    }
}

/// Top-level config file layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub board: GameConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

pub trait LoadableConfig: Sized + DeserializeOwned {
    fn from_toml(string: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<Self>(string)?)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}

impl LoadableConfig for Config {}
impl LoadableConfig for GameConfig {}

/// Validated spawn distribution: which value lands on each spawn, and how often.
#[derive(Debug, Clone)]
pub struct SpawnRule {
    values: Vec<u64>,
    index: WeightedIndex<f64>,
}

impl SpawnRule {
    /// Values must be powers of two `>= 2`; probabilities must be finite,
    /// non-negative, as many as the values, and sum to 1.
    ///
    /// ```
    /// use grid_2048::config::SpawnRule;
    /// assert!(SpawnRule::new(vec![2, 4], &[0.9, 0.1]).is_ok());
    /// assert!(SpawnRule::new(vec![2, 4], &[0.9]).is_err());
    /// assert!(SpawnRule::new(vec![2, 4], &[0.5, 0.4]).is_err());
    /// ```
    pub fn new(values: Vec<u64>, probs: &[f64]) -> Result<Self, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::EmptySpawnValues);
        }
        if values.len() != probs.len() {
            return Err(ConfigError::SpawnLengthMismatch { values: values.len(), probs: probs.len() });
        }
        if let Some(&bad) = values.iter().find(|&&v| v == 0 || v > MAX_TILE || !is_tile_value(v)) {
            return Err(ConfigError::InvalidSpawnValue(bad));
        }
        if let Some(&bad) = probs.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(ConfigError::InvalidProbability(bad));
        }
        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > PROB_TOLERANCE {
            return Err(ConfigError::ProbabilitySum(sum));
        }
        let index = WeightedIndex::new(probs).map_err(|_| ConfigError::ProbabilitySum(sum))?;
        Ok(Self { values, index })
    }

    /// Candidate spawn values, in config order.
    pub fn values(&self) -> &[u64] { &self.values }

    /// Draw one spawn value.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        self.values[self.index.sample(rng)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_is_classic() {
        let cfg = GameConfig::default();
        assert_eq!((cfg.rows(), cfg.cols()), (4, 4));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_size() {
        let cfg = GameConfig { size: [0, 4], ..GameConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSize { rows: 0, cols: 4 })));
        let cfg = GameConfig { size: [3, 0], ..GameConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSize { .. })));
        let cfg = GameConfig { size: [100_000, 100_000], ..GameConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSize { rows: 100_000, cols: 100_000 })));
        let cfg = GameConfig { size: [usize::MAX, 3], ..GameConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSize { .. })));
    }

    #[test]
    fn rejects_bad_distribution() {
        assert!(matches!(SpawnRule::new(vec![], &[]), Err(ConfigError::EmptySpawnValues)));
        assert!(matches!(
            SpawnRule::new(vec![2, 4], &[1.0]),
            Err(ConfigError::SpawnLengthMismatch { values: 2, probs: 1 })
        ));
        assert!(matches!(SpawnRule::new(vec![2, 6], &[0.5, 0.5]), Err(ConfigError::InvalidSpawnValue(6))));
        assert!(matches!(SpawnRule::new(vec![1], &[1.0]), Err(ConfigError::InvalidSpawnValue(1))));
        assert!(matches!(SpawnRule::new(vec![2, 4], &[1.5, -0.5]), Err(ConfigError::InvalidProbability(_))));
        assert!(matches!(SpawnRule::new(vec![2, 4], &[0.6, 0.6]), Err(ConfigError::ProbabilitySum(_))));
        assert!(matches!(SpawnRule::new(vec![2], &[f64::NAN]), Err(ConfigError::InvalidProbability(_))));
        assert!(matches!(SpawnRule::new(vec![1 << 63], &[1.0]), Err(ConfigError::InvalidSpawnValue(_))));
        assert!(SpawnRule::new(vec![MAX_TILE], &[1.0]).is_ok());
    }

    #[test]
    fn validate_keeps_value_order() {
        let rule = GameConfig::default().validate().unwrap();
        assert_eq!(rule.values(), &[2, 4]);
    }

    #[test]
    fn accepts_float_noise_in_sum() {
        assert!(SpawnRule::new(vec![2, 4, 8], &[0.7, 0.2, 0.1]).is_ok());
    }

    #[test]
    fn sample_follows_weights() {
        let rule = SpawnRule::new(vec![2, 4], &[1.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!((0..100).all(|_| rule.sample(&mut rng) == 2));

        let rule = SpawnRule::new(vec![2, 4], &[0.9, 0.1]).unwrap();
        let fours = (0..10_000).filter(|_| rule.sample(&mut rng) == 4).count();
        assert!((700..1300).contains(&fours), "fours = {fours}");
    }

    #[test]
    fn parse_full_file() {
        let text = r#"
            [board]
            size = [3, 5]
            spawn_values = [2, 4]
            spawn_probs = [0.75, 0.25]

            [benchmark]
            episodes = 250
            seed = 9
        "#;
        let cfg = Config::from_toml(text).unwrap();
        assert_eq!(cfg.board.size, [3, 5]);
        assert_eq!(cfg.benchmark.episodes, 250);
        assert_eq!(cfg.benchmark.seed, Some(9));
        assert_eq!(cfg.benchmark.max_steps, None);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "[board]\nsize = [2, 2]\nspawn_values = [2]\nspawn_probs = [1.0]").unwrap();
        let cfg = Config::from_file(tmp.path()).unwrap();
        assert_eq!(cfg.board.size, [2, 2]);
        assert!(cfg.board.validate().is_ok());
    }

    #[test]
    fn parse_errors_surface() {
        assert!(matches!(Config::from_toml("[board]\nsize = \"big\""), Err(ConfigError::Parse(_))));
        assert!(matches!(Config::from_file(Path::new("/nonexistent/cfg.toml")), Err(ConfigError::Io(_))));
    }
}
