//! Noise models: how an imperfect tool corrupts an oracle path.
//!
//! Each model maps `(oracle path, maze, rng) -> suggested path`. The rng is
//! always injected by the caller; models never reach for ambient
//! randomness. Whatever a model does, the suggestion starts on the same
//! cell as the oracle path.
//!
//! | Model    | Failure mode                                   |
//! |----------|------------------------------------------------|
//! | Random   | Replaces the plan with a random walk           |
//! | Biased   | Coin-flips between heading toward / away       |
//! | Delayed  | Stale plan from earlier calls, or cut short    |
//! | Combined | Weighted pick of one of the above per call     |

use crate::error::ConfigError;
use crate::maze::Maze;
use crate::types::{Action, Path, Position};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Default staleness for [`DelayedNoise`].
pub const DEFAULT_DELAY_STEPS: usize = 3;

/// Replaces the plan with a random walk of the same intended length.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomNoise {
    level: f64,
}

impl RandomNoise {
    pub fn new(level: f64) -> Result<Self, ConfigError> {
        Ok(Self { level: ConfigError::check_probability("noise_level", level)? })
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn apply<R: Rng + ?Sized>(&self, path: &[Position], maze: &Maze, rng: &mut R) -> Path {
        let Some(&start) = path.first() else {
            return Vec::new();
        };
        if rng.gen::<f64>() >= self.level {
            return path.to_vec();
        }

        let mut current = start;
        let mut walk = vec![current];
        for _ in 1..path.len() {
            let mut directions = Action::ALL;
            directions.shuffle(rng);

            let next = directions.iter().find_map(|a| {
                let (dr, dc) = a.delta();
                maze.step_from(current, dr, dc)
            });
            match next {
                Some(next) => {
                    current = next;
                    walk.push(current);
                }
                None => break,
            }
        }
        walk
    }
}

/// Heads toward or directly away from the goal on a fair coin per move.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasedNoise {
    level: f64,
}

impl BiasedNoise {
    pub fn new(level: f64) -> Result<Self, ConfigError> {
        Ok(Self { level: ConfigError::check_probability("noise_level", level)? })
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn apply<R: Rng + ?Sized>(&self, path: &[Position], maze: &Maze, rng: &mut R) -> Path {
        let (Some(&start), Some(&goal)) = (path.first(), path.last()) else {
            return Vec::new();
        };
        if rng.gen::<f64>() >= self.level {
            return path.to_vec();
        }

        let toward_row = axis_sign(start.row, goal.row);
        let toward_col = axis_sign(start.col, goal.col);

        let mut current = start;
        let mut biased = vec![current];
        let mut visited = HashSet::from([current]);

        for _ in 1..path.len() {
            let (sr, sc) = if rng.gen::<f64>() < 0.5 {
                (-toward_row, -toward_col)
            } else {
                (toward_row, toward_col)
            };

            // Horizontal component first, then vertical; never diagonal.
            let next = [(0, sc), (sr, 0)]
                .into_iter()
                .filter(|&(dr, dc)| (dr, dc) != (0, 0))
                .filter_map(|(dr, dc)| maze.step_from(current, dr, dc))
                .find(|p| !visited.contains(p));

            match next {
                Some(next) => {
                    current = next;
                    visited.insert(current);
                    biased.push(current);
                }
                None => break,
            }
        }
        biased
    }
}

fn axis_sign(from: usize, to: usize) -> isize {
    match to.cmp(&from) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    }
}

/// Serves stale or truncated plans.
///
/// Only the `delay_steps + 1` most recent inputs are retained.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedNoise {
    level: f64,
    delay_steps: usize,
    cache: VecDeque<Path>,
}

impl DelayedNoise {
    pub fn new(level: f64, delay_steps: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            level: ConfigError::check_probability("noise_level", level)?,
            delay_steps,
            cache: VecDeque::with_capacity(delay_steps + 1),
        })
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn delay_steps(&self) -> usize {
        self.delay_steps
    }

    /// Number of cached inputs currently retained.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, path: &[Position], _maze: &Maze, rng: &mut R) -> Path {
        let had_history = !self.cache.is_empty();

        if self.cache.len() == self.delay_steps + 1 {
            self.cache.pop_front();
        }
        self.cache.push_back(path.to_vec());

        if !had_history || path.is_empty() {
            return path.to_vec();
        }

        if rng.gen::<f64>() < self.level {
            // Front of the ring is `delay_steps` calls ago, or the oldest kept.
            if let Some(stale) = self.cache.front().and_then(|p| reanchor(p, path[0])) {
                return stale;
            }
            return self.truncate(path);
        }
        if rng.gen::<f64>() < self.level {
            return self.truncate(path);
        }
        path.to_vec()
    }

    fn truncate(&self, path: &[Position]) -> Path {
        let keep = path.len().saturating_sub(self.delay_steps).max(1);
        path[..keep].to_vec()
    }
}

/// The part of a stale plan that starts where the agent stands now.
fn reanchor(stale: &[Position], start: Position) -> Option<Path> {
    stale
        .iter()
        .position(|p| *p == start)
        .map(|i| stale[i..].to_vec())
}

/// Picks one sub-model per call by weight.
#[derive(Debug, Clone)]
pub struct CombinedNoise {
    models: Vec<NoiseModel>,
    weights: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl CombinedNoise {
    pub fn new(models: Vec<(NoiseModel, f64)>) -> Result<Self, ConfigError> {
        let (models, weights): (Vec<NoiseModel>, Vec<f64>) = models.into_iter().unzip();
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(ConfigError::InvalidWeights("weights must be finite".to_string()));
        }
        let index = WeightedIndex::new(&weights)
            .map_err(|e| ConfigError::InvalidWeights(e.to_string()))?;
        Ok(Self { models, weights, index })
    }

    /// Sub-models with their normalised weights.
    pub fn components(&self) -> impl Iterator<Item = (&NoiseModel, f64)> {
        let total: f64 = self.weights.iter().sum();
        self.models.iter().zip(self.weights.iter().map(move |w| w / total))
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, path: &[Position], maze: &Maze, rng: &mut R) -> Path {
        let chosen = self.index.sample(rng);
        self.models[chosen].apply(path, maze, rng)
    }
}

/// The closed family of noise models.
#[derive(Debug, Clone)]
pub enum NoiseModel {
    Random(RandomNoise),
    Biased(BiasedNoise),
    Delayed(DelayedNoise),
    Combined(CombinedNoise),
}

impl NoiseModel {
    /// Builds the model named by `kind` at the given level; `None` for
    /// [`NoiseType::None`].
    pub fn from_type(kind: NoiseType, level: f64) -> Result<Option<Self>, ConfigError> {
        let model = match kind {
            NoiseType::None => return Ok(None),
            NoiseType::Random => NoiseModel::Random(RandomNoise::new(level)?),
            NoiseType::Biased => NoiseModel::Biased(BiasedNoise::new(level)?),
            NoiseType::Delayed => NoiseModel::Delayed(DelayedNoise::new(level, DEFAULT_DELAY_STEPS)?),
            NoiseType::Combined => NoiseModel::Combined(CombinedNoise::new(vec![
                (NoiseModel::Random(RandomNoise::new(level)?), 1.0),
                (NoiseModel::Biased(BiasedNoise::new(level)?), 1.0),
                (NoiseModel::Delayed(DelayedNoise::new(level, DEFAULT_DELAY_STEPS)?), 1.0),
            ])?),
        };
        Ok(Some(model))
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoiseModel::Random(_) => "random",
            NoiseModel::Biased(_) => "biased",
            NoiseModel::Delayed(_) => "delayed",
            NoiseModel::Combined(_) => "combined",
        }
    }

    /// Produces the tool's suggestion for an oracle path.
    pub fn apply<R: Rng + ?Sized>(&mut self, path: &[Position], maze: &Maze, rng: &mut R) -> Path {
        let noisy = match self {
            NoiseModel::Random(m) => m.apply(path, maze, rng),
            NoiseModel::Biased(m) => m.apply(path, maze, rng),
            NoiseModel::Delayed(m) => m.apply(path, maze, rng),
            NoiseModel::Combined(m) => m.apply(path, maze, rng),
        };
        if noisy.as_slice() != path {
            debug!(
                "{} noise altered path: {} -> {} cells",
                self.name(),
                path.len(),
                noisy.len()
            );
        }
        noisy
    }
}

/// Noise type identifiers accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    None,
    Random,
    Biased,
    Delayed,
    Combined,
}

impl NoiseType {
    pub fn name(&self) -> &'static str {
        match self {
            NoiseType::None => "none",
            NoiseType::Random => "random",
            NoiseType::Biased => "biased",
            NoiseType::Delayed => "delayed",
            NoiseType::Combined => "combined",
        }
    }
}

impl std::fmt::Display for NoiseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for NoiseType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(NoiseType::None),
            "random" => Ok(NoiseType::Random),
            "biased" => Ok(NoiseType::Biased),
            "delayed" => Ok(NoiseType::Delayed),
            "combined" => Ok(NoiseType::Combined),
            _ => Err(ConfigError::UnknownNoiseType(s.to_string())),
        }
    }
}
