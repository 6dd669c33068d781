//! Error types for the TrustMaze substrate.

use thiserror::Error;

/// Configuration errors raised at construction time.
///
/// Nothing in the substrate silently falls back to a default when an
/// identifier or parameter is not understood.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Maze difficulty identifier is not one of easy/medium/hard
    #[error("Unknown maze difficulty: {0}")]
    UnknownDifficulty(String),

    /// Noise type identifier is not recognised
    #[error("Unknown noise type: {0}")]
    UnknownNoiseType(String),

    /// Decision strategy identifier is not recognised
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// A probability-valued parameter lies outside [0, 1]
    #[error("{name} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },

    /// Combined noise weights are unusable
    #[error("Invalid noise weights: {0}")]
    InvalidWeights(String),

    /// Maze side length too small to hold distinct start and goal cells
    #[error("Maze size must be at least 2, got {0}")]
    InvalidMazeSize(usize),

    /// Step budget of zero
    #[error("Step budget must be positive")]
    ZeroStepBudget,

    /// Raw action index outside 0..=3
    #[error("Invalid action index: {0}")]
    InvalidAction(u8),
}

impl ConfigError {
    /// Validates a probability-valued parameter.
    pub fn check_probability(name: &'static str, value: f64) -> Result<f64, Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(Self::ProbabilityOutOfRange { name, value })
        }
    }
}
