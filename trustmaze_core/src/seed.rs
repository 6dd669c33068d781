//! Deterministic seed derivation.
//!
//! Every stochastic component gets its own ChaCha8 stream derived from
//! `(experiment_seed, episode_index, stream)`. Streams are isolated: adding
//! tool calls to an episode never shifts the maze layout or the agent's
//! own coin flips.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generator used by every stochastic component.
pub type SimRng = ChaCha8Rng;

/// Independent randomness streams within one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedStream {
    /// Maze layout
    Maze,
    /// Tool noise draws
    Noise,
    /// Agent-side choices (query coin flips, adaptive trust)
    Agent,
}

impl SeedStream {
    fn salt(self) -> u64 {
        match self {
            SeedStream::Maze => 0x9e3779b97f4a7c15,
            SeedStream::Noise => 0x517cc1b727220a95,
            SeedStream::Agent => 0x3c6ef372fe94f82b,
        }
    }
}

/// Derives the seed for one stream of one episode.
pub fn derive_seed(experiment_seed: u64, episode_index: u64, stream: SeedStream) -> u64 {
    experiment_seed
        .wrapping_mul(0x9e3779b97f4a7c15)
        .wrapping_add(episode_index.wrapping_mul(0x517cc1b727220a95))
        ^ stream.salt()
}

/// Builds a ChaCha8 generator for one stream of one episode.
pub fn episode_rng(experiment_seed: u64, episode_index: u64, stream: SeedStream) -> SimRng {
    SimRng::seed_from_u64(derive_seed(experiment_seed, episode_index, stream))
}
