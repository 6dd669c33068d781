//! TrustMaze Core - deterministic substrate for tool-reliance experiments
//!
//! An agent navigates grid mazes with access to a planning tool that may be
//! wrong. This crate is everything below the agent:
//!
//! ```text
//!   MazeGenerator ──► Maze ──► GridWorld (reset / step)
//!                       │
//!                       ├──► oracle::astar ──► ground-truth Path
//!                       │                          │
//!                       │                     NoiseModel
//!                       │                          │
//!                       └──────────────► ToolPlanner::plan ──► suggestion
//!
//!   trajectory + decisions + tool queries ──► MetricsEngine ──► BRI
//! ```
//!
//! Determinism: every stochastic component takes an explicitly seeded
//! ChaCha8 generator (see [`seed`]). There is no global randomness.

pub mod error;
pub mod grid_world;
pub mod maze;
pub mod metrics;
pub mod noise;
pub mod oracle;
pub mod planner;
pub mod seed;
pub mod types;

pub use error::ConfigError;
pub use grid_world::{GridWorld, GridWorldConfig, Observation, StepInfo, StepOutcome};
pub use maze::{Cell, Maze, MazeDifficulty, MazeGenerator};
pub use metrics::{
    blind_reliance_index, AggregateMetrics, ConvergenceSeries, DecisionRecord, EpisodeMetrics,
    MetricsEngine, RelianceBand, ToolQuery, TrajectoryPoint,
};
pub use noise::{BiasedNoise, CombinedNoise, DelayedNoise, NoiseModel, NoiseType, RandomNoise};
pub use planner::{HistoryRetention, PlannerStats, ToolPlanner, ToolQueryRecord};
pub use seed::{SeedStream, SimRng};
pub use types::{Action, Path, Position};
