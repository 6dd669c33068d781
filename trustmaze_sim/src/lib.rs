//! TrustMaze Simulation Harness
//!
//! Runs heuristic agents against the deterministic substrate in
//! `trustmaze_core` and measures how much they lean on a noisy tool.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    RelianceStudy                       │
//! │   baseline ─┐      tool@0.0 ─┐      tool@0.2 ─┐  ...   │
//! │             ▼                ▼                ▼        │
//! │  ┌──────────────────────────────────────────────────┐  │
//! │  │ ExperimentRunner (one seeded episode at a time)  │  │
//! │  │   GridWorld ◄── MazeAgent ──► ToolPlanner        │  │
//! │  │                    │                             │  │
//! │  │                 Strategy                         │  │
//! │  └──────────────────────────────────────────────────┘  │
//! │             │                                          │
//! │        MetricsEngine ──► BRI rows ──► StudyExport      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use trustmaze_sim::{RelianceStudy, StudyConfig};
//!
//! let report = RelianceStudy::new(StudyConfig::default())?.run()?;
//! for row in &report.bri {
//!     println!("{} {:.3} {}", row.condition, row.bri, row.band);
//! }
//! ```

mod agent;
mod error;
mod exporter;
mod runner;
pub mod strategy;
mod study;

pub use agent::{was_helpful, EpisodeRecord, MazeAgent};
pub use error::SimError;
pub use exporter::{ConditionExport, StudyExport};
pub use runner::{experiment_id, ExperimentConfig, ExperimentResult, ExperimentRunner};
pub use strategy::{Strategy, StrategyKind};
pub use study::{condition_name, BriRow, ConditionResult, RelianceStudy, StudyConfig, StudyReport};
