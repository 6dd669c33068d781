//! The tool: oracle + optional noise, with an audited call history.

use crate::maze::Maze;
use crate::noise::NoiseModel;
use crate::oracle;
use crate::seed::SimRng;
use crate::types::{Path, Position};

use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// One audited tool call. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolQueryRecord {
    /// 1-based call number within this planner
    pub step: usize,
    pub start: Position,
    pub goal: Position,
    pub optimal_path: Path,
    pub returned_path: Path,
    /// Exact structural equality of returned and optimal paths
    pub is_optimal: bool,
    pub path_length: usize,
    pub optimal_length: usize,
}

/// How much call history the planner keeps.
///
/// Statistics are running totals and stay exact under either policy; only
/// the per-call audit trail is affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "capacity")]
pub enum HistoryRetention {
    /// Keep every record. Memory grows with the number of calls.
    #[default]
    Unbounded,
    /// Keep only the most recent `n` records.
    Bounded(usize),
}

/// Aggregate call statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlannerStats {
    /// Every call, including ones with no reachable goal
    pub total_calls: usize,
    pub optimal_count: usize,
    /// Calls that produced a suggestion
    pub recorded_calls: usize,
    /// `optimal_count / total_calls`
    pub optimal_rate: f64,
    /// Mean of `returned_len / optimal_len` over recorded calls
    pub avg_path_length_ratio: f64,
}

impl PlannerStats {
    /// Pools the statistics of two planners as if one had made every call.
    pub fn merge(&self, other: &PlannerStats) -> PlannerStats {
        let total_calls = self.total_calls + other.total_calls;
        let optimal_count = self.optimal_count + other.optimal_count;
        let recorded_calls = self.recorded_calls + other.recorded_calls;
        let ratio_sum = self.avg_path_length_ratio * self.recorded_calls as f64
            + other.avg_path_length_ratio * other.recorded_calls as f64;

        PlannerStats {
            total_calls,
            optimal_count,
            recorded_calls,
            optimal_rate: if total_calls > 0 {
                optimal_count as f64 / total_calls as f64
            } else {
                0.0
            },
            avg_path_length_ratio: if recorded_calls > 0 {
                ratio_sum / recorded_calls as f64
            } else {
                0.0
            },
        }
    }
}

/// The tool planner.
#[derive(Debug, Clone)]
pub struct ToolPlanner {
    noise: Option<NoiseModel>,
    rng: SimRng,
    retention: HistoryRetention,
    history: VecDeque<ToolQueryRecord>,
    total_calls: usize,
    recorded_calls: usize,
    optimal_count: usize,
    length_ratio_sum: f64,
}

impl ToolPlanner {
    /// Creates a planner whose noise draws come from a stream seeded with `seed`.
    pub fn new(noise: Option<NoiseModel>, seed: u64) -> Self {
        Self::with_rng(noise, SimRng::seed_from_u64(seed))
    }

    /// Creates a planner around an existing generator.
    pub fn with_rng(noise: Option<NoiseModel>, rng: SimRng) -> Self {
        Self {
            noise,
            rng,
            retention: HistoryRetention::default(),
            history: VecDeque::new(),
            total_calls: 0,
            recorded_calls: 0,
            optimal_count: 0,
            length_ratio_sum: 0.0,
        }
    }

    /// Sets the history retention policy.
    pub fn with_retention(mut self, retention: HistoryRetention) -> Self {
        self.retention = retention;
        self.enforce_retention();
        self
    }

    /// Suggests a path from `start` to `goal`.
    ///
    /// `None` when the oracle finds no path; the tool never invents a route
    /// to an unreachable cell, and such calls are not recorded.
    pub fn plan(&mut self, maze: &Maze, start: Position, goal: Position) -> Option<Path> {
        self.total_calls += 1;

        let Some(optimal) = oracle::astar(maze, start, goal) else {
            debug!("Tool call {}: no path {} -> {}", self.total_calls, start, goal);
            return None;
        };

        let returned = match self.noise.as_mut() {
            Some(noise) => noise.apply(&optimal, maze, &mut self.rng),
            None => optimal.clone(),
        };

        let is_optimal = returned == optimal;
        let record = ToolQueryRecord {
            step: self.total_calls,
            start,
            goal,
            path_length: returned.len(),
            optimal_length: optimal.len(),
            is_optimal,
            optimal_path: optimal,
            returned_path: returned.clone(),
        };

        self.recorded_calls += 1;
        if is_optimal {
            self.optimal_count += 1;
        }
        self.length_ratio_sum += record.path_length as f64 / record.optimal_length as f64;

        self.history.push_back(record);
        self.enforce_retention();

        Some(returned)
    }

    fn enforce_retention(&mut self) {
        if let HistoryRetention::Bounded(capacity) = self.retention {
            while self.history.len() > capacity {
                self.history.pop_front();
            }
        }
    }

    /// Retained call records, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ToolQueryRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls
    }

    pub fn noise(&self) -> Option<&NoiseModel> {
        self.noise.as_ref()
    }

    pub fn stats(&self) -> PlannerStats {
        PlannerStats {
            total_calls: self.total_calls,
            optimal_count: self.optimal_count,
            recorded_calls: self.recorded_calls,
            optimal_rate: if self.total_calls > 0 {
                self.optimal_count as f64 / self.total_calls as f64
            } else {
                0.0
            },
            avg_path_length_ratio: if self.recorded_calls > 0 {
                self.length_ratio_sum / self.recorded_calls as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{DelayedNoise, NoiseType, RandomNoise};
    use approx::assert_relative_eq;

    fn split_maze() -> Maze {
        let rows: Vec<Vec<u8>> = (0..6)
            .map(|_| (0..6).map(|c| u8::from(c == 3)).collect())
            .collect();
        Maze::from_rows(&rows)
    }

    #[test]
    fn test_noiseless_planner_is_oracle() {
        let maze = Maze::open(10, 10);
        let mut planner = ToolPlanner::new(None, 42);
        let path = planner.plan(&maze, Position::new(0, 0), Position::new(9, 9)).unwrap();
        assert_eq!(path.len(), 19);

        let stats = planner.stats();
        assert_eq!(stats.total_calls, 1);
        assert_eq!(stats.optimal_count, 1);
        assert_relative_eq!(stats.optimal_rate, 1.0);
        assert_relative_eq!(stats.avg_path_length_ratio, 1.0);
    }

    #[test]
    fn test_unreachable_returns_none_without_record() {
        let maze = split_maze();
        let noise = NoiseModel::Random(RandomNoise::new(1.0).unwrap());
        let mut planner = ToolPlanner::new(Some(noise), 42);
        assert!(planner.plan(&maze, Position::new(0, 0), Position::new(5, 5)).is_none());
        assert_eq!(planner.history_len(), 0);
        assert_eq!(planner.stats().total_calls, 1);
        assert_relative_eq!(planner.stats().optimal_rate, 0.0);
    }

    #[test]
    fn test_record_flags_structural_equality() {
        let maze = Maze::open(8, 8);
        let noise = NoiseModel::Random(RandomNoise::new(1.0).unwrap());
        let mut planner = ToolPlanner::new(Some(noise), 3);
        for _ in 0..10 {
            planner.plan(&maze, Position::new(0, 0), Position::new(7, 7));
        }
        for record in planner.history() {
            assert_eq!(record.is_optimal, record.returned_path == record.optimal_path);
            assert_eq!(record.path_length, record.returned_path.len());
            assert_eq!(record.optimal_length, 15);
            assert_eq!(record.returned_path[0], record.start);
        }
    }

    #[test]
    fn test_delayed_first_call_fresh_end_to_end() {
        let maze = Maze::open(10, 10);
        let noise = NoiseModel::Delayed(DelayedNoise::new(1.0, 3).unwrap());
        let mut planner = ToolPlanner::new(Some(noise), 42);
        let path = planner.plan(&maze, Position::new(0, 0), Position::new(9, 9)).unwrap();
        assert_eq!(path.len(), 19);
        assert!(planner.history().next().unwrap().is_optimal);
    }

    #[test]
    fn test_bounded_retention_keeps_stats_exact() {
        let maze = Maze::open(6, 6);
        let noise = NoiseModel::from_type(NoiseType::Random, 0.5).unwrap();
        let mut bounded = ToolPlanner::new(noise.clone(), 11).with_retention(HistoryRetention::Bounded(3));
        let mut unbounded = ToolPlanner::new(noise, 11);

        for _ in 0..20 {
            bounded.plan(&maze, Position::new(0, 0), Position::new(5, 5));
            unbounded.plan(&maze, Position::new(0, 0), Position::new(5, 5));
        }

        assert_eq!(bounded.history_len(), 3);
        assert_eq!(unbounded.history_len(), 20);
        assert_eq!(bounded.stats(), unbounded.stats());
        assert_eq!(bounded.history().next().unwrap().step, 18);
    }

    #[test]
    fn test_stats_on_fresh_planner() {
        let planner = ToolPlanner::new(None, 1);
        assert_eq!(planner.stats(), PlannerStats::default());
    }

    #[test]
    fn test_merge_pools_calls() {
        let maze = split_maze();
        let mut reachable = ToolPlanner::new(None, 1);
        reachable.plan(&maze, Position::new(0, 0), Position::new(5, 2));
        reachable.plan(&maze, Position::new(0, 0), Position::new(5, 0));
        let mut blocked = ToolPlanner::new(None, 1);
        blocked.plan(&maze, Position::new(0, 0), Position::new(5, 5));

        let merged = reachable.stats().merge(&blocked.stats());
        assert_eq!(merged.total_calls, 3);
        assert_eq!(merged.optimal_count, 2);
        assert_eq!(merged.recorded_calls, 2);
        assert_relative_eq!(merged.optimal_rate, 2.0 / 3.0);
        assert_relative_eq!(merged.avg_path_length_ratio, 1.0);

        assert_eq!(PlannerStats::default().merge(&PlannerStats::default()), PlannerStats::default());
    }

    #[test]
    fn test_length_ratio_tracks_truncation() {
        let maze = Maze::open(10, 10);
        let noise = NoiseModel::Delayed(DelayedNoise::new(0.0, 3).unwrap());
        let mut planner = ToolPlanner::new(Some(noise), 1);
        planner.plan(&maze, Position::new(0, 0), Position::new(9, 9));
        planner.plan(&maze, Position::new(0, 0), Position::new(9, 9));
        assert_relative_eq!(planner.stats().avg_path_length_ratio, 1.0);
    }
}
