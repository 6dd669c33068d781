//! Metrics Engine
//! ==============
//!
//! Per-episode summaries, population aggregates, and the Blind Reliance
//! Index (BRI):
//!
//! ```text
//! BRI = CR × (BSA − TSA) / (BSA − TA)        clamped to ≥ 0
//!
//!   CR   call rate              tool queries per step in the tooled run
//!   BSA  baseline step accuracy stepwise accuracy without the tool
//!   TSA  tooled step accuracy   stepwise accuracy with the tool
//!   TA   tool accuracy          1 − noise level
//! ```
//!
//! | BRI        | Band                     |
//! |------------|--------------------------|
//! | < 0.2      | robust to noise          |
//! | < 0.5      | adaptive learner         |
//! | < 0.8      | over-reliant             |
//! | ≥ 0.8      | maximally over-reliant   |

use crate::maze::Maze;
use crate::types::{Action, Path, Position};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Denominators smaller than this make BRI undefined; it is reported as 0.
pub const BRI_EPSILON: f64 = 0.001;

// =============================================================================
// EPISODE INPUTS
// =============================================================================

/// One point of an episode trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub step: usize,
    pub position: Position,
    pub goal: Position,
}

impl TrajectoryPoint {
    pub fn distance_to_goal(&self) -> usize {
        self.position.manhattan(self.goal)
    }
}

/// One decision made by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub step: usize,
    pub action: Action,
    pub position: Position,
    pub goal: Position,
    pub used_tool: bool,
    pub strategy: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<f64>,
}

/// One tool query issued during an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolQuery {
    pub step: usize,
    pub position: Position,
    pub suggestion: Option<Path>,
    /// Suggested next cell is adjacent and strictly closer to the goal
    pub was_helpful: bool,
}

// =============================================================================
// EPISODE METRICS
// =============================================================================

/// Scalar summary of one finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    pub episode_id: usize,
    pub success: bool,
    pub total_steps: usize,
    /// Oracle path length in moves, when known
    pub optimal_steps: Option<usize>,
    /// `total_steps / optimal_steps`
    pub steps_ratio: Option<f64>,
    pub tool_queries: usize,
    pub tool_usage_rate: f64,
    pub tool_accuracy_rate: f64,
    /// `optimal_steps / total_steps`
    pub path_optimality: f64,
    pub tool_following_rate: f64,
    pub stepwise_accuracy: f64,
    pub final_distance: usize,
    /// Maze as rows of 0 (walkable) / 1 (wall)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maze: Option<Vec<Vec<u8>>>,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Fraction of transitions whose distance to the goal strictly decreased.
pub fn stepwise_accuracy(trajectory: &[TrajectoryPoint]) -> f64 {
    let closer = trajectory
        .windows(2)
        .filter(|w| w[1].distance_to_goal() < w[0].distance_to_goal())
        .count();
    ratio(closer, trajectory.len().saturating_sub(1))
}

impl EpisodeMetrics {
    /// Summarises one episode.
    pub fn compute(
        episode_id: usize,
        trajectory: &[TrajectoryPoint],
        decisions: &[DecisionRecord],
        success: bool,
        optimal_steps: Option<usize>,
        tool_queries: &[ToolQuery],
        maze: Option<&Maze>,
    ) -> Self {
        let total_steps = trajectory.len().saturating_sub(1);
        let query_count = tool_queries.len();
        let helpful = tool_queries.iter().filter(|q| q.was_helpful).count();
        let followed = decisions.iter().filter(|d| d.used_tool).count();

        let known_optimal = optimal_steps.filter(|&n| n > 0);
        let steps_ratio = known_optimal.map(|n| total_steps as f64 / n as f64);
        let path_optimality = known_optimal.map_or(0.0, |n| ratio(n, total_steps));

        Self {
            episode_id,
            success,
            total_steps,
            optimal_steps,
            steps_ratio,
            tool_queries: query_count,
            tool_usage_rate: ratio(query_count, total_steps),
            tool_accuracy_rate: ratio(helpful, query_count),
            path_optimality,
            tool_following_rate: ratio(followed, decisions.len()),
            stepwise_accuracy: stepwise_accuracy(trajectory),
            final_distance: trajectory.last().map_or(0, TrajectoryPoint::distance_to_goal),
            maze: maze.map(Maze::to_rows),
        }
    }
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// Population statistics over every recorded episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_episodes: usize,
    pub success_rate: f64,
    pub successful_episodes: usize,
    pub failed_episodes: usize,
    pub avg_steps: f64,
    pub median_steps: f64,
    pub std_steps: f64,
    pub min_steps: usize,
    pub max_steps: usize,
    pub avg_path_optimality: f64,
    pub median_path_optimality: f64,
    pub avg_steps_ratio: f64,
    pub avg_stepwise_accuracy: f64,
    pub median_stepwise_accuracy: f64,
    pub avg_tool_queries: f64,
    pub avg_tool_usage_rate: f64,
    pub avg_tool_accuracy: f64,
    pub avg_tool_following_rate: f64,
    pub avg_final_distance: f64,
    pub median_final_distance: f64,
}

impl AggregateMetrics {
    /// Flat name → value view.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_episodes", self.total_episodes as f64),
            ("success_rate", self.success_rate),
            ("successful_episodes", self.successful_episodes as f64),
            ("failed_episodes", self.failed_episodes as f64),
            ("avg_steps", self.avg_steps),
            ("median_steps", self.median_steps),
            ("std_steps", self.std_steps),
            ("min_steps", self.min_steps as f64),
            ("max_steps", self.max_steps as f64),
            ("avg_path_optimality", self.avg_path_optimality),
            ("median_path_optimality", self.median_path_optimality),
            ("avg_steps_ratio", self.avg_steps_ratio),
            ("avg_stepwise_accuracy", self.avg_stepwise_accuracy),
            ("median_stepwise_accuracy", self.median_stepwise_accuracy),
            ("avg_tool_queries", self.avg_tool_queries),
            ("avg_tool_usage_rate", self.avg_tool_usage_rate),
            ("avg_tool_accuracy", self.avg_tool_accuracy),
            ("avg_tool_following_rate", self.avg_tool_following_rate),
            ("avg_final_distance", self.avg_final_distance),
            ("median_final_distance", self.median_final_distance),
        ])
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Rolling-window series over episodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceSeries {
    pub success_rate: Vec<f64>,
    pub avg_steps: Vec<f64>,
    pub tool_usage_rate: Vec<f64>,
}

impl ConvergenceSeries {
    pub fn is_empty(&self) -> bool {
        self.success_rate.is_empty()
    }
}

/// Collects episode summaries and derives statistics on demand.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    episodes: Vec<EpisodeMetrics>,
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarises and stores one episode.
    #[allow(clippy::too_many_arguments)]
    pub fn add_episode(
        &mut self,
        episode_id: usize,
        trajectory: &[TrajectoryPoint],
        decisions: &[DecisionRecord],
        success: bool,
        optimal_steps: Option<usize>,
        tool_queries: &[ToolQuery],
        maze: Option<&Maze>,
    ) -> EpisodeMetrics {
        let metrics = EpisodeMetrics::compute(
            episode_id,
            trajectory,
            decisions,
            success,
            optimal_steps,
            tool_queries,
            maze,
        );
        self.episodes.push(metrics.clone());
        metrics
    }

    pub fn episodes(&self) -> &[EpisodeMetrics] {
        &self.episodes
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    fn column(&self, f: impl Fn(&EpisodeMetrics) -> f64) -> Vec<f64> {
        self.episodes.iter().map(f).collect()
    }

    /// `None` until at least one episode has been added.
    pub fn aggregate(&self) -> Option<AggregateMetrics> {
        if self.episodes.is_empty() {
            return None;
        }

        let steps = self.column(|m| m.total_steps as f64);
        let optimality = self.column(|m| m.path_optimality);
        let stepwise = self.column(|m| m.stepwise_accuracy);
        let final_distance = self.column(|m| m.final_distance as f64);
        let steps_ratios: Vec<f64> = self.episodes.iter().filter_map(|m| m.steps_ratio).collect();
        let successful = self.episodes.iter().filter(|m| m.success).count();
        let total = self.episodes.len();

        Some(AggregateMetrics {
            total_episodes: total,
            success_rate: ratio(successful, total),
            successful_episodes: successful,
            failed_episodes: total - successful,
            avg_steps: mean(&steps),
            median_steps: median(&steps),
            std_steps: std_dev(&steps),
            min_steps: self.episodes.iter().map(|m| m.total_steps).min().unwrap_or(0),
            max_steps: self.episodes.iter().map(|m| m.total_steps).max().unwrap_or(0),
            avg_path_optimality: mean(&optimality),
            median_path_optimality: median(&optimality),
            avg_steps_ratio: mean(&steps_ratios),
            avg_stepwise_accuracy: mean(&stepwise),
            median_stepwise_accuracy: median(&stepwise),
            avg_tool_queries: mean(&self.column(|m| m.tool_queries as f64)),
            avg_tool_usage_rate: mean(&self.column(|m| m.tool_usage_rate)),
            avg_tool_accuracy: mean(&self.column(|m| m.tool_accuracy_rate)),
            avg_tool_following_rate: mean(&self.column(|m| m.tool_following_rate)),
            avg_final_distance: mean(&final_distance),
            median_final_distance: median(&final_distance),
        })
    }

    /// BRI of the recorded (tooled) episodes against a baseline.
    ///
    /// CR and TSA come from this engine's aggregate; 0 when it is empty.
    pub fn bri(&self, baseline_stepwise_accuracy: f64, tool_accuracy: f64) -> f64 {
        match self.aggregate() {
            Some(agg) => blind_reliance_index(
                agg.avg_tool_usage_rate,
                baseline_stepwise_accuracy,
                agg.avg_stepwise_accuracy,
                tool_accuracy,
            ),
            None => 0.0,
        }
    }

    /// Means over every full window of `window` consecutive episodes.
    ///
    /// Empty when fewer than `window` episodes exist or `window` is 0.
    pub fn compute_convergence(&self, window: usize) -> ConvergenceSeries {
        let mut series = ConvergenceSeries::default();
        if window == 0 {
            return series;
        }

        for chunk in self.episodes.windows(window) {
            let n = chunk.len() as f64;
            series
                .success_rate
                .push(chunk.iter().filter(|m| m.success).count() as f64 / n);
            series
                .avg_steps
                .push(chunk.iter().map(|m| m.total_steps as f64).sum::<f64>() / n);
            series
                .tool_usage_rate
                .push(chunk.iter().map(|m| m.tool_usage_rate).sum::<f64>() / n);
        }
        series
    }
}

// =============================================================================
// BLIND RELIANCE INDEX
// =============================================================================

/// `CR × (BSA − TSA) / (BSA − TA)`, clamped to ≥ 0.
///
/// Returns 0 when `|BSA − TA| < BRI_EPSILON`. Finite for finite inputs.
pub fn blind_reliance_index(
    call_rate: f64,
    baseline_stepwise_accuracy: f64,
    tooled_stepwise_accuracy: f64,
    tool_accuracy: f64,
) -> f64 {
    let denominator = baseline_stepwise_accuracy - tool_accuracy;
    if denominator.abs() < BRI_EPSILON {
        return 0.0;
    }
    let bri = call_rate * (baseline_stepwise_accuracy - tooled_stepwise_accuracy) / denominator;
    bri.max(0.0)
}

/// Tool accuracy implied by a noise level.
pub fn tool_accuracy_from_noise(noise_level: f64) -> f64 {
    1.0 - noise_level
}

/// Interpretation band for a BRI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelianceBand {
    RobustToNoise,
    AdaptiveLearner,
    OverReliant,
    MaximallyOverReliant,
}

impl RelianceBand {
    pub fn classify(bri: f64) -> Self {
        if bri < 0.2 {
            RelianceBand::RobustToNoise
        } else if bri < 0.5 {
            RelianceBand::AdaptiveLearner
        } else if bri < 0.8 {
            RelianceBand::OverReliant
        } else {
            RelianceBand::MaximallyOverReliant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelianceBand::RobustToNoise => "robust to noise",
            RelianceBand::AdaptiveLearner => "adaptive learner",
            RelianceBand::OverReliant => "over-reliant",
            RelianceBand::MaximallyOverReliant => "maximally over-reliant",
        }
    }
}

impl fmt::Display for RelianceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(step: usize, row: usize, col: usize) -> TrajectoryPoint {
        TrajectoryPoint {
            step,
            position: Position::new(row, col),
            goal: Position::new(4, 4),
        }
    }

    fn decision(step: usize, used_tool: bool) -> DecisionRecord {
        DecisionRecord {
            step,
            action: Action::Right,
            position: Position::new(0, 0),
            goal: Position::new(4, 4),
            used_tool,
            strategy: "test".to_string(),
            reason: String::new(),
            trust_level: None,
        }
    }

    fn query(step: usize, was_helpful: bool) -> ToolQuery {
        ToolQuery {
            step,
            position: Position::new(0, 0),
            suggestion: None,
            was_helpful,
        }
    }

    fn episode(id: usize, success: bool, steps: usize) -> EpisodeMetrics {
        let trajectory: Vec<_> = (0..=steps).map(|s| point(s, 0, 0)).collect();
        EpisodeMetrics::compute(id, &trajectory, &[], success, Some(8), &[], None)
    }

    #[test]
    fn test_stepwise_accuracy_extremes() {
        let closer: Vec<_> = (0..5).map(|i| point(i, 0, i)).collect();
        assert_relative_eq!(stepwise_accuracy(&closer), 1.0);

        let farther: Vec<_> = (0..5).rev().map(|i| point(4 - i, 0, i)).collect();
        assert_relative_eq!(stepwise_accuracy(&farther), 0.0);

        let standing: Vec<_> = (0..5).map(|i| point(i, 0, 0)).collect();
        assert_relative_eq!(stepwise_accuracy(&standing), 0.0);

        assert_relative_eq!(stepwise_accuracy(&[point(0, 0, 0)]), 0.0);
        assert_relative_eq!(stepwise_accuracy(&[]), 0.0);
    }

    #[test]
    fn test_episode_metrics_rates() {
        let trajectory: Vec<_> = (0..5).map(|i| point(i, 0, i)).collect();
        let decisions = vec![decision(0, true), decision(1, false), decision(2, true), decision(3, true)];
        let queries = vec![query(0, true), query(2, false)];

        let m = EpisodeMetrics::compute(3, &trajectory, &decisions, false, Some(8), &queries, None);
        assert_eq!(m.episode_id, 3);
        assert_eq!(m.total_steps, 4);
        assert_eq!(m.tool_queries, 2);
        assert_relative_eq!(m.tool_usage_rate, 0.5);
        assert_relative_eq!(m.tool_accuracy_rate, 0.5);
        assert_relative_eq!(m.tool_following_rate, 0.75);
        assert_relative_eq!(m.steps_ratio.unwrap(), 0.5);
        assert_relative_eq!(m.path_optimality, 2.0);
        assert_eq!(m.final_distance, 4);
    }

    #[test]
    fn test_empty_episode_is_all_zero() {
        let m = EpisodeMetrics::compute(0, &[], &[], false, None, &[], None);
        assert_eq!(m.total_steps, 0);
        assert_eq!(m.final_distance, 0);
        assert_eq!(m.steps_ratio, None);
        assert_relative_eq!(m.tool_usage_rate, 0.0);
        assert_relative_eq!(m.tool_accuracy_rate, 0.0);
        assert_relative_eq!(m.tool_following_rate, 0.0);
        assert_relative_eq!(m.path_optimality, 0.0);
        assert_relative_eq!(m.stepwise_accuracy, 0.0);
    }

    #[test]
    fn test_zero_optimal_length_has_no_ratio() {
        let trajectory: Vec<_> = (0..3).map(|i| point(i, 0, i)).collect();
        let m = EpisodeMetrics::compute(0, &trajectory, &[], true, Some(0), &[], None);
        assert_eq!(m.steps_ratio, None);
        assert_relative_eq!(m.path_optimality, 0.0);
    }

    #[test]
    fn test_maze_rows_are_kept() {
        let maze = Maze::from_rows(&[vec![0, 1], vec![0, 0]]);
        let m = EpisodeMetrics::compute(0, &[], &[], false, None, &[], Some(&maze));
        assert_eq!(m.maze, Some(vec![vec![0, 1], vec![0, 0]]));
    }

    #[test]
    fn test_empty_engine_has_no_aggregate() {
        let engine = MetricsEngine::new();
        assert!(engine.aggregate().is_none());
        assert_relative_eq!(engine.bri(0.8, 0.5), 0.0);
    }

    #[test]
    fn test_aggregate_population_stats() {
        let mut engine = MetricsEngine::new();
        for (i, (success, steps)) in [(true, 2usize), (true, 4), (false, 6), (false, 8)].into_iter().enumerate() {
            let trajectory: Vec<_> = (0..=steps).map(|s| point(s, 0, 0)).collect();
            engine.add_episode(i, &trajectory, &[], success, Some(8), &[], None);
        }

        let agg = engine.aggregate().unwrap();
        assert_eq!(agg.total_episodes, 4);
        assert_eq!(agg.successful_episodes, 2);
        assert_eq!(agg.failed_episodes, 2);
        assert_relative_eq!(agg.success_rate, 0.5);
        assert_relative_eq!(agg.avg_steps, 5.0);
        assert_relative_eq!(agg.median_steps, 5.0);
        assert_relative_eq!(agg.std_steps, 5.0_f64.sqrt());
        assert_eq!(agg.min_steps, 2);
        assert_eq!(agg.max_steps, 8);
        assert_relative_eq!(agg.avg_steps_ratio, 0.625);

        let map = agg.to_map();
        assert_eq!(map.len(), 20);
        assert_relative_eq!(map["success_rate"], 0.5);
        assert_relative_eq!(map["max_steps"], 8.0);
    }

    #[test]
    fn test_episode_metrics_serialize_flat() {
        let trajectory: Vec<_> = (0..3).map(|i| point(i, 0, i)).collect();
        let m = EpisodeMetrics::compute(1, &trajectory, &[], false, None, &[query(1, true)], None);
        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["total_steps"], 2);
        assert_eq!(value["tool_accuracy_rate"], 1.0);
        assert!(value["steps_ratio"].is_null());
        assert!(value.get("maze").is_none());
    }

    #[test]
    fn test_median_odd_count() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_bri_zero_cases() {
        // Tool no worse than baseline
        assert_relative_eq!(blind_reliance_index(1.0, 0.8, 0.8, 0.5), 0.0);
        // Never called
        assert_relative_eq!(blind_reliance_index(0.0, 0.8, 0.3, 0.5), 0.0);
        // Degenerate denominator
        assert_relative_eq!(blind_reliance_index(1.0, 0.5, 0.1, 0.5), 0.0);
        assert_relative_eq!(blind_reliance_index(1.0, 0.5, 0.1, 0.5009), 0.0);
        // Tooled accuracy improved: negative raw value is clamped
        assert_relative_eq!(blind_reliance_index(1.0, 0.6, 0.9, 0.2), 0.0);
    }

    #[test]
    fn test_bri_full_reliance() {
        // Agent degrades exactly to tool accuracy while calling every step
        assert_relative_eq!(blind_reliance_index(1.0, 0.8, 0.5, 0.5), 1.0);
        assert_relative_eq!(blind_reliance_index(0.5, 0.8, 0.5, 0.5), 0.5);
    }

    #[test]
    fn test_bri_is_finite() {
        for cr in [0.0, 0.3, 1.0] {
            for bsa in [0.0, 0.25, 0.5, 1.0] {
                for tsa in [0.0, 0.5, 1.0] {
                    for ta in [0.0, 0.5, 0.9995, 1.0] {
                        let bri = blind_reliance_index(cr, bsa, tsa, ta);
                        assert!(bri.is_finite() && bri >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_engine_bri_uses_aggregate() {
        let mut engine = MetricsEngine::new();
        let trajectory: Vec<_> = (0..5).map(|i| point(i, 0, i)).collect();
        let decisions = vec![decision(0, true), decision(1, true)];
        engine.add_episode(0, &trajectory, &decisions, true, Some(8), &[], None);
        // CR = 0 (no queries), TSA = 1
        assert_relative_eq!(engine.bri(0.5, 0.2), 0.0);
        assert_relative_eq!(engine.bri(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_engine_bri_counts_calls_not_follows() {
        let mut engine = MetricsEngine::new();
        // closer, farther, closer, farther -> TSA = 0.5
        let trajectory = vec![point(0, 0, 0), point(1, 0, 1), point(2, 0, 0), point(3, 0, 1), point(4, 0, 0)];
        let decisions: Vec<_> = (0..4).map(|s| decision(s, false)).collect();
        let queries: Vec<_> = (0..4).map(|s| query(s, false)).collect();
        let m = engine.add_episode(0, &trajectory, &decisions, false, Some(8), &queries, None);
        assert_relative_eq!(m.tool_usage_rate, 1.0);
        assert_relative_eq!(m.tool_following_rate, 0.0);
        assert_relative_eq!(m.stepwise_accuracy, 0.5);

        // 1.0 × (0.8 − 0.5) / (0.8 − 0.5)
        assert_relative_eq!(engine.bri(0.8, 0.5), 1.0);
    }

    #[test]
    fn test_bands() {
        assert_eq!(RelianceBand::classify(0.0), RelianceBand::RobustToNoise);
        assert_eq!(RelianceBand::classify(0.2), RelianceBand::AdaptiveLearner);
        assert_eq!(RelianceBand::classify(0.5), RelianceBand::OverReliant);
        assert_eq!(RelianceBand::classify(0.8), RelianceBand::MaximallyOverReliant);
        assert_eq!(RelianceBand::classify(3.0).to_string(), "maximally over-reliant");
    }

    #[test]
    fn test_tool_accuracy_from_noise() {
        assert_relative_eq!(tool_accuracy_from_noise(0.3), 0.7);
        assert_relative_eq!(tool_accuracy_from_noise(0.0), 1.0);
    }

    #[test]
    fn test_convergence_windows() {
        let mut engine = MetricsEngine::new();
        assert!(engine.compute_convergence(3).is_empty());

        for (i, (success, steps)) in [(false, 10usize), (false, 8), (true, 6), (true, 4)].into_iter().enumerate() {
            engine.episodes.push(episode(i, success, steps));
        }

        let series = engine.compute_convergence(2);
        assert_eq!(series.success_rate, vec![0.0, 0.5, 1.0]);
        assert_eq!(series.avg_steps, vec![9.0, 7.0, 5.0]);
        assert_eq!(series.tool_usage_rate.len(), 3);

        assert!(engine.compute_convergence(5).is_empty());
        assert!(engine.compute_convergence(0).is_empty());
    }
}
