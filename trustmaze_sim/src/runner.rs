//! Experiment runner - executes a batch of seeded episodes.

use crate::agent::{EpisodeRecord, MazeAgent};
use crate::error::SimError;
use crate::strategy::{Strategy, StrategyKind};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use trustmaze_core::seed::{derive_seed, episode_rng};
use trustmaze_core::{
    AggregateMetrics, ConfigError, ConvergenceSeries, EpisodeMetrics, GridWorld, GridWorldConfig,
    HistoryRetention, Maze, MazeDifficulty, MetricsEngine, NoiseModel, NoiseType, PlannerStats, SeedStream,
    ToolPlanner,
};
use uuid::Uuid;

/// Configuration for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Side length of every maze
    pub maze_size: usize,

    /// Generator preset
    pub difficulty: MazeDifficulty,

    /// Number of episodes to run
    pub num_episodes: usize,

    /// Decision strategy
    pub strategy: StrategyKind,

    /// Whether the agent has a tool at all
    pub use_tool: bool,

    /// Noise applied to tool suggestions
    pub noise_type: NoiseType,

    /// Noise level in [0, 1]
    pub noise_level: f64,

    /// Probability of querying the tool on a step
    pub tool_query_frequency: f64,

    /// Experiment seed; every episode stream derives from it
    pub seed: u64,

    /// Step budget per episode
    pub max_steps_per_episode: usize,

    /// Planner call history kept per episode
    pub history_retention: HistoryRetention,

    /// Window for the convergence series
    pub convergence_window: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            maze_size: 16,
            difficulty: MazeDifficulty::Medium,
            num_episodes: 10,
            strategy: StrategyKind::Adaptive,
            use_tool: true,
            noise_type: NoiseType::None,
            noise_level: 0.0,
            tool_query_frequency: 0.5,
            seed: 42,
            max_steps_per_episode: 500,
            history_retention: HistoryRetention::Unbounded,
            convergence_window: 10,
        }
    }
}

impl ExperimentConfig {
    /// Checks every parameter without running anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world_config(self.seed).validate()?;
        ConfigError::check_probability("noise_level", self.noise_level)?;
        ConfigError::check_probability("tool_query_frequency", self.tool_query_frequency)?;
        NoiseModel::from_type(self.noise_type, self.noise_level)?;
        Ok(())
    }

    fn world_config(&self, seed: u64) -> GridWorldConfig {
        GridWorldConfig {
            maze_size: self.maze_size,
            difficulty: self.difficulty,
            seed,
            max_steps: self.max_steps_per_episode,
            ..Default::default()
        }
    }
}

/// Results of one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// `exp_` followed by 8 hex digits, derived from the seed
    pub experiment_id: String,

    pub config: ExperimentConfig,

    /// Aggregate over every episode (absent for zero episodes)
    pub metrics: Option<AggregateMetrics>,

    /// Tool statistics pooled over every episode (absent without a tool)
    pub planner_stats: Option<PlannerStats>,

    /// Adaptive trust at the end of the last episode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_trust: Option<f64>,

    pub convergence: ConvergenceSeries,

    pub episodes: Vec<EpisodeMetrics>,
}

impl ExperimentResult {
    pub fn avg_stepwise_accuracy(&self) -> f64 {
        self.metrics.as_ref().map_or(0.0, |m| m.avg_stepwise_accuracy)
    }

    /// Tool queries per step, the call rate that enters BRI.
    pub fn avg_tool_usage_rate(&self) -> f64 {
        self.metrics.as_ref().map_or(0.0, |m| m.avg_tool_usage_rate)
    }
}

/// Deterministic experiment identifier.
pub fn experiment_id(seed: u64) -> String {
    let mut rng = episode_rng(seed, u64::MAX, SeedStream::Agent);
    let uuid = Uuid::from_bytes(rng.gen());
    format!("exp_{}", &uuid.simple().to_string()[..8])
}

/// Everything one episode leaves behind.
struct EpisodeRun {
    record: EpisodeRecord,
    maze: Arc<Maze>,
    optimal_steps: Option<usize>,
    planner_stats: Option<PlannerStats>,
    final_trust: Option<f64>,
}

/// Runs experiments.
pub struct ExperimentRunner {
    config: ExperimentConfig,
}

impl ExperimentRunner {
    /// Creates a runner, rejecting invalid configuration up front.
    pub fn new(config: ExperimentConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Runs one episode in isolation.
    ///
    /// World, planner, agent and strategy are all fresh and seeded from
    /// `(seed, episode)`, so adaptive trust starts from its initial value.
    fn run_single(&self, episode: usize) -> Result<EpisodeRun, SimError> {
        let config = &self.config;
        let index = episode as u64;
        let maze_seed = derive_seed(config.seed, index, SeedStream::Maze);
        let mut world = GridWorld::new(config.world_config(maze_seed))?;
        let optimal_steps = world.optimal_path().map(|p| p.len() - 1);

        let mut planner = if config.use_tool {
            let noise = NoiseModel::from_type(config.noise_type, config.noise_level)?;
            let rng = episode_rng(config.seed, index, SeedStream::Noise);
            Some(ToolPlanner::with_rng(noise, rng).with_retention(config.history_retention))
        } else {
            None
        };

        let mut strategy = Strategy::new(config.strategy);
        let mut agent = MazeAgent::new(
            config.tool_query_frequency,
            episode_rng(config.seed, index, SeedStream::Agent),
        )?;
        let record = agent.run_episode(&mut world, &mut strategy, planner.as_mut());

        Ok(EpisodeRun {
            record,
            maze: Arc::clone(world.maze()),
            optimal_steps,
            planner_stats: planner.as_ref().map(ToolPlanner::stats),
            final_trust: strategy.trust(),
        })
    }

    /// Runs every episode and returns the results.
    pub fn run(&self) -> Result<ExperimentResult, SimError> {
        let config = &self.config;
        let experiment_id = experiment_id(config.seed);
        info!(
            "Starting {} ({} episodes, {} {}x{}, strategy={}, tool={}, noise={}@{:.2}, seed={})",
            experiment_id,
            config.num_episodes,
            config.difficulty,
            config.maze_size,
            config.maze_size,
            config.strategy,
            config.use_tool,
            config.noise_type,
            config.noise_level,
            config.seed
        );

        let mut engine = MetricsEngine::new();
        let mut planner_stats = config.use_tool.then(PlannerStats::default);
        let mut final_trust = Strategy::new(config.strategy).trust();

        for episode in 0..config.num_episodes {
            let run = self.run_single(episode)?;

            let metrics = engine.add_episode(
                episode,
                &run.record.trajectory,
                &run.record.decisions,
                run.record.success,
                run.optimal_steps,
                &run.record.tool_queries,
                Some(&*run.maze),
            );

            if let (Some(total), Some(stats)) = (planner_stats.as_mut(), run.planner_stats.as_ref()) {
                *total = total.merge(stats);
            }
            final_trust = run.final_trust;

            debug!(
                "Episode {}/{}: success={} steps={} optimal={:?} queries={} stepwise={:.3}",
                episode + 1,
                config.num_episodes,
                metrics.success,
                metrics.total_steps,
                metrics.optimal_steps,
                metrics.tool_queries,
                metrics.stepwise_accuracy
            );
        }

        let metrics = engine.aggregate();
        if let Some(m) = &metrics {
            info!(
                "Finished {}: success_rate={:.2} avg_steps={:.1} stepwise={:.3}",
                experiment_id, m.success_rate, m.avg_steps, m.avg_stepwise_accuracy
            );
        }

        Ok(ExperimentResult {
            experiment_id,
            config: config.clone(),
            metrics,
            planner_stats,
            final_trust,
            convergence: engine.compute_convergence(config.convergence_window),
            episodes: engine.episodes().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_config() -> ExperimentConfig {
        ExperimentConfig {
            maze_size: 8,
            num_episodes: 4,
            max_steps_per_episode: 150,
            convergence_window: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad_level = ExperimentConfig {
            noise_type: NoiseType::Random,
            noise_level: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            ExperimentRunner::new(bad_level),
            Err(SimError::Config(ConfigError::ProbabilityOutOfRange { .. }))
        ));

        let tiny = ExperimentConfig {
            maze_size: 1,
            ..Default::default()
        };
        assert!(ExperimentRunner::new(tiny).is_err());

        let bad_frequency = ExperimentConfig {
            tool_query_frequency: -0.1,
            ..Default::default()
        };
        assert!(ExperimentRunner::new(bad_frequency).is_err());
    }

    #[test]
    fn test_experiment_id_is_deterministic() {
        let id = experiment_id(42);
        assert_eq!(id, experiment_id(42));
        assert_ne!(id, experiment_id(43));
        assert!(id.starts_with("exp_"));
        assert_eq!(id.len(), 12);
    }

    #[test]
    fn test_run_is_reproducible() {
        let runner = ExperimentRunner::new(ExperimentConfig {
            noise_type: NoiseType::Combined,
            noise_level: 0.4,
            ..small_config()
        })
        .unwrap();

        let a = runner.run().unwrap();
        let b = runner.run().unwrap();
        assert_eq!(a.experiment_id, b.experiment_id);
        assert_eq!(a.episodes, b.episodes);
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.planner_stats, b.planner_stats);
    }

    #[test]
    fn test_baseline_has_no_tool_activity() {
        let runner = ExperimentRunner::new(ExperimentConfig {
            use_tool: false,
            ..small_config()
        })
        .unwrap();
        let result = runner.run().unwrap();

        assert!(result.planner_stats.is_none());
        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.total_episodes, 4);
        assert_relative_eq!(metrics.avg_tool_queries, 0.0);
        assert_relative_eq!(metrics.avg_tool_following_rate, 0.0);
        assert!(result.episodes.iter().all(|e| e.maze.is_some()));
    }

    #[test]
    fn test_perfect_tool_trusting_agent_is_optimal() {
        let runner = ExperimentRunner::new(ExperimentConfig {
            strategy: StrategyKind::ToolTrusting,
            tool_query_frequency: 1.0,
            ..small_config()
        })
        .unwrap();
        let result = runner.run().unwrap();

        let metrics = result.metrics.unwrap();
        assert_relative_eq!(metrics.success_rate, 1.0);
        assert_relative_eq!(metrics.avg_steps_ratio, 1.0);
        assert_relative_eq!(metrics.avg_tool_accuracy, 1.0);

        let stats = result.planner_stats.unwrap();
        assert_relative_eq!(stats.optimal_rate, 1.0);
        assert_eq!(result.convergence.success_rate, vec![1.0; 3]);
    }

    #[test]
    fn test_zero_episodes_has_no_metrics() {
        let runner = ExperimentRunner::new(ExperimentConfig {
            num_episodes: 0,
            ..Default::default()
        })
        .unwrap();
        let result = runner.run().unwrap();
        assert!(result.metrics.is_none());
        assert!(result.episodes.is_empty());
        assert_relative_eq!(result.avg_stepwise_accuracy(), 0.0);
    }

    #[test]
    fn test_adaptive_trust_is_reported() {
        let runner = ExperimentRunner::new(small_config()).unwrap();
        let result = runner.run().unwrap();
        assert!(result.final_trust.is_some());
    }

    #[test]
    fn test_adaptive_trust_resets_every_episode() {
        let config = ExperimentConfig {
            noise_type: NoiseType::Random,
            noise_level: 0.5,
            tool_query_frequency: 1.0,
            ..small_config()
        };
        let runner = ExperimentRunner::new(config).unwrap();
        let result = runner.run().unwrap();

        // The last episode on its own matches the one inside the full run
        let last = runner.run_single(3).unwrap();
        let metrics = &result.episodes[3];
        assert_eq!(last.record.steps(), metrics.total_steps);
        assert_eq!(last.record.tool_queries.len(), metrics.tool_queries);
        assert_eq!(last.final_trust, result.final_trust);

        // First decision sees only its own query on top of the initial 0.5
        let first_query = &last.record.tool_queries[0];
        assert_eq!(first_query.step, 0);
        let recent = if first_query.was_helpful { 1.0 } else { 0.0 };
        let expected = 0.3 * recent + 0.7 * 0.5;
        assert_relative_eq!(last.record.decisions[0].trust_level.unwrap(), expected);
    }
}
