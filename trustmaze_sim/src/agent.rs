//! MazeAgent - drives one episode through a grid world.
//!
//! Each step the agent:
//! - flips a seeded coin to decide whether to ask the tool
//! - hands the suggestion (if any) to its strategy
//! - records the decision, the query and the resulting position

use crate::strategy::Strategy;

use rand::Rng;
use trustmaze_core::{
    oracle, ConfigError, DecisionRecord, GridWorld, Maze, Position, SimRng, ToolPlanner, ToolQuery,
    TrajectoryPoint,
};
use tracing::debug;

/// Everything recorded during one episode.
#[derive(Debug, Clone)]
pub struct EpisodeRecord {
    /// Goal reached before the step budget ran out
    pub success: bool,
    /// Initial position plus one point per step
    pub trajectory: Vec<TrajectoryPoint>,
    pub decisions: Vec<DecisionRecord>,
    pub tool_queries: Vec<ToolQuery>,
}

impl EpisodeRecord {
    pub fn steps(&self) -> usize {
        self.trajectory.len().saturating_sub(1)
    }
}

/// A navigating agent.
pub struct MazeAgent {
    /// Probability of querying the tool on a given step
    tool_query_frequency: f64,

    /// Agent-side randomness (query coin flips, strategy draws)
    rng: SimRng,
}

impl MazeAgent {
    /// Creates an agent. `tool_query_frequency` must lie in [0, 1].
    pub fn new(tool_query_frequency: f64, rng: SimRng) -> Result<Self, ConfigError> {
        let tool_query_frequency = ConfigError::check_probability("tool_query_frequency", tool_query_frequency)?;
        Ok(Self {
            tool_query_frequency,
            rng,
        })
    }

    /// Runs from the world's current state until it terminates or truncates.
    ///
    /// Without a planner the tool is never queried.
    pub fn run_episode(
        &mut self,
        world: &mut GridWorld,
        strategy: &mut Strategy,
        mut planner: Option<&mut ToolPlanner>,
    ) -> EpisodeRecord {
        let mut obs = world.observation();
        let mut record = EpisodeRecord {
            success: false,
            trajectory: vec![TrajectoryPoint {
                step: 0,
                position: obs.agent_pos,
                goal: obs.goal_pos,
            }],
            decisions: Vec::new(),
            tool_queries: Vec::new(),
        };

        loop {
            let step = record.decisions.len();
            let suggestion = match planner.as_deref_mut() {
                Some(planner) if self.rng.gen::<f64>() < self.tool_query_frequency => {
                    let suggestion = planner.plan(&obs.maze, obs.agent_pos, obs.goal_pos);
                    record.tool_queries.push(ToolQuery {
                        step,
                        position: obs.agent_pos,
                        was_helpful: was_helpful(&obs.maze, obs.agent_pos, obs.goal_pos, suggestion.as_deref()),
                        suggestion: suggestion.clone(),
                    });
                    suggestion
                }
                _ => None,
            };

            let decision = strategy.decide(
                &obs.maze,
                obs.agent_pos,
                obs.goal_pos,
                suggestion.as_deref(),
                &record.tool_queries,
                &mut self.rng,
            );

            record.decisions.push(DecisionRecord {
                step,
                action: decision.action,
                position: obs.agent_pos,
                goal: obs.goal_pos,
                used_tool: decision.used_tool,
                strategy: strategy.name().to_string(),
                reason: decision.reason,
                trust_level: decision.trust_level,
            });

            let outcome = world.step(decision.action);
            record.trajectory.push(TrajectoryPoint {
                step: step + 1,
                position: outcome.info.agent_pos,
                goal: outcome.info.goal_pos,
            });

            if outcome.is_done() {
                record.success = outcome.terminated;
                break;
            }
            obs = outcome.observation;
        }

        debug!(
            "Episode finished: success={} steps={} queries={}",
            record.success,
            record.steps(),
            record.tool_queries.len()
        );
        record
    }
}

/// A suggestion helps when its next cell is a neighbour strictly closer to
/// the goal along true shortest paths.
pub fn was_helpful(maze: &Maze, position: Position, goal: Position, suggestion: Option<&[Position]>) -> bool {
    let Some(&next) = suggestion.and_then(|s| s.get(1)) else {
        return false;
    };
    if !next.is_adjacent(position) || !maze.is_walkable(next) {
        return false;
    }
    match (
        oracle::shortest_distance(maze, position, goal),
        oracle::shortest_distance(maze, next, goal),
    ) {
        (Some(here), Some(there)) => there < here,
        _ => false,
    }
}
