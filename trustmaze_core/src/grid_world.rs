//! Grid-world environment: a deterministic state machine over one maze.

use crate::error::ConfigError;
use crate::maze::{Maze, MazeDifficulty};
use crate::oracle;
use crate::types::{Action, Path, Position};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Configuration for a grid world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridWorldConfig {
    /// Side length N of the square maze
    pub maze_size: usize,

    /// Generator preset
    pub difficulty: MazeDifficulty,

    /// Maze seed
    pub seed: u64,

    /// Step budget before truncation
    pub max_steps: usize,

    /// Reward on reaching the goal (overrides the move reward)
    pub reward_goal: f64,

    /// Reward for an accepted move
    pub reward_step: f64,

    /// Reward for a blocked move (wall or out of bounds)
    pub reward_invalid: f64,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self {
            maze_size: 16,
            difficulty: MazeDifficulty::Medium,
            seed: 42,
            max_steps: 500,
            reward_goal: 1.0,
            reward_step: -0.01,
            reward_invalid: -0.1,
        }
    }
}

impl GridWorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maze_size < 2 {
            return Err(ConfigError::InvalidMazeSize(self.maze_size));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::ZeroStepBudget);
        }
        Ok(())
    }
}

/// What the agent sees.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub agent_pos: Position,
    pub goal_pos: Position,
    pub maze: Arc<Maze>,
}

/// Auxiliary information returned alongside every observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub step_count: usize,
    pub agent_pos: Position,
    pub goal_pos: Position,
    /// Manhattan distance from agent to goal
    pub distance_to_goal: usize,
    /// Whether the last action was blocked
    pub invalid_move: bool,
}

/// Result of one `step`.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    /// Goal reached
    pub terminated: bool,
    /// Step budget exhausted without reaching the goal
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// The environment.
///
/// Start is always (0,0) and goal (N-1,N-1); the maze is patched so the two
/// are connected.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: GridWorldConfig,
    seed: u64,
    maze: Arc<Maze>,
    agent_pos: Position,
    goal_pos: Position,
    step_count: usize,
}

impl GridWorld {
    /// Builds the environment and generates its maze.
    pub fn new(config: GridWorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed;
        let maze = Arc::new(Self::generate_maze(&config, seed));
        let goal_pos = Position::new(config.maze_size - 1, config.maze_size - 1);

        Ok(Self {
            config,
            seed,
            maze,
            agent_pos: Position::new(0, 0),
            goal_pos,
            step_count: 0,
        })
    }

    fn generate_maze(config: &GridWorldConfig, seed: u64) -> Maze {
        let n = config.maze_size;
        config
            .difficulty
            .generator()
            .generate(n, n, seed)
            .with_connectivity_patch()
    }

    /// Resets the episode. A new seed regenerates the maze; without one the
    /// existing maze is kept.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, StepInfo) {
        if let Some(seed) = seed {
            self.seed = seed;
            self.maze = Arc::new(Self::generate_maze(&self.config, seed));
            debug!(
                "Regenerated {} maze {}x{} (seed={})",
                self.config.difficulty, self.config.maze_size, self.config.maze_size, seed
            );
        }

        self.agent_pos = Position::new(0, 0);
        self.goal_pos = Position::new(self.config.maze_size - 1, self.config.maze_size - 1);
        self.step_count = 0;

        (self.observation(), self.info(false))
    }

    /// Advances one step.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        self.step_count += 1;

        let (dr, dc) = action.delta();
        let (reward, invalid_move) = match self.maze.step_from(self.agent_pos, dr, dc) {
            Some(next) => {
                self.agent_pos = next;
                (self.config.reward_step, false)
            }
            None => (self.config.reward_invalid, true),
        };

        let terminated = self.agent_pos == self.goal_pos;
        let reward = if terminated { self.config.reward_goal } else { reward };
        let truncated = !terminated && self.step_count >= self.config.max_steps;

        StepOutcome {
            observation: self.observation(),
            reward,
            terminated,
            truncated,
            info: self.info(invalid_move),
        }
    }

    /// Steps with a raw action index in `0..=3`.
    pub fn step_index(&mut self, action: u8) -> Result<StepOutcome, ConfigError> {
        let action = Action::try_from(action)?;
        Ok(self.step(action))
    }

    /// Oracle path from the agent's current position to the goal.
    pub fn optimal_path(&self) -> Option<Path> {
        oracle::astar(&self.maze, self.agent_pos, self.goal_pos)
    }

    pub fn manhattan_distance(&self) -> usize {
        self.agent_pos.manhattan(self.goal_pos)
    }

    pub fn observation(&self) -> Observation {
        Observation {
            agent_pos: self.agent_pos,
            goal_pos: self.goal_pos,
            maze: Arc::clone(&self.maze),
        }
    }

    fn info(&self, invalid_move: bool) -> StepInfo {
        StepInfo {
            step_count: self.step_count,
            agent_pos: self.agent_pos,
            goal_pos: self.goal_pos,
            distance_to_goal: self.manhattan_distance(),
            invalid_move,
        }
    }

    pub fn maze(&self) -> &Arc<Maze> {
        &self.maze
    }

    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn agent_pos(&self) -> Position {
        self.agent_pos
    }

    pub fn goal_pos(&self) -> Position {
        self.goal_pos
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}
