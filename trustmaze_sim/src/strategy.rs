//! Heuristic decision strategies.
//!
//! | Strategy      | Uses the tool                                     |
//! |---------------|---------------------------------------------------|
//! | tool_trusting | Whenever it has a usable suggestion               |
//! | tool_avoiding | Never; greedy Manhattan descent                   |
//! | adaptive      | With probability `trust`, learned from helpfulness |

use rand::Rng;
use serde::{Deserialize, Serialize};
use trustmaze_core::{Action, ConfigError, Maze, Position, ToolQuery};

/// Trust the adaptive strategy starts each run with.
pub const DEFAULT_INITIAL_TRUST: f64 = 0.5;

/// Smoothing factor of the adaptive trust update.
const TRUST_ALPHA: f64 = 0.3;

/// How many recent tool queries the adaptive strategy looks at.
const TRUST_WINDOW: usize = 5;

/// Strategy identifiers accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ToolTrusting,
    ToolAvoiding,
    Adaptive,
}

impl StrategyKind {
    pub fn all() -> Vec<StrategyKind> {
        vec![StrategyKind::ToolTrusting, StrategyKind::ToolAvoiding, StrategyKind::Adaptive]
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::ToolTrusting => "tool_trusting",
            StrategyKind::ToolAvoiding => "tool_avoiding",
            StrategyKind::Adaptive => "adaptive",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "tool_trusting" | "trusting" => Ok(StrategyKind::ToolTrusting),
            "tool_avoiding" | "avoiding" => Ok(StrategyKind::ToolAvoiding),
            "adaptive" => Ok(StrategyKind::Adaptive),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Outcome of one decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub used_tool: bool,
    pub reason: String,
    pub trust_level: Option<f64>,
}

/// A decision strategy and its running state.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    ToolTrusting,
    ToolAvoiding,
    Adaptive { trust: f64 },
}

impl Strategy {
    /// Builds a strategy in its initial state.
    pub fn new(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::ToolTrusting => Strategy::ToolTrusting,
            StrategyKind::ToolAvoiding => Strategy::ToolAvoiding,
            StrategyKind::Adaptive => Strategy::Adaptive {
                trust: DEFAULT_INITIAL_TRUST,
            },
        }
    }

    /// Adaptive strategy with a custom starting trust.
    pub fn adaptive(initial_trust: f64) -> Result<Self, ConfigError> {
        let trust = ConfigError::check_probability("initial_trust", initial_trust)?;
        Ok(Strategy::Adaptive { trust })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::ToolTrusting => StrategyKind::ToolTrusting,
            Strategy::ToolAvoiding => StrategyKind::ToolAvoiding,
            Strategy::Adaptive { .. } => StrategyKind::Adaptive,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Current trust, for strategies that keep one.
    pub fn trust(&self) -> Option<f64> {
        match self {
            Strategy::Adaptive { trust } => Some(*trust),
            _ => None,
        }
    }

    /// Picks the next action.
    ///
    /// `history` holds this episode's tool queries, most recent last.
    pub fn decide<R: Rng + ?Sized>(
        &mut self,
        maze: &Maze,
        position: Position,
        goal: Position,
        suggestion: Option<&[Position]>,
        history: &[ToolQuery],
        rng: &mut R,
    ) -> Decision {
        match self {
            Strategy::ToolTrusting => match suggested_action(maze, position, suggestion) {
                Some(action) => Decision {
                    action,
                    used_tool: true,
                    reason: "following tool suggestion".to_string(),
                    trust_level: None,
                },
                None => Decision {
                    action: greedy_action(maze, position, goal),
                    used_tool: false,
                    reason: "no usable suggestion, moving greedily".to_string(),
                    trust_level: None,
                },
            },
            Strategy::ToolAvoiding => Decision {
                action: greedy_action(maze, position, goal),
                used_tool: false,
                reason: "independent navigation".to_string(),
                trust_level: None,
            },
            Strategy::Adaptive { trust } => {
                update_trust(trust, history);
                let use_tool = rng.gen::<f64>() < *trust;

                match suggested_action(maze, position, suggestion).filter(|_| use_tool) {
                    Some(action) => Decision {
                        action,
                        used_tool: true,
                        reason: format!("using tool (trust={:.2})", trust),
                        trust_level: Some(*trust),
                    },
                    None => Decision {
                        action: greedy_action(maze, position, goal),
                        used_tool: false,
                        reason: format!("moving greedily (trust={:.2})", trust),
                        trust_level: Some(*trust),
                    },
                }
            }
        }
    }
}

fn update_trust(trust: &mut f64, history: &[ToolQuery]) {
    if history.is_empty() {
        return;
    }
    let recent = &history[history.len().saturating_sub(TRUST_WINDOW)..];
    let helpful = recent.iter().filter(|q| q.was_helpful).count();
    let recent_trust = helpful as f64 / recent.len() as f64;
    *trust = (TRUST_ALPHA * recent_trust + (1.0 - TRUST_ALPHA) * *trust).clamp(0.0, 1.0);
}

/// The action that moves onto the suggestion's next cell, if that cell is a
/// walkable neighbour of `position`.
pub fn suggested_action(maze: &Maze, position: Position, suggestion: Option<&[Position]>) -> Option<Action> {
    let next = *suggestion?.get(1)?;
    if !maze.is_walkable(next) {
        return None;
    }
    Action::between(position, next)
}

/// Valid move minimising Manhattan distance to the goal; first in action
/// order on ties, `Up` when boxed in.
pub fn greedy_action(maze: &Maze, position: Position, goal: Position) -> Action {
    Action::ALL
        .into_iter()
        .filter_map(|action| {
            let (dr, dc) = action.delta();
            maze.step_from(position, dr, dc)
                .map(|next| (next.manhattan(goal), action))
        })
        .min_by_key(|(distance, action)| (*distance, action.index()))
        .map_or(Action::Up, |(_, action)| action)
}
