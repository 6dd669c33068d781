//! Maze grids and the three procedural generators.
//!
//! A [`Maze`] is an immutable walkable/wall grid. Generators are selected
//! through the closed [`MazeGenerator`] enum and are fully determined by
//! `(width, height, seed)`.
//!
//! Generators make no reachability promise. The environment applies
//! [`Maze::with_connectivity_patch`], which carves a fixed diagonal
//! staircase from (0,0) to (N-1,N-1). Every environment maze therefore
//! contains that corridor regardless of generator.

use crate::error::ConfigError;
use crate::seed::SimRng;
use crate::types::Position;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Default wall probability for the uniform-random generator.
pub const DEFAULT_WALL_PROBABILITY: f64 = 0.4;

/// Two-cell carving moves used by both backtracking generators.
const CARVE_STEPS: [(isize, isize); 4] = [(-2, 0), (2, 0), (0, -2), (0, 2)];

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Walkable,
    Wall,
}

/// Immutable 2D grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Maze {
    /// A grid where every cell has the given state.
    pub fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; width * height],
        }
    }

    /// A wall-free grid.
    pub fn open(width: usize, height: usize) -> Self {
        Self::filled(width, height, Cell::Walkable)
    }

    /// Builds a maze from rows of `0` (walkable) / `1` (wall).
    ///
    /// Ragged input is truncated to the shortest row.
    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).min().unwrap_or(0);
        let cells = rows
            .iter()
            .flat_map(|row| row[..width].iter())
            .map(|&v| if v == 0 { Cell::Walkable } else { Cell::Wall })
            .collect();
        Self { width, height, cells }
    }

    /// Rows of `0` (walkable) / `1` (wall), the export format.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| u8::from(*c == Cell::Wall)).collect())
            .collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    /// Cell state; out-of-bounds reads as a wall.
    pub fn cell(&self, pos: Position) -> Cell {
        if self.in_bounds(pos) {
            self.cells[self.idx(pos)]
        } else {
            Cell::Wall
        }
    }

    /// In bounds and not a wall.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.cell(pos) == Cell::Walkable
    }

    /// Applies a unit delta and returns the target if it is walkable.
    pub fn step_from(&self, pos: Position, d_row: isize, d_col: isize) -> Option<Position> {
        pos.offset(d_row, d_col).filter(|p| self.is_walkable(*p))
    }

    /// Number of wall cells.
    pub fn wall_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Wall).count()
    }

    /// Returns a copy with the environment's reachability patch applied:
    /// both corners walkable, plus `(i, i)` for every `i` and `(i-1, i)` for
    /// every `i > 0` along the main diagonal.
    pub fn with_connectivity_patch(mut self) -> Self {
        if self.width == 0 || self.height == 0 {
            return self;
        }
        self.set(Position::new(0, 0), Cell::Walkable);
        self.set(Position::new(self.height - 1, self.width - 1), Cell::Walkable);

        let n = self.width.min(self.height);
        for i in 0..n {
            self.set(Position::new(i, i), Cell::Walkable);
            if i > 0 {
                self.set(Position::new(i - 1, i), Cell::Walkable);
            }
        }
        self
    }

    fn idx(&self, pos: Position) -> usize {
        pos.row * self.width + pos.col
    }

    fn set(&mut self, pos: Position, cell: Cell) {
        if self.in_bounds(pos) {
            let idx = self.idx(pos);
            self.cells[idx] = cell;
        }
    }

    fn carve_between(&mut self, from: Position, to: Position) {
        let mid = Position::new((from.row + to.row) / 2, (from.col + to.col) / 2);
        self.set(mid, Cell::Walkable);
        self.set(to, Cell::Walkable);
    }
}

impl std::fmt::Display for Maze {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                let ch = match cell {
                    Cell::Walkable => '.',
                    Cell::Wall => '#',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The generator family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MazeGenerator {
    /// Stack-based DFS carving two cells at a time; long corridors.
    CorridorDfs,
    /// Shuffled four-way recursion from each cell; balanced branching.
    RecursiveBacktracker,
    /// Independent walls with the given probability.
    UniformRandom { wall_probability: f64 },
}

impl MazeGenerator {
    /// Uniform-random generator with a validated wall probability.
    pub fn uniform_random(wall_probability: f64) -> Result<Self, ConfigError> {
        let wall_probability = ConfigError::check_probability("wall_probability", wall_probability)?;
        Ok(Self::UniformRandom { wall_probability })
    }

    pub fn name(&self) -> &'static str {
        match self {
            MazeGenerator::CorridorDfs => "corridor_dfs",
            MazeGenerator::RecursiveBacktracker => "recursive_backtracker",
            MazeGenerator::UniformRandom { .. } => "uniform_random",
        }
    }

    /// Generates a maze. Deterministic in `(width, height, seed)`.
    pub fn generate(&self, width: usize, height: usize, seed: u64) -> Maze {
        let mut rng = SimRng::seed_from_u64(seed);
        match *self {
            MazeGenerator::CorridorDfs => corridor_dfs(width, height, &mut rng),
            MazeGenerator::RecursiveBacktracker => recursive_backtracker(width, height, &mut rng),
            MazeGenerator::UniformRandom { wall_probability } => {
                uniform_random(width, height, wall_probability, &mut rng)
            }
        }
    }
}

fn carve_target(maze: &Maze, from: Position, (dr, dc): (isize, isize)) -> Option<Position> {
    from.offset(dr, dc).filter(|p| maze.in_bounds(*p))
}

fn corridor_dfs(width: usize, height: usize, rng: &mut SimRng) -> Maze {
    let mut maze = Maze::filled(width, height, Cell::Wall);
    if width == 0 || height == 0 {
        return maze;
    }

    let start = Position::new(0, 0);
    maze.set(start, Cell::Walkable);

    let mut visited = vec![false; width * height];
    visited[maze.idx(start)] = true;
    let mut stack = vec![start];

    while let Some(&current) = stack.last() {
        let candidates: Vec<Position> = CARVE_STEPS
            .iter()
            .filter_map(|&step| carve_target(&maze, current, step))
            .filter(|p| !visited[maze.idx(*p)])
            .collect();

        if candidates.is_empty() {
            stack.pop();
            continue;
        }

        let next = candidates[rng.gen_range(0..candidates.len())];
        maze.carve_between(current, next);
        visited[maze.idx(next)] = true;
        stack.push(next);
    }

    maze
}

/// One pending cell of the backtracker: its shuffled directions and how
/// many of them have been tried.
struct CarveFrame {
    pos: Position,
    directions: [(isize, isize); 4],
    next: usize,
}

impl CarveFrame {
    fn enter(maze: &mut Maze, pos: Position, rng: &mut SimRng) -> Self {
        maze.set(pos, Cell::Walkable);
        let mut directions = [(0, 2), (2, 0), (0, -2), (-2, 0)];
        directions.shuffle(rng);
        Self { pos, directions, next: 0 }
    }
}

fn recursive_backtracker(width: usize, height: usize, rng: &mut SimRng) -> Maze {
    let mut maze = Maze::filled(width, height, Cell::Wall);
    if width == 0 || height == 0 {
        return maze;
    }

    let mut frames = vec![CarveFrame::enter(&mut maze, Position::new(0, 0), rng)];

    while let Some(frame) = frames.last_mut() {
        if frame.next == frame.directions.len() {
            frames.pop();
            continue;
        }
        let step = frame.directions[frame.next];
        frame.next += 1;
        let from = frame.pos;

        if let Some(target) = carve_target(&maze, from, step) {
            if maze.cell(target) == Cell::Wall {
                maze.carve_between(from, target);
                let child = CarveFrame::enter(&mut maze, target, rng);
                frames.push(child);
            }
        }
    }

    maze
}

fn uniform_random(width: usize, height: usize, wall_probability: f64, rng: &mut SimRng) -> Maze {
    let cells = (0..width * height)
        .map(|_| {
            if rng.gen::<f64>() < wall_probability {
                Cell::Wall
            } else {
                Cell::Walkable
            }
        })
        .collect();
    Maze { width, height, cells }
}

/// Named difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MazeDifficulty {
    Easy,
    Medium,
    Hard,
}

impl MazeDifficulty {
    pub fn all() -> Vec<MazeDifficulty> {
        vec![MazeDifficulty::Easy, MazeDifficulty::Medium, MazeDifficulty::Hard]
    }

    pub fn name(&self) -> &'static str {
        match self {
            MazeDifficulty::Easy => "easy",
            MazeDifficulty::Medium => "medium",
            MazeDifficulty::Hard => "hard",
        }
    }

    /// Generator behind this preset.
    pub fn generator(&self) -> MazeGenerator {
        match self {
            MazeDifficulty::Easy => MazeGenerator::CorridorDfs,
            MazeDifficulty::Medium => MazeGenerator::RecursiveBacktracker,
            MazeDifficulty::Hard => MazeGenerator::UniformRandom {
                wall_probability: DEFAULT_WALL_PROBABILITY,
            },
        }
    }
}

impl std::fmt::Display for MazeDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for MazeDifficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(MazeDifficulty::Easy),
            "medium" => Ok(MazeDifficulty::Medium),
            "hard" => Ok(MazeDifficulty::Hard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::astar;
    use proptest::prelude::*;

    const GENERATORS: [MazeGenerator; 3] = [
        MazeGenerator::CorridorDfs,
        MazeGenerator::RecursiveBacktracker,
        MazeGenerator::UniformRandom { wall_probability: DEFAULT_WALL_PROBABILITY },
    ];

    #[test]
    fn test_generators_are_deterministic() {
        for generator in GENERATORS {
            let a = generator.generate(16, 16, 7);
            let b = generator.generate(16, 16, 7);
            assert_eq!(a, b, "{} not deterministic", generator.name());
        }
    }

    #[test]
    fn test_patched_corners_reachable_for_all_sizes() {
        for generator in GENERATORS {
            for n in [4usize, 8, 16, 32] {
                for seed in 0..5u64 {
                    let maze = generator.generate(n, n, seed).with_connectivity_patch();
                    let start = Position::new(0, 0);
                    let goal = Position::new(n - 1, n - 1);
                    assert!(maze.is_walkable(start));
                    assert!(maze.is_walkable(goal));
                    assert!(
                        astar(&maze, start, goal).is_some(),
                        "{} n={} seed={} unreachable",
                        generator.name(),
                        n,
                        seed
                    );
                }
            }
        }
    }

    #[test]
    fn test_patch_carves_diagonal_staircase() {
        let maze = Maze::filled(5, 5, Cell::Wall).with_connectivity_patch();
        for i in 0..5 {
            assert!(maze.is_walkable(Position::new(i, i)));
            if i > 0 {
                assert!(maze.is_walkable(Position::new(i - 1, i)));
            }
        }
        // 5 diagonal + 4 super-diagonal cells
        assert_eq!(maze.wall_count(), 25 - 9);
    }

    #[test]
    fn test_dfs_carves_only_even_cells_and_links() {
        let maze = MazeGenerator::CorridorDfs.generate(9, 9, 3);
        // Odd/odd cells are never carved by the two-step rule.
        for r in (1..9).step_by(2) {
            for c in (1..9).step_by(2) {
                assert_eq!(maze.cell(Position::new(r, c)), Cell::Wall);
            }
        }
        // On odd-sized grids every even/even cell is reached.
        for r in (0..9).step_by(2) {
            for c in (0..9).step_by(2) {
                assert!(maze.is_walkable(Position::new(r, c)));
            }
        }
    }

    #[test]
    fn test_backtracker_reaches_every_even_cell() {
        let maze = MazeGenerator::RecursiveBacktracker.generate(11, 11, 99);
        for r in (0..11).step_by(2) {
            for c in (0..11).step_by(2) {
                assert!(maze.is_walkable(Position::new(r, c)));
            }
        }
    }

    #[test]
    fn test_backtracker_handles_large_grid() {
        let maze = MazeGenerator::RecursiveBacktracker.generate(201, 201, 5);
        assert!(maze.is_walkable(Position::new(200, 200)));
    }

    #[test]
    fn test_uniform_random_extremes() {
        let open = MazeGenerator::UniformRandom { wall_probability: 0.0 }.generate(8, 8, 1);
        assert_eq!(open.wall_count(), 0);
        let solid = MazeGenerator::UniformRandom { wall_probability: 1.0 }.generate(8, 8, 1);
        assert_eq!(solid.wall_count(), 64);
    }

    #[test]
    fn test_uniform_random_rejects_bad_probability() {
        assert!(MazeGenerator::uniform_random(1.2).is_err());
        assert!(MazeGenerator::uniform_random(0.3).is_ok());
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("easy".parse::<MazeDifficulty>(), Ok(MazeDifficulty::Easy));
        assert_eq!("HARD".parse::<MazeDifficulty>(), Ok(MazeDifficulty::Hard));
        assert_eq!(
            "extreme".parse::<MazeDifficulty>(),
            Err(ConfigError::UnknownDifficulty("extreme".to_string()))
        );
    }

    #[test]
    fn test_rows_round_trip() {
        let rows = vec![vec![0, 1, 0], vec![1, 0, 0]];
        let maze = Maze::from_rows(&rows);
        assert_eq!(maze.width(), 3);
        assert_eq!(maze.height(), 2);
        assert_eq!(maze.to_rows(), rows);
        assert!(!maze.is_walkable(Position::new(0, 1)));
        assert!(!maze.is_walkable(Position::new(5, 5)));
    }

    proptest! {
        #[test]
        fn prop_patch_always_connects(seed in any::<u64>(), n in 2usize..24, which in 0usize..3) {
            let maze = GENERATORS[which].generate(n, n, seed).with_connectivity_patch();
            let path = astar(&maze, Position::new(0, 0), Position::new(n - 1, n - 1));
            prop_assert!(path.is_some());
        }
    }
}
