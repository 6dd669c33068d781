//! Ground-truth shortest paths.
//!
//! A* over the 4-connected grid with the Manhattan heuristic. The open set
//! is ordered by `(f, insertion counter)` so equal-cost ties always resolve
//! the same way, and neighbours expand in action order (up, down, left,
//! right). Everything the tool says is measured against this.

use crate::maze::Maze;
use crate::types::{Action, Path, Position};

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Shortest walkable path from `start` to `goal`, both inclusive.
///
/// Returns `None` if either endpoint is a wall or out of bounds, or if no
/// walkable path connects them.
pub fn astar(maze: &Maze, start: Position, goal: Position) -> Option<Path> {
    if !maze.is_walkable(start) || !maze.is_walkable(goal) {
        return None;
    }

    let width = maze.width();
    let idx = |p: Position| p.row * width + p.col;
    let cell_count = width * maze.height();

    let mut g_score: Vec<Option<usize>> = vec![None; cell_count];
    let mut came_from: Vec<Option<Position>> = vec![None; cell_count];
    let mut in_open = vec![false; cell_count];

    let mut counter: u64 = 0;
    let mut open = BinaryHeap::new();
    open.push(Reverse((start.manhattan(goal), counter, start)));
    counter += 1;
    g_score[idx(start)] = Some(0);
    in_open[idx(start)] = true;

    while let Some(Reverse((_, _, current))) = open.pop() {
        in_open[idx(current)] = false;

        if current == goal {
            return Some(reconstruct(&came_from, width, current));
        }

        // Every popped cell has a g-score: it was set before the push.
        let Some(g_current) = g_score[idx(current)] else {
            continue;
        };
        let tentative = g_current + 1;

        for action in Action::ALL {
            let (dr, dc) = action.delta();
            let Some(neighbor) = maze.step_from(current, dr, dc) else {
                continue;
            };
            let n = idx(neighbor);

            if g_score[n].map_or(true, |g| tentative < g) {
                came_from[n] = Some(current);
                g_score[n] = Some(tentative);

                if !in_open[n] {
                    open.push(Reverse((tentative + neighbor.manhattan(goal), counter, neighbor)));
                    counter += 1;
                    in_open[n] = true;
                }
            }
        }
    }

    None
}

fn reconstruct(came_from: &[Option<Position>], width: usize, goal: Position) -> Path {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = came_from[current.row * width + current.col] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Number of moves on the shortest path, if one exists.
pub fn shortest_distance(maze: &Maze, start: Position, goal: Position) -> Option<usize> {
    astar(maze, start, goal).map(|p| p.len() - 1)
}

/// True if every cell is walkable and consecutive cells are 4-neighbours.
pub fn is_valid_path(maze: &Maze, path: &[Position]) -> bool {
    path.iter().all(|p| maze.is_walkable(*p))
        && path.windows(2).all(|w| w[0].is_adjacent(w[1]))
}
