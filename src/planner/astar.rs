//! Oriented A* over `(position, heading)` states.
//!
//! # Algorithm
//!
//! Classic A* on a 4-connected grid, except that the search state carries
//! the heading: stepping in a direction other than the current heading
//! costs an extra turn second. The Manhattan distance stays admissible and
//! consistent under this cost model (every step costs at least one second
//! and changes the distance by at most one), so the first pop of the goal
//! position is optimal.
//!
//! Ties on `f = g + h` break by insertion order (an explicit sequence
//! counter), which keeps repeated plans over identical inputs identical.
//!
//! # Reference
//! Hart, Nilsson & Raphael (1968), "A Formal Basis for the Heuristic
//! Determination of Minimum Cost Paths"

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::models::{Direction, Point};

/// Seconds to advance one cell.
pub const MOVE_COST: u32 = 1;
/// Seconds to rotate to a different heading.
pub const TURN_COST: u32 = 1;
/// Default grid size (width, height); usable coordinates are `1..=size`.
pub const DEFAULT_GRID_SIZE: (i32, i32) = (21, 21);

/// A search-frontier entry. Ordered as a min-heap on `f`, then insertion
/// sequence, so `BinaryHeap::pop` yields the oldest lowest-`f` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrontierNode {
    f: u32,
    seq: u64,
    g: u32,
    position: Point,
    heading: Direction,
}

impl Ord for FrontierNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest-time path planner with turn penalties.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use agv_dispatch::models::{Direction, Point};
/// use agv_dispatch::planner::PathPlanner;
///
/// let planner = PathPlanner::new();
/// let path = planner.plan(
///     Point::new(1, 1),
///     Point::new(4, 1),
///     Direction::Right,
///     &HashSet::new(),
/// );
/// assert_eq!(path.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PathPlanner {
    grid_size: (i32, i32),
}

impl PathPlanner {
    /// Creates a planner over the default 21×21 grid.
    pub fn new() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
        }
    }

    /// Sets the grid size; usable coordinates are `1..=width` × `1..=height`.
    pub fn with_grid_size(mut self, width: i32, height: i32) -> Self {
        self.grid_size = (width, height);
        self
    }

    /// Plans a minimum-time path from `start` to `goal` given the initial
    /// heading and a set of blocked cells.
    ///
    /// Returns the waypoint sequence including both endpoints, `[start]`
    /// when `start == goal`, or an empty vector when the goal is
    /// unreachable. The returned path minimizes moves plus turns; among
    /// equal-cost paths the choice is fixed by the deterministic
    /// tie-break.
    pub fn plan(
        &self,
        start: Point,
        goal: Point,
        heading: Direction,
        obstacles: &HashSet<Point>,
    ) -> Vec<Point> {
        let (width, height) = self.grid_size;

        let mut frontier = BinaryHeap::new();
        let mut g_score: HashMap<(Point, Direction), u32> = HashMap::new();
        let mut parent: HashMap<(Point, Direction), (Point, Direction)> = HashMap::new();
        let mut closed: HashSet<(Point, Direction)> = HashSet::new();
        let mut seq: u64 = 0;

        g_score.insert((start, heading), 0);
        frontier.push(FrontierNode {
            f: start.manhattan(goal),
            seq,
            g: 0,
            position: start,
            heading,
        });

        while let Some(node) = frontier.pop() {
            if node.position == goal {
                return reconstruct(&parent, (node.position, node.heading));
            }

            let state = (node.position, node.heading);
            if !closed.insert(state) {
                continue;
            }

            for direction in Direction::ALL {
                let next = node.position.neighbour(direction);
                if next.x < 1
                    || next.x > width
                    || next.y < 1
                    || next.y > height
                    || obstacles.contains(&next)
                {
                    continue;
                }

                let next_state = (next, direction);
                if closed.contains(&next_state) {
                    continue;
                }

                let turn = if direction == node.heading { 0 } else { TURN_COST };
                let tentative = node.g + MOVE_COST + turn;
                if tentative < *g_score.get(&next_state).unwrap_or(&u32::MAX) {
                    g_score.insert(next_state, tentative);
                    parent.insert(next_state, state);
                    seq += 1;
                    frontier.push(FrontierNode {
                        f: tentative + next.manhattan(goal),
                        seq,
                        g: tentative,
                        position: next,
                        heading: direction,
                    });
                }
            }
        }

        Vec::new()
    }
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new()
    }
}

fn reconstruct(
    parent: &HashMap<(Point, Direction), (Point, Direction)>,
    mut state: (Point, Direction),
) -> Vec<Point> {
    let mut path = vec![state.0];
    while let Some(&previous) = parent.get(&state) {
        path.push(previous.0);
        state = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::compute_timing;

    fn obstacles(points: &[(i32, i32)]) -> HashSet<Point> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_straight_line() {
        let planner = PathPlanner::new();
        let path = planner.plan(
            Point::new(1, 1),
            Point::new(4, 1),
            Direction::Right,
            &HashSet::new(),
        );
        assert_eq!(
            path,
            vec![
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(3, 1),
                Point::new(4, 1)
            ]
        );
    }

    #[test]
    fn test_turn_cost_counted_once() {
        // Facing right at (1,1), reaching (1,3) takes one turn plus two
        // moves: total time 3 over a 3-point path.
        let planner = PathPlanner::new();
        let path = planner.plan(
            Point::new(1, 1),
            Point::new(1, 3),
            Direction::Right,
            &HashSet::new(),
        );
        assert_eq!(
            path,
            vec![Point::new(1, 1), Point::new(1, 2), Point::new(1, 3)]
        );

        let timed = compute_timing(&path, Direction::Right).unwrap();
        assert_eq!(timed.last().unwrap().time_cost, 3);
    }

    #[test]
    fn test_detour_around_obstacle() {
        // (2,1) blocked and the row below is outside the grid, so the only
        // minimal detour goes over the top: 4 moves and 3 turns.
        let planner = PathPlanner::new();
        let blocked = obstacles(&[(2, 1)]);
        let path = planner.plan(Point::new(1, 1), Point::new(3, 1), Direction::Right, &blocked);

        assert_eq!(path.first(), Some(&Point::new(1, 1)));
        assert_eq!(path.last(), Some(&Point::new(3, 1)));
        assert!(!path.contains(&Point::new(2, 1)));
        for pair in path.windows(2) {
            assert!(pair[0].is_neighbour(pair[1]));
        }

        let timed = compute_timing(&path, Direction::Right).unwrap();
        assert_eq!(timed.last().unwrap().time_cost, 7);
    }

    #[test]
    fn test_start_equals_goal() {
        let planner = PathPlanner::new();
        let path = planner.plan(
            Point::new(5, 5),
            Point::new(5, 5),
            Direction::Up,
            &HashSet::new(),
        );
        assert_eq!(path, vec![Point::new(5, 5)]);
    }

    #[test]
    fn test_unreachable_goal_is_empty() {
        let planner = PathPlanner::new();
        let blocked = obstacles(&[(4, 5), (6, 5), (5, 4), (5, 6)]);
        let path = planner.plan(Point::new(1, 1), Point::new(5, 5), Direction::Right, &blocked);
        assert!(path.is_empty());
    }

    #[test]
    fn test_goal_inside_obstacles_is_empty() {
        let planner = PathPlanner::new();
        let blocked = obstacles(&[(5, 5)]);
        let path = planner.plan(Point::new(1, 1), Point::new(5, 5), Direction::Right, &blocked);
        assert!(path.is_empty());
    }

    #[test]
    fn test_repeated_plans_agree_on_cost() {
        let planner = PathPlanner::new();
        let blocked = obstacles(&[(3, 3), (4, 4), (5, 2), (6, 6), (7, 3)]);
        let first = planner.plan(Point::new(1, 1), Point::new(9, 7), Direction::Up, &blocked);
        let second = planner.plan(Point::new(1, 1), Point::new(9, 7), Direction::Up, &blocked);

        let cost = |path: &[Point]| {
            compute_timing(path, Direction::Up)
                .unwrap()
                .last()
                .map(|p| p.time_cost)
                .unwrap_or(0)
        };
        assert_eq!(first, second);
        assert_eq!(cost(&first), cost(&second));
    }

    #[test]
    fn test_path_stays_legal_through_clutter() {
        let planner = PathPlanner::new();
        let blocked = obstacles(&[
            (2, 2),
            (3, 2),
            (4, 2),
            (4, 3),
            (6, 5),
            (6, 6),
            (7, 6),
            (9, 4),
            (10, 8),
            (12, 3),
        ]);
        let path = planner.plan(Point::new(1, 1), Point::new(14, 9), Direction::Up, &blocked);

        assert_eq!(path.first(), Some(&Point::new(1, 1)));
        assert_eq!(path.last(), Some(&Point::new(14, 9)));
        for point in &path {
            assert!(!blocked.contains(point));
            assert!(point.x >= 1 && point.x <= 21);
            assert!(point.y >= 1 && point.y <= 21);
        }
        for pair in path.windows(2) {
            assert!(pair[0].is_neighbour(pair[1]));
        }
    }

    #[test]
    fn test_respects_grid_size() {
        let planner = PathPlanner::new().with_grid_size(3, 3);
        // Goal outside the 3x3 grid is unreachable.
        let path = planner.plan(
            Point::new(1, 1),
            Point::new(5, 1),
            Direction::Right,
            &HashSet::new(),
        );
        assert!(path.is_empty());
    }
}
