//! Oriented path planning.
//!
//! Shortest-time routing over the warehouse grid. The search state is
//! `(position, heading)` so that heading changes can be charged a turn
//! penalty; the companion timing pass annotates a finished path with
//! cumulative arrival seconds.
//!
//! # Cost Model
//!
//! One second per cell moved, one second per heading change, loading and
//! unloading handled by the scheduler outside the planner.

mod astar;
mod timing;

pub use astar::{PathPlanner, DEFAULT_GRID_SIZE, MOVE_COST, TURN_COST};
pub use timing::compute_timing;
