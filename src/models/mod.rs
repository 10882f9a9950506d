//! Simulation domain models.
//!
//! Core data types for the AGV fleet: grid geometry, static map elements,
//! transport tasks, and the AGV state machine. Algorithms (path planning,
//! scheduling, validation) live in their own modules and operate on these
//! types.

mod agv;
mod geometry;
mod map;
mod task;

pub use agv::{Agv, PathTimePoint};
pub use geometry::{Direction, NotAdjacentError, Point, Rect};
pub use map::{map_bounds, MapElement, MapElementKind};
pub use task::{Task, TaskPriority, TaskRecord, TaskStatus, PICKUP_SIDE_SPLIT_X};
