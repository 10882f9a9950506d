//! AGV state machine.
//!
//! An AGV occupies exactly one cell, faces one of the four cardinal
//! headings, and carries at most one task. Within a single tick it either
//! stays, turns in place, or moves one cell along its heading — never more
//! than one of these. The planned path is a list of timed waypoints whose
//! remaining time costs shrink as the AGV spends seconds turning and
//! moving.

use serde::{Deserialize, Serialize};

use super::{Direction, Point, Task};

/// A waypoint annotated with the cumulative seconds needed to reach it
/// from the path origin, turn penalties included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTimePoint {
    /// Waypoint cell.
    pub position: Point,
    /// Cumulative seconds from the path origin.
    pub time_cost: i32,
}

impl PathTimePoint {
    /// Creates a timed waypoint.
    pub fn new(position: Point, time_cost: i32) -> Self {
        Self {
            position,
            time_cost,
        }
    }
}

/// An automated guided vehicle.
///
/// Back-references are arena indices: `loaded_task` indexes the context's
/// task vector, and the loaded task's `assigned_agv` indexes the AGV
/// vector. When a path is attached, `path[0].position` equals the current
/// position and consecutive waypoints are adjacent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agv {
    /// Vehicle name (e.g. `AGV07`).
    pub name: String,
    /// Current cell.
    pub position: Point,
    /// Current heading.
    pub heading: Direction,
    /// Index of the carried task, if loaded.
    pub loaded_task: Option<usize>,
    /// Planned timed path; `path[0]` is the current cell.
    pub path: Vec<PathTimePoint>,
}

impl Agv {
    /// Creates an idle AGV at the given pose.
    pub fn new(name: impl Into<String>, position: Point, heading: Direction) -> Self {
        Self {
            name: name.into(),
            position,
            heading,
            loaded_task: None,
            path: Vec::new(),
        }
    }

    /// Whether a task is on board.
    pub fn is_loaded(&self) -> bool {
        self.loaded_task.is_some()
    }

    /// Heading required for the next planned step, if any.
    pub fn next_step_heading(&self) -> Option<Direction> {
        if self.path.len() < 2 {
            return None;
        }
        self.position.heading_to(self.path[1].position).ok()
    }

    /// Whether the next planned step lies straight ahead.
    pub fn should_move(&self) -> bool {
        self.next_step_heading() == Some(self.heading)
    }

    /// Whether the AGV must rotate before it can take the next step.
    pub fn should_turn(&self) -> bool {
        matches!(self.next_step_heading(), Some(heading) if heading != self.heading)
    }

    /// Whether the carried task can be dropped here: loaded and standing
    /// next to the task's end point.
    pub fn can_unload(&self, tasks: &[Task]) -> bool {
        match self.loaded_task {
            Some(index) => self.position.is_neighbour(tasks[index].end_position),
            None => false,
        }
    }

    /// Rotates toward the next planned step and charges the spent second
    /// against every remaining waypoint.
    pub fn turn(&mut self) {
        if let Some(heading) = self.next_step_heading() {
            self.heading = heading;
            for point in self.path.iter_mut().skip(1) {
                point.time_cost -= 1;
            }
        }
    }

    /// Rotates to an explicitly chosen heading; the path is left untouched.
    pub fn turn_to(&mut self, heading: Direction) {
        self.heading = heading;
    }

    /// Advances one cell along the planned path, charging the spent second
    /// and dropping the consumed waypoint.
    pub fn move_step(&mut self) {
        if self.path.len() > 1 {
            self.position = self.path[1].position;
            for point in self.path.iter_mut() {
                point.time_cost -= 1;
            }
            self.path.remove(0);
        }
    }

    /// Takes the task with the given arena index on board. The caller
    /// marks the task itself via [`Task::load_by`].
    pub fn load(&mut self, task: usize) {
        self.loaded_task = Some(task);
    }

    /// Drops the carried task, clearing the planned path. Returns the task
    /// index so the caller can mark it via [`Task::unload`].
    pub fn unload(&mut self) -> Option<usize> {
        self.path.clear();
        self.loaded_task.take()
    }
}
