//! Transport task model.
//!
//! A task moves one package from a start point to an end point. The parsed
//! CSV row is kept as an immutable [`TaskRecord`]; the scheduler works on
//! [`Task`], which adds resolved positions, the derived pickup cell, and
//! runtime status.

use serde::{Deserialize, Serialize};

use super::Point;

/// Start-point column beyond which the pickup cell sits on the left side.
///
/// Start points on the right half of the map are entered from the left,
/// those on the left half from the right.
pub const PICKUP_SIDE_SPLIT_X: i32 = 10;

/// Task priority; affects ordering and scoring, not motion rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Regular task.
    #[default]
    Normal,
    /// Emergency task; preferred in dispatch order and scored against its
    /// deadline.
    High,
}

impl TaskPriority {
    /// Numeric rank for composite sorting (higher = more urgent).
    pub fn rank(self) -> i32 {
        match self {
            TaskPriority::Normal => 0,
            TaskPriority::High => 1,
        }
    }
}

/// An immutable task as parsed from the task CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier.
    pub id: String,
    /// Name of the originating start point.
    pub start_point: String,
    /// Name of the destination end point.
    pub end_point: String,
    /// Priority.
    pub priority: TaskPriority,
    /// Deadline in simulated seconds; `None` = no deadline.
    pub remaining_time: Option<u32>,
}

impl TaskRecord {
    /// Creates a normal-priority record without a deadline.
    pub fn new(
        id: impl Into<String>,
        start_point: impl Into<String>,
        end_point: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_point: start_point.into(),
            end_point: end_point.into(),
            priority: TaskPriority::Normal,
            remaining_time: None,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the deadline in seconds.
    pub fn with_remaining_time(mut self, seconds: u32) -> Self {
        self.remaining_time = Some(seconds);
        self
    }
}

/// Runtime status of a task. Transitions only move forward:
/// Pending → Running (at load) → Completed (at unload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not yet picked up.
    Pending,
    /// Loaded onto an AGV and in transit.
    Running,
    /// Delivered.
    Completed,
}

/// A task with resolved positions and runtime state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// The parsed record this task was built from.
    pub record: TaskRecord,
    /// Cell of the start point.
    pub start_position: Point,
    /// Cell of the end point.
    pub end_position: Point,
    /// Cell where loading happens; derived once from the start column.
    pub pickup_position: Point,
    /// Runtime status.
    pub status: TaskStatus,
    /// Index of the carrying AGV once loaded.
    pub assigned_agv: Option<usize>,
    /// Timestamp of the load.
    pub start_ts: Option<u32>,
    /// Timestamp of the unload.
    pub complete_ts: Option<u32>,
}

impl Task {
    /// Builds a runtime task, deriving the pickup cell: start points right
    /// of column [`PICKUP_SIDE_SPLIT_X`] are entered from the left, others
    /// from the right.
    pub fn new(record: TaskRecord, start_position: Point, end_position: Point) -> Self {
        let pickup_position = if start_position.x > PICKUP_SIDE_SPLIT_X {
            start_position.left()
        } else {
            start_position.right()
        };
        Self {
            record,
            start_position,
            end_position,
            pickup_position,
            status: TaskStatus::Pending,
            assigned_agv: None,
            start_ts: None,
            complete_ts: None,
        }
    }

    /// Whether the task is waiting for pickup.
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Whether the task is loaded and in transit.
    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    /// Whether the task has been delivered.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Marks the task loaded by the given AGV at `timestamp`.
    pub fn load_by(&mut self, agv: usize, timestamp: u32) {
        self.status = TaskStatus::Running;
        self.assigned_agv = Some(agv);
        self.start_ts = Some(timestamp);
    }

    /// Marks the task delivered at `timestamp`.
    pub fn unload(&mut self, timestamp: u32) {
        self.status = TaskStatus::Completed;
        self.complete_ts = Some(timestamp);
    }

    /// Seconds from load to unload, once completed.
    pub fn duration(&self) -> Option<u32> {
        match (self.start_ts, self.complete_ts) {
            (Some(start), Some(complete)) => Some(complete - start),
            _ => None,
        }
    }
}
