//! Per-tick trajectory log.
//!
//! The recorder appends one row per AGV per tick, in AGV order, starting
//! with a timestamp-0 snapshot taken at construction. The resulting log is
//! the ground truth for offline validation, scoring, and playback: a run
//! of `n` seconds with `k` AGVs produces exactly `(n + 1) * k` rows.

use serde::{Deserialize, Serialize};

use crate::models::{Agv, Direction, Task, TaskPriority};

/// One recorded AGV observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    /// Simulated second.
    pub timestamp: u32,
    /// AGV name.
    pub name: String,
    /// Cell x.
    pub x: i32,
    /// Cell y.
    pub y: i32,
    /// Heading at this second.
    pub heading: Direction,
    /// Whether a task was on board.
    pub loaded: bool,
    /// End-point name of the carried task; empty when idle.
    pub destination: String,
    /// Whether the carried task is High priority.
    pub emergency: bool,
    /// Identifier of the carried task; empty when idle.
    pub task_id: String,
}

/// Append-only trajectory log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrajectoryRecorder {
    rows: Vec<TrajectoryRow>,
}

impl TrajectoryRecorder {
    /// Creates a recorder and snapshots the fleet at timestamp 0.
    pub fn new(agvs: &[Agv], tasks: &[Task]) -> Self {
        let mut recorder = Self { rows: Vec::new() };
        recorder.record(0, agvs, tasks);
        recorder
    }

    /// Appends one row per AGV for the given second.
    pub fn record(&mut self, timestamp: u32, agvs: &[Agv], tasks: &[Task]) {
        for agv in agvs {
            let task = agv.loaded_task.map(|index| &tasks[index]);
            self.rows.push(TrajectoryRow {
                timestamp,
                name: agv.name.clone(),
                x: agv.position.x,
                y: agv.position.y,
                heading: agv.heading,
                loaded: agv.is_loaded(),
                destination: task.map(|t| t.record.end_point.clone()).unwrap_or_default(),
                emergency: task.is_some_and(|t| t.record.priority == TaskPriority::High),
                task_id: task.map(|t| t.record.id.clone()).unwrap_or_default(),
            });
        }
    }

    /// All recorded rows, in insertion order.
    pub fn rows(&self) -> &[TrajectoryRow] {
        &self.rows
    }

    /// Number of recorded rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
