//! Simulation context.
//!
//! The context owns every piece of mutable run state: the fleet, the task
//! arena, the static obstacle set, the map bounds, and the trajectory
//! recorder. Tests construct a fresh context per run; there is no process
//! global. It also implements the composite pending-task ordering the
//! scheduler dispatches by.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::{
    map_bounds, Agv, Direction, MapElement, MapElementKind, Point, Rect, Task, TaskPriority,
    TaskRecord,
};
use crate::trajectory::TrajectoryRecorder;

/// Row treated as the middle of the map; pickups on it are dispatched
/// after pickups off it.
pub const MIDDLE_ROW_Y: i32 = 10;

/// Error constructing a context from map and task data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A task references a start or end point missing from the map.
    #[error("map element not found: {kind:?} '{name}'")]
    UnknownElement {
        /// Kind the lookup searched for.
        kind: MapElementKind,
        /// Name that failed to resolve.
        name: String,
    },
}

/// All state of one simulation run.
#[derive(Debug, Clone)]
pub struct SimContext {
    /// The static map as parsed.
    pub map_elements: Vec<MapElement>,
    /// The task list as parsed, in file order.
    pub task_records: Vec<TaskRecord>,
    /// Runtime tasks, index-aligned with `task_records`.
    pub tasks: Vec<Task>,
    /// The fleet, in map order.
    pub agvs: Vec<Agv>,
    /// Start/end cells plus the boundary ring; never planned through.
    pub fixed_obstacles: HashSet<Point>,
    /// Bounds spanned by the map elements.
    pub bounds: Rect,
    /// Per-tick trajectory log.
    pub recorder: TrajectoryRecorder,
}

impl SimContext {
    /// Builds a context: resolves task endpoint names to cells, spawns the
    /// fleet from the map's AGV rows, and assembles the fixed obstacle set
    /// (every station cell plus a one-cell ring just outside the bounds,
    /// so the planner cannot escape the map).
    pub fn new(
        map_elements: Vec<MapElement>,
        task_records: Vec<TaskRecord>,
    ) -> Result<Self, ContextError> {
        let mut tasks = Vec::with_capacity(task_records.len());
        for record in &task_records {
            let start =
                position_of(&map_elements, MapElementKind::StartPoint, &record.start_point)?;
            let end = position_of(&map_elements, MapElementKind::EndPoint, &record.end_point)?;
            tasks.push(Task::new(record.clone(), start, end));
        }

        let agvs: Vec<Agv> = map_elements
            .iter()
            .filter(|element| element.kind == MapElementKind::Agv)
            .map(|element| {
                Agv::new(
                    element.name.clone(),
                    element.position,
                    element.heading.unwrap_or(Direction::Right),
                )
            })
            .collect();

        let mut fixed_obstacles: HashSet<Point> = map_elements
            .iter()
            .filter(|element| {
                matches!(
                    element.kind,
                    MapElementKind::StartPoint | MapElementKind::EndPoint
                )
            })
            .map(|element| element.position)
            .collect();

        let bounds = map_bounds(&map_elements);
        if !map_elements.is_empty() {
            for x in (bounds.left - 1)..=(bounds.right + 1) {
                fixed_obstacles.insert(Point::new(x, bounds.bottom - 1));
                fixed_obstacles.insert(Point::new(x, bounds.top + 1));
            }
            for y in (bounds.bottom - 1)..=(bounds.top + 1) {
                fixed_obstacles.insert(Point::new(bounds.left - 1, y));
                fixed_obstacles.insert(Point::new(bounds.right + 1, y));
            }
        }

        let recorder = TrajectoryRecorder::new(&agvs, &tasks);

        Ok(Self {
            map_elements,
            task_records,
            tasks,
            agvs,
            fixed_obstacles,
            bounds,
            recorder,
        })
    }

    /// Whether every task has been delivered.
    pub fn all_tasks_completed(&self) -> bool {
        self.tasks.iter().all(Task::is_completed)
    }

    /// Number of delivered tasks.
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_completed()).count()
    }

    /// Pending task indices in dispatch order.
    ///
    /// Composite key, recomputed on demand (never cached), ascending:
    ///
    /// 1. position within the task's start-point group, in list order
    ///    (FIFO per pickup station);
    /// 2. priority, High first;
    /// 3. groups containing any High task first;
    /// 4. larger groups first;
    /// 5. pickups off the middle row first.
    ///
    /// The sort is stable, so equal keys keep list order.
    pub fn sorted_pending_tasks(&self) -> Vec<usize> {
        let pending: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.is_pending())
            .map(|(index, _)| index)
            .collect();

        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for &index in &pending {
            groups
                .entry(self.tasks[index].record.start_point.as_str())
                .or_default()
                .push(index);
        }

        let mut sorted = pending;
        sorted.sort_by_key(|&index| {
            let task = &self.tasks[index];
            let group = &groups[task.record.start_point.as_str()];
            let sequence = group
                .iter()
                .position(|&member| member == index)
                .unwrap_or(usize::MAX);
            let group_has_high = group
                .iter()
                .any(|&member| self.tasks[member].record.priority == TaskPriority::High);
            (
                sequence,
                -task.record.priority.rank(),
                if group_has_high { -1 } else { 0 },
                -(group.len() as i64),
                if task.pickup_position.y != MIDDLE_ROW_Y {
                    0
                } else {
                    1
                },
            )
        });
        sorted
    }

    /// Loads a pending task onto an AGV, keeping both sides of the
    /// arena back-reference in step.
    pub fn load_agv(&mut self, agv: usize, task: usize, timestamp: u32) {
        self.agvs[agv].load(task);
        self.tasks[task].load_by(agv, timestamp);
    }

    /// Unloads the task carried by an AGV, marking it completed.
    pub fn unload_agv(&mut self, agv: usize, timestamp: u32) {
        if let Some(task) = self.agvs[agv].unload() {
            self.tasks[task].unload(timestamp);
        }
    }

    /// Appends the current fleet state to the trajectory log.
    pub fn record(&mut self, timestamp: u32) {
        let Self {
            agvs,
            tasks,
            recorder,
            ..
        } = self;
        recorder.record(timestamp, agvs, tasks);
    }
}

fn position_of(
    elements: &[MapElement],
    kind: MapElementKind,
    name: &str,
) -> Result<Point, ContextError> {
    elements
        .iter()
        .find(|element| element.kind == kind && element.name == name)
        .map(|element| element.position)
        .ok_or_else(|| ContextError::UnknownElement {
            kind,
            name: name.to_string(),
        })
}
