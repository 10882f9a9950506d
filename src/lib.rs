//! Time-stepped scheduling for a fleet of automated guided vehicles (AGVs)
//! on a discrete 2D warehouse grid.
//!
//! Given a static map (start points, end points, AGV initial poses) and a
//! queue of transport tasks, the simulation advances one second per tick:
//! idle AGVs are assigned tasks, routed with an oriented A* planner whose
//! cost model charges for turns, loaded at pickup cells, and unloaded at
//! drop cells, while per-tick obstacle augmentation keeps the fleet free of
//! collisions and cross-lock deadlocks. Every tick is recorded so a run can
//! be replayed, validated, and scored offline.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Point`, `Direction`, `Rect`,
//!   `MapElement`, `TaskRecord`, `Task`, `Agv`, `PathTimePoint`
//! - **`planner`**: Oriented A* over `(position, heading)` states plus the
//!   cumulative-second timing annotation
//! - **`scheduler`**: The per-tick orchestrator, its simulation context,
//!   and post-run KPIs
//! - **`trajectory`**: Append-only per-tick trajectory log
//! - **`validation`**: Independent oracle that checks a recorded run for
//!   physical and procedural legality
//! - **`io`**: CSV interfaces for maps, task lists, and trajectories
//!
//! # Architecture
//!
//! The core is single-threaded and step-synchronous: one `process()` call
//! is one simulated second, mutating a `SimContext` that owns all state.
//! Independent runs own independent contexts and may execute in parallel.

pub mod io;
pub mod models;
pub mod planner;
pub mod scheduler;
pub mod trajectory;
pub mod validation;

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::io::CsvError;
use crate::scheduler::{ContextError, RunKpi, Scheduler, SchedulerError, SimContext};

/// Error raised by the end-to-end [`run_simulation`] driver.
#[derive(Debug, Error)]
pub enum RunError {
    /// Map, task, or trajectory CSV could not be read or written.
    #[error(transparent)]
    Csv(#[from] CsvError),
    /// The map and task list do not form a consistent context.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The scheduler failed (deadlock cap exceeded).
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Loads a map and a task list, runs the scheduler to completion, writes
/// the recorded trajectory, and returns the run KPIs.
pub fn run_simulation(
    map_path: impl AsRef<Path>,
    task_path: impl AsRef<Path>,
    trajectory_path: impl AsRef<Path>,
) -> Result<RunKpi, RunError> {
    let map_elements = io::load_map_file(map_path)?;
    let task_records = io::load_task_file(task_path)?;

    let context = SimContext::new(map_elements, task_records)?;
    let mut scheduler = Scheduler::new(context);
    let final_timestamp = scheduler.process_to_complete()?;

    let context = scheduler.into_context();
    io::save_trajectory_file(trajectory_path, context.recorder.rows())?;

    let kpi = RunKpi::calculate(&context.tasks, final_timestamp);
    info!(
        completed = kpi.completed,
        score = kpi.score,
        seconds = final_timestamp,
        "simulation finished"
    );
    Ok(kpi)
}
