//! Fleet scheduling.
//!
//! The scheduler advances simulated time one second per tick, driving the
//! whole fleet through a fixed phase order: unload, load, move loaded,
//! turn loaded, assign idle, move idle, park. Collision and deadlock
//! avoidance happen through per-tick obstacle augmentation rather than
//! reservations: every plan is recomputed each tick against the cells the
//! rest of the fleet occupies or is about to be boxed into.
//!
//! # Determinism
//!
//! Ties break by stable keys everywhere — list order for pending tasks,
//! iteration order for AGV selection, insertion order in the planner's
//! heap — so a run is reproducible from its inputs.

mod context;
mod engine;
mod score;

pub use context::{ContextError, SimContext, MIDDLE_ROW_Y};
pub use engine::{Scheduler, SchedulerError, MAX_TIMESTAMP};
pub use score::{RunKpi, DELIVERY_POINTS, LATE_PENALTY, ON_TIME_BONUS};
