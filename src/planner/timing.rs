//! Timing annotation for planned paths.
//!
//! Converts a bare waypoint sequence into timed waypoints: each point
//! carries the cumulative seconds needed to reach it from the path origin,
//! charging one second per move and one per heading change.

use crate::models::{Direction, NotAdjacentError, PathTimePoint, Point};

use super::astar::{MOVE_COST, TURN_COST};

/// Annotates `path` with cumulative arrival times given the heading held
/// at the origin.
///
/// The origin is emitted at time 0; every later waypoint adds
/// [`TURN_COST`] when the step changes heading, then [`MOVE_COST`]. An
/// empty path yields an empty annotation. Fails if any consecutive pair is
/// not adjacent.
pub fn compute_timing(
    path: &[Point],
    initial_heading: Direction,
) -> Result<Vec<PathTimePoint>, NotAdjacentError> {
    let mut first = match path.first() {
        Some(&point) => point,
        None => return Ok(Vec::new()),
    };

    let mut result = Vec::with_capacity(path.len());
    let mut elapsed: i32 = 0;
    let mut heading = initial_heading;
    result.push(PathTimePoint::new(first, elapsed));

    for &next in &path[1..] {
        let step_heading = first.heading_to(next)?;
        if step_heading != heading {
            elapsed += TURN_COST as i32;
            heading = step_heading;
        }
        elapsed += MOVE_COST as i32;
        result.push(PathTimePoint::new(next, elapsed));
        first = next;
    }

    Ok(result)
}
