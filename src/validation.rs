//! Independent trajectory validation.
//!
//! Re-checks a recorded run against the map and task list without reusing
//! any scheduler state, so it can serve as a correctness oracle for the
//! simulation (or for any externally produced trajectory). Detects:
//! - Positions outside the map bounds
//! - Overspeed and diagonal motion between consecutive observations
//! - Moving while not facing the motion direction
//! - Heading changes on the same tick as a load or unload
//! - Two AGVs sharing a cell, or exchanging cells between ticks
//! - Loads away from a pickup cell, drops away from the declared
//!   destination
//! - Per-start-point delivery sequences that diverge from the task list
//! - More start points producing pickups than the task list contains

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{map_bounds, MapElement, MapElementKind, Point, TaskRecord};
use crate::trajectory::TrajectoryRow;

/// Start points whose pickup cell is their right neighbour; all other
/// start points load from the left.
const RIGHT_SIDE_PICKUPS: [&str; 3] = ["SP01", "SP02", "SP03"];

/// Validation outcome: `Ok(())` or every detected violation.
pub type ValidationOutcome = Result<(), Vec<TrajectoryViolation>>;

/// Categories of trajectory violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Position outside the map bounds.
    OutOfBounds,
    /// Moved farther than one cell per second.
    Overspeed,
    /// Moved along both axes between observations.
    DiagonalMove,
    /// Moved without facing the motion direction beforehand.
    MoveWhileTurning,
    /// Heading changed on the same tick as a load or unload.
    TurnWhileLoading,
    /// Two AGVs on the same cell at the same second.
    CellCollision,
    /// Two AGVs exchanged cells between consecutive seconds.
    SwapCollision,
    /// Load away from any pickup cell.
    IllegalPickup,
    /// Drop away from the declared destination.
    IllegalDelivery,
    /// Deliveries out of order for a start point.
    SequenceMismatch,
    /// Pickups observed at more start points than the task list uses.
    CoverageExceeded,
}

/// One detected violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrajectoryViolation {
    /// Violation category.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
    /// Second the violation was observed at, when row-local.
    pub timestamp: Option<u32>,
    /// AGV involved, when row-local.
    pub agv: Option<String>,
}

impl TrajectoryViolation {
    fn at(kind: ViolationKind, timestamp: u32, agv: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Some(timestamp),
            agv: Some(agv.to_string()),
        }
    }

    fn global(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: None,
            agv: None,
        }
    }
}

/// A pickup observed in the trajectory.
struct PickupEvent<'a> {
    timestamp: u32,
    start_point: &'a str,
    destination: &'a str,
}

/// Validates a recorded trajectory against the map and task list.
///
/// Pure over its inputs: groups rows by AGV (ordered by timestamp), runs
/// every check, and accumulates all violations instead of stopping at the
/// first.
pub fn validate_trajectory(
    map_elements: &[MapElement],
    task_records: &[TaskRecord],
    rows: &[TrajectoryRow],
) -> ValidationOutcome {
    let mut violations = Vec::new();
    let bounds = map_bounds(map_elements);

    // Pickup cell → start point name, per the station naming contract.
    let pickup_cells: HashMap<Point, &str> = map_elements
        .iter()
        .filter(|element| element.kind == MapElementKind::StartPoint)
        .map(|element| {
            let cell = if RIGHT_SIDE_PICKUPS.contains(&element.name.as_str()) {
                element.position.right()
            } else {
                element.position.left()
            };
            (cell, element.name.as_str())
        })
        .collect();

    let end_points: HashMap<&str, Point> = map_elements
        .iter()
        .filter(|element| element.kind == MapElementKind::EndPoint)
        .map(|element| (element.name.as_str(), element.position))
        .collect();

    // Group rows per AGV, first-seen order, each sorted by timestamp.
    let mut agv_order: Vec<&str> = Vec::new();
    let mut per_agv: HashMap<&str, Vec<&TrajectoryRow>> = HashMap::new();
    for row in rows {
        let entry = per_agv.entry(row.name.as_str()).or_default();
        if entry.is_empty() {
            agv_order.push(row.name.as_str());
        }
        entry.push(row);
    }
    for track in per_agv.values_mut() {
        track.sort_by_key(|row| row.timestamp);
    }

    for row in rows {
        if !bounds.contains(Point::new(row.x, row.y)) {
            violations.push(TrajectoryViolation::at(
                ViolationKind::OutOfBounds,
                row.timestamp,
                &row.name,
                format!("position ({}, {}) outside map bounds", row.x, row.y),
            ));
        }
    }

    let mut pickups: Vec<PickupEvent<'_>> = Vec::new();

    for &name in &agv_order {
        let track = &per_agv[name];
        for pair in track.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let from = Point::new(prev.x, prev.y);
            let to = Point::new(curr.x, curr.y);
            let dt = curr.timestamp - prev.timestamp;
            let dx = (curr.x - prev.x).abs();
            let dy = (curr.y - prev.y).abs();

            if (dx + dy) as u32 > dt {
                violations.push(TrajectoryViolation::at(
                    ViolationKind::Overspeed,
                    curr.timestamp,
                    name,
                    format!("moved {} cells in {dt}s", dx + dy),
                ));
            }
            if dx != 0 && dy != 0 {
                violations.push(TrajectoryViolation::at(
                    ViolationKind::DiagonalMove,
                    curr.timestamp,
                    name,
                    format!("diagonal motion from {from} to {to}"),
                ));
            }

            // Moving requires facing the motion direction already on the
            // previous observation.
            if from != to && from.is_neighbour(to) {
                if let Ok(direction) = from.heading_to(to) {
                    if prev.heading != direction {
                        violations.push(TrajectoryViolation::at(
                            ViolationKind::MoveWhileTurning,
                            curr.timestamp,
                            name,
                            format!(
                                "moved {direction:?} while facing {:?}",
                                prev.heading
                            ),
                        ));
                    }
                }
            }

            if prev.heading != curr.heading && prev.loaded != curr.loaded {
                violations.push(TrajectoryViolation::at(
                    ViolationKind::TurnWhileLoading,
                    curr.timestamp,
                    name,
                    "heading changed on the same tick as a load/unload",
                ));
            }

            if !prev.loaded && curr.loaded {
                match pickup_cells.get(&to) {
                    Some(&start_point) => pickups.push(PickupEvent {
                        timestamp: curr.timestamp,
                        start_point,
                        destination: curr.destination.as_str(),
                    }),
                    None => violations.push(TrajectoryViolation::at(
                        ViolationKind::IllegalPickup,
                        curr.timestamp,
                        name,
                        format!("loaded at {to}, which is not a pickup cell"),
                    )),
                }
            }

            if prev.loaded && !curr.loaded {
                match end_points.get(prev.destination.as_str()) {
                    Some(&end) if to.is_neighbour(end) && bounds.contains(to) => {}
                    Some(_) => violations.push(TrajectoryViolation::at(
                        ViolationKind::IllegalDelivery,
                        curr.timestamp,
                        name,
                        format!(
                            "unloaded at {to}, not adjacent to destination '{}'",
                            prev.destination
                        ),
                    )),
                    None => violations.push(TrajectoryViolation::at(
                        ViolationKind::IllegalDelivery,
                        curr.timestamp,
                        name,
                        format!("unloaded for unknown destination '{}'", prev.destination),
                    )),
                }
            }
        }
    }

    check_collisions(rows, &mut violations);
    check_sequences(task_records, &mut pickups, &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Same-cell and swap collisions across the whole fleet.
fn check_collisions(rows: &[TrajectoryRow], violations: &mut Vec<TrajectoryViolation>) {
    let mut by_timestamp: BTreeMap<u32, Vec<&TrajectoryRow>> = BTreeMap::new();
    for row in rows {
        by_timestamp.entry(row.timestamp).or_default().push(row);
    }

    for (&timestamp, cohort) in &by_timestamp {
        let mut seen: HashMap<Point, &str> = HashMap::new();
        for row in cohort {
            let cell = Point::new(row.x, row.y);
            if let Some(other) = seen.insert(cell, row.name.as_str()) {
                violations.push(TrajectoryViolation::at(
                    ViolationKind::CellCollision,
                    timestamp,
                    &row.name,
                    format!("shares {cell} with {other}"),
                ));
            }
        }
    }

    let mut position_at: HashMap<(&str, u32), Point> = HashMap::new();
    for row in rows {
        position_at.insert((row.name.as_str(), row.timestamp), Point::new(row.x, row.y));
    }

    let timestamps: Vec<u32> = by_timestamp.keys().copied().collect();
    for pair in timestamps.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        let cohort = &by_timestamp[&after];
        for (index, first) in cohort.iter().enumerate() {
            for second in &cohort[index + 1..] {
                let a = first.name.as_str();
                let b = second.name.as_str();
                let (Some(&a0), Some(&a1), Some(&b0), Some(&b1)) = (
                    position_at.get(&(a, before)),
                    position_at.get(&(a, after)),
                    position_at.get(&(b, before)),
                    position_at.get(&(b, after)),
                ) else {
                    continue;
                };
                if a0 == b1 && a1 == b0 && a0 != a1 {
                    violations.push(TrajectoryViolation::at(
                        ViolationKind::SwapCollision,
                        after,
                        a,
                        format!("swapped cells with {b} between {before}s and {after}s"),
                    ));
                }
            }
        }
    }
}

/// Per-start-point delivery order and overall pickup coverage.
fn check_sequences(
    task_records: &[TaskRecord],
    pickups: &mut [PickupEvent<'_>],
    violations: &mut Vec<TrajectoryViolation>,
) {
    pickups.sort_by_key(|event| event.timestamp);

    let mut expected: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in task_records {
        expected
            .entry(record.start_point.as_str())
            .or_default()
            .push(record.end_point.as_str());
    }

    let mut observed: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut observed_order: Vec<&str> = Vec::new();
    for event in pickups.iter() {
        let entry = observed.entry(event.start_point).or_default();
        if entry.is_empty() {
            observed_order.push(event.start_point);
        }
        entry.push(event.destination);
    }

    for start_point in &observed_order {
        let seen = &observed[start_point];
        match expected.get(start_point) {
            Some(planned) if planned == seen => {}
            Some(planned) => violations.push(TrajectoryViolation::global(
                ViolationKind::SequenceMismatch,
                format!(
                    "start point '{start_point}': observed deliveries {seen:?} do not match task list {planned:?}"
                ),
            )),
            None => violations.push(TrajectoryViolation::global(
                ViolationKind::SequenceMismatch,
                format!("start point '{start_point}' has pickups but no tasks"),
            )),
        }
    }

    let expected_starts: HashSet<&str> = task_records
        .iter()
        .map(|record| record.start_point.as_str())
        .collect();
    if observed_order.len() > expected_starts.len() {
        violations.push(TrajectoryViolation::global(
            ViolationKind::CoverageExceeded,
            format!(
                "pickups at {} start points, task list uses {}",
                observed_order.len(),
                expected_starts.len()
            ),
        ));
    }
}
