//! The per-tick scheduling engine.
//!
//! # Algorithm
//!
//! One `process()` call is one simulated second. The phase order encodes
//! the priority policy and is mandatory:
//!
//! 1. Unload AGVs standing next to their destination.
//! 2. Load idle AGVs standing on a pending task's pickup cell.
//! 3. Move loaded AGVs, batched with cross-lock avoidance.
//! 4. Turn loaded AGVs whose next step is off-heading.
//! 5. Tentatively assign pending tasks to idle AGVs (cheapest timed path
//!    wins, first in iteration order on ties).
//! 6. Turn and move the tentatively assigned AGVs.
//! 7. With no pending tasks left, park remaining idle AGVs toward the map
//!    edge so they cannot box in the deliveries still running.
//! 8. Record the tick.
//!
//! Each AGV is touched at most once per tick (the `handled` set). Paths
//! are re-planned from scratch every tick against that instant's obstacle
//! picture; an empty plan simply leaves the AGV in place for a second.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::models::{Direction, NotAdjacentError, Point};
use crate::planner::{compute_timing, PathPlanner};

use super::context::SimContext;

/// Hard cap on simulated seconds; exceeding it means the fleet is stuck.
pub const MAX_TIMESTAMP: u32 = 400;

/// Scheduling failure.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The run did not finish within [`MAX_TIMESTAMP`] simulated seconds.
    #[error("failed to complete all tasks within {limit}s")]
    DeadlockTimeout {
        /// The exceeded cap.
        limit: u32,
    },
    /// A planned path was corrupt (non-adjacent waypoints).
    #[error(transparent)]
    NotAdjacent(#[from] NotAdjacentError),
}

/// Time-stepped fleet scheduler. Owns the simulation context and advances
/// it one second per [`process`](Scheduler::process) call.
#[derive(Debug)]
pub struct Scheduler {
    context: SimContext,
    planner: PathPlanner,
    timestamp: u32,
}

impl Scheduler {
    /// Creates a scheduler at timestamp 0.
    pub fn new(context: SimContext) -> Self {
        Self {
            context,
            planner: PathPlanner::new(),
            timestamp: 0,
        }
    }

    /// Current simulated second.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Read access to the simulation state.
    pub fn context(&self) -> &SimContext {
        &self.context
    }

    /// Consumes the scheduler, releasing the simulation state.
    pub fn into_context(self) -> SimContext {
        self.context
    }

    /// Runs ticks until every task is delivered; returns the final second.
    pub fn process_to_complete(&mut self) -> Result<u32, SchedulerError> {
        while !self.context.all_tasks_completed() {
            self.process()?;
        }
        Ok(self.timestamp)
    }

    /// Advances the simulation by exactly one second.
    ///
    /// A no-op once every task is completed. Fails with
    /// [`SchedulerError::DeadlockTimeout`] when the cap is exceeded.
    pub fn process(&mut self) -> Result<(), SchedulerError> {
        if self.context.all_tasks_completed() {
            return Ok(());
        }
        if self.timestamp > MAX_TIMESTAMP {
            return Err(SchedulerError::DeadlockTimeout {
                limit: MAX_TIMESTAMP,
            });
        }
        self.timestamp += 1;
        let timestamp = self.timestamp;

        let fleet_size = self.context.agvs.len();
        let mut handled: HashSet<usize> = HashSet::new();

        // Phase 1: unload.
        for agv in 0..fleet_size {
            if handled.contains(&agv) {
                continue;
            }
            if self.context.agvs[agv].can_unload(&self.context.tasks) {
                self.context.unload_agv(agv, timestamp);
                handled.insert(agv);
            }
        }

        // Phase 2: load AGVs already standing on a pickup cell.
        let pending = self.context.sorted_pending_tasks();
        for agv in 0..fleet_size {
            if handled.contains(&agv) || self.context.agvs[agv].is_loaded() {
                continue;
            }
            for &task in &pending {
                if self.context.tasks[task].is_pending()
                    && self.context.tasks[task].pickup_position == self.context.agvs[agv].position
                {
                    self.context.load_agv(agv, task, timestamp);
                    handled.insert(agv);
                    break;
                }
            }
        }

        // Phase 3: move loaded AGVs.
        let loaded: Vec<usize> = (0..fleet_size)
            .filter(|&agv| self.context.agvs[agv].is_loaded())
            .collect();
        self.batch_move(&loaded, &mut handled, true, &[])?;

        // Phase 4: turn loaded AGVs (paths were refreshed in phase 3).
        for agv in 0..fleet_size {
            if handled.contains(&agv) || !self.context.agvs[agv].is_loaded() {
                continue;
            }
            if self.context.agvs[agv].should_turn() {
                self.context.agvs[agv].turn();
                handled.insert(agv);
            }
        }

        // Phase 5: tentative assignment of pending tasks to idle AGVs.
        let pending = self.context.sorted_pending_tasks();
        let mut idle: Vec<usize> = (0..fleet_size)
            .filter(|agv| !handled.contains(agv) && !self.context.agvs[*agv].is_loaded())
            .collect();
        let mut tentative: Vec<(usize, usize)> = Vec::new();

        for &task in &pending {
            if idle.is_empty() {
                break;
            }
            // Cheapest timed path wins; the first candidate keeps ties.
            let mut best: Option<(usize, Vec<crate::models::PathTimePoint>, i32)> = None;
            for (slot, &agv) in idle.iter().enumerate() {
                let additional = self.dynamic_obstacles(agv);
                let path = self.plan_to_pickup(agv, task, &additional);
                let timed = compute_timing(&path, self.context.agvs[agv].heading)?;
                let cost = timed.last().map(|p| p.time_cost).unwrap_or(i32::MAX);
                if best.as_ref().map_or(true, |(_, _, lowest)| cost < *lowest) {
                    best = Some((slot, timed, cost));
                }
            }
            if let Some((slot, timed, _)) = best {
                let agv = idle.remove(slot);
                self.context.agvs[agv].path = timed;
                tentative.push((agv, task));
            }
        }

        // Phase 6: turn and move the tentatively assigned AGVs.
        let turn_group: Vec<usize> = tentative
            .iter()
            .map(|&(agv, _)| agv)
            .filter(|&agv| self.context.agvs[agv].should_turn())
            .collect();
        let move_group: Vec<usize> = tentative
            .iter()
            .map(|&(agv, _)| agv)
            .filter(|&agv| self.context.agvs[agv].should_move())
            .collect();

        for &agv in &turn_group {
            self.context.agvs[agv].turn();
        }
        self.batch_move(&move_group, &mut handled, false, &tentative)?;

        // Phase 7: once nothing is pending, walk leftover AGVs to the map
        // edge so running deliveries cannot be boxed in.
        if pending.is_empty() {
            for agv in 0..fleet_size {
                if handled.contains(&agv) {
                    continue;
                }
                self.park(agv)?;
            }
        }

        debug!(
            timestamp,
            completed = self.context.completed_count(),
            "tick processed"
        );

        // Phase 8: record the tick.
        self.context.record(timestamp);
        Ok(())
    }

    /// One parking step: head for the nearest edge cell whose half-plane
    /// holds no loaded AGV on the same row or column.
    fn park(&mut self, agv: usize) -> Result<(), SchedulerError> {
        let position = self.context.agvs[agv].position;
        let heading = self.context.agvs[agv].heading;
        let bounds = self.context.bounds;

        let loaded_positions: Vec<Point> = self
            .context
            .agvs
            .iter()
            .filter(|other| other.is_loaded())
            .map(|other| other.position)
            .collect();

        let mut candidates: Vec<Point> = Vec::new();
        if !loaded_positions
            .iter()
            .any(|p| p.x == position.x && p.y > position.y)
        {
            candidates.push(Point::new(position.x, bounds.top));
        }
        if !loaded_positions
            .iter()
            .any(|p| p.x == position.x && p.y < position.y)
        {
            candidates.push(Point::new(position.x, bounds.bottom));
        }
        if !loaded_positions
            .iter()
            .any(|p| p.y == position.y && p.x > position.x)
        {
            candidates.push(Point::new(bounds.right, position.y));
        }
        if !loaded_positions
            .iter()
            .any(|p| p.y == position.y && p.x < position.x)
        {
            candidates.push(Point::new(bounds.left, position.y));
        }

        // Nearest candidate; the first one keeps ties.
        let mut goal: Option<(Point, u32)> = None;
        for candidate in candidates {
            let distance = candidate.manhattan(position);
            if goal.map_or(true, |(_, nearest)| distance < nearest) {
                goal = Some((candidate, distance));
            }
        }
        let Some((goal, _)) = goal else {
            return Ok(());
        };

        let additional = self.dynamic_obstacles(agv);
        let obstacles = self.build_obstacles(&additional);
        let path = self.planner.plan(position, goal, heading, &obstacles);
        let timed = compute_timing(&path, heading)?;
        self.context.agvs[agv].path = timed;

        if self.context.agvs[agv].should_move() {
            self.context.agvs[agv].move_step();
        } else if self.context.agvs[agv].should_turn() {
            self.context.agvs[agv].turn();
        }
        Ok(())
    }

    /// Moves a batch of AGVs, cascading until no further AGV can act.
    ///
    /// Every candidate is re-planned against the current obstacle picture.
    /// A candidate whose plan is too short, or whose first step is
    /// off-heading, is skipped (the turning phases pick it up). A
    /// candidate about to cut across an AGV that already moved this phase
    /// (same heading, orthogonally adjacent, with destinations pulling the
    /// two across each other) is instead forced to turn toward the blocked
    /// side and re-planned next tick — this breaks the cross-lock pattern
    /// before it forms.
    fn batch_move(
        &mut self,
        candidates: &[usize],
        handled: &mut HashSet<usize>,
        loaded: bool,
        tentative: &[(usize, usize)],
    ) -> Result<(), SchedulerError> {
        // (AGV, position before its move, its task)
        let mut prev_moves: Vec<(usize, Point, usize)> = Vec::new();

        loop {
            let mut progressed = false;

            for &agv in candidates {
                if handled.contains(&agv) || self.context.agvs[agv].is_loaded() != loaded {
                    continue;
                }
                let task = if loaded {
                    self.context.agvs[agv].loaded_task
                } else {
                    tentative
                        .iter()
                        .find(|&&(candidate, _)| candidate == agv)
                        .map(|&(_, task)| task)
                };
                let Some(task) = task else {
                    continue;
                };

                let additional = self.dynamic_obstacles(agv);
                let path = if loaded {
                    self.plan_to_end(agv, task, &additional)
                } else {
                    self.plan_to_pickup(agv, task, &additional)
                };
                let timed = compute_timing(&path, self.context.agvs[agv].heading)?;
                self.context.agvs[agv].path = timed;

                if self.context.agvs[agv].path.len() < 2 {
                    continue;
                }
                let heading = self.context.agvs[agv].heading;
                let step = self.context.agvs[agv].path[1].position;
                let step_heading = self.context.agvs[agv].position.heading_to(step)?;
                if step_heading != heading {
                    continue;
                }

                if let Some(forced) = self.cross_lock_override(agv, task, &prev_moves) {
                    self.context.agvs[agv].turn_to(forced);
                    self.context.agvs[agv].path.clear();
                    handled.insert(agv);
                    progressed = true;
                    continue;
                }

                prev_moves.push((agv, self.context.agvs[agv].position, task));
                handled.insert(agv);
                self.context.agvs[agv].move_step();
                progressed = true;
            }

            if !progressed {
                return Ok(());
            }
        }
    }

    /// Checks the four orthogonal cross patterns against the AGVs that
    /// already moved this phase. Returns the heading the AGV must be
    /// forced to, if any.
    fn cross_lock_override(
        &self,
        agv: usize,
        task: usize,
        prev_moves: &[(usize, Point, usize)],
    ) -> Option<Direction> {
        let position = self.context.agvs[agv].position;
        let heading = self.context.agvs[agv].heading;
        let destination = self.context.tasks[task].end_position;
        let horizontal = matches!(heading, Direction::Left | Direction::Right);

        for &(mover, mover_from, mover_task) in prev_moves {
            if self.context.agvs[mover].heading != heading {
                continue;
            }
            let mover_destination = self.context.tasks[mover_task].end_position;

            if horizontal {
                if mover_from.x == position.x
                    && mover_from.y == position.y + 1
                    && destination.y > position.y
                    && mover_destination.y <= mover_from.y
                {
                    return Some(Direction::Up);
                }
                if mover_from.x == position.x
                    && mover_from.y == position.y - 1
                    && destination.y < position.y
                    && mover_destination.y >= mover_from.y
                {
                    return Some(Direction::Down);
                }
            } else {
                if mover_from.y == position.y
                    && mover_from.x == position.x - 1
                    && destination.x < position.x
                    && mover_destination.x >= mover_from.x
                {
                    return Some(Direction::Left);
                }
                if mover_from.y == position.y
                    && mover_from.x == position.x + 1
                    && destination.x > position.x
                    && mover_destination.x <= mover_from.x
                {
                    return Some(Direction::Right);
                }
            }
        }
        None
    }

    /// Per-AGV dynamic obstacles for this tick: neighbour cells occupied
    /// by other AGVs, plus the single free neighbour of any AGV that has
    /// exactly one left — stepping onto that cell would box it in
    /// (the cross-lock preempt).
    fn dynamic_obstacles(&self, agv: usize) -> Vec<Point> {
        let agvs = &self.context.agvs;
        let position = agvs[agv].position;
        let occupied: HashSet<Point> = agvs.iter().map(|a| a.position).collect();

        let mut obstacles: Vec<Point> = position
            .neighbours()
            .into_iter()
            .filter(|cell| occupied.contains(cell))
            .collect();

        for (other, other_agv) in agvs.iter().enumerate() {
            if other == agv {
                continue;
            }
            let mut free: Vec<Point> = other_agv
                .position
                .neighbours()
                .into_iter()
                .filter(|cell| !self.context.fixed_obstacles.contains(cell))
                .collect();
            for (third, third_agv) in agvs.iter().enumerate() {
                if third != other && third_agv.position.is_neighbour(other_agv.position) {
                    free.retain(|&cell| cell != third_agv.position);
                }
            }
            if free.len() == 1 && position.is_neighbour(free[0]) {
                obstacles.push(free[0]);
            }
        }

        obstacles
    }

    fn build_obstacles(&self, additional: &[Point]) -> HashSet<Point> {
        let mut obstacles = self.context.fixed_obstacles.clone();
        obstacles.extend(additional.iter().copied());
        obstacles
    }

    fn plan_to_pickup(&self, agv: usize, task: usize, additional: &[Point]) -> Vec<Point> {
        let obstacles = self.build_obstacles(additional);
        self.planner.plan(
            self.context.agvs[agv].position,
            self.context.tasks[task].pickup_position,
            self.context.agvs[agv].heading,
            &obstacles,
        )
    }

    /// Plans to the destination cell itself; the end point is statically
    /// blocked, so it is carved out of the obstacle set for this plan.
    fn plan_to_end(&self, agv: usize, task: usize, additional: &[Point]) -> Vec<Point> {
        let mut obstacles = self.build_obstacles(additional);
        obstacles.remove(&self.context.tasks[task].end_position);
        self.planner.plan(
            self.context.agvs[agv].position,
            self.context.tasks[task].end_position,
            self.context.agvs[agv].heading,
            &obstacles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MapElement, TaskRecord};
    use crate::validation::validate_trajectory;

    fn corner_pins() -> Vec<MapElement> {
        vec![
            MapElement::end_point("EP98", 1, 1),
            MapElement::end_point("EP99", 20, 20),
        ]
    }

    #[test]
    fn test_single_delivery_completes_cleanly() {
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::end_point("EP01", 18, 5),
            MapElement::agv("AGV01", 10, 10, Direction::Right),
        ];
        elements.extend(corner_pins());
        let records = vec![TaskRecord::new("T1", "SP01", "EP01")];

        let context = SimContext::new(elements.clone(), records.clone()).unwrap();
        let mut scheduler = Scheduler::new(context);
        let final_ts = scheduler.process_to_complete().unwrap();

        let context = scheduler.into_context();
        assert!(context.all_tasks_completed());
        assert!(final_ts < MAX_TIMESTAMP);
        assert_eq!(
            context.recorder.len(),
            (final_ts as usize + 1) * context.agvs.len()
        );
        assert!(validate_trajectory(&elements, &records, context.recorder.rows()).is_ok());
    }

    #[test]
    fn test_two_lanes_run_in_parallel() {
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::start_point("SP02", 3, 14),
            MapElement::end_point("EP01", 15, 5),
            MapElement::end_point("EP02", 15, 14),
            MapElement::agv("AGV01", 6, 5, Direction::Right),
            MapElement::agv("AGV02", 6, 14, Direction::Right),
        ];
        elements.extend(corner_pins());
        let records = vec![
            TaskRecord::new("T1", "SP01", "EP01"),
            TaskRecord::new("T2", "SP02", "EP02"),
        ];

        let context = SimContext::new(elements.clone(), records.clone()).unwrap();
        let mut scheduler = Scheduler::new(context);
        let final_ts = scheduler.process_to_complete().unwrap();

        let context = scheduler.into_context();
        assert_eq!(context.completed_count(), 2);
        assert!(final_ts < MAX_TIMESTAMP);
        assert!(validate_trajectory(&elements, &records, context.recorder.rows()).is_ok());
    }

    #[test]
    fn test_unreachable_pickup_times_out() {
        // The pickup cell (4,3) is walled in by stations on all open
        // sides, so the task can never be loaded.
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 3),
            MapElement::end_point("EP01", 4, 4),
            MapElement::end_point("EP02", 4, 2),
            MapElement::end_point("EP03", 5, 3),
            MapElement::agv("AGV01", 10, 10, Direction::Right),
        ];
        elements.extend(corner_pins());
        let records = vec![TaskRecord::new("T1", "SP01", "EP01")];

        let context = SimContext::new(elements, records).unwrap();
        let mut scheduler = Scheduler::new(context);
        let error = scheduler.process_to_complete().unwrap_err();
        assert!(matches!(error, SchedulerError::DeadlockTimeout { .. }));
    }

    #[test]
    fn test_idle_agv_parks_while_delivery_runs() {
        // AGV01 starts on the pickup cell; the task is loaded on tick 1,
        // so from tick 1 on nothing is pending and AGV02 walks toward its
        // nearest edge, (10,1), one cell per tick.
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::end_point("EP01", 8, 5),
            MapElement::agv("AGV01", 4, 5, Direction::Right),
            MapElement::agv("AGV02", 10, 10, Direction::Down),
        ];
        elements.extend(corner_pins());
        let records = vec![TaskRecord::new("T1", "SP01", "EP01")];

        let context = SimContext::new(elements.clone(), records.clone()).unwrap();
        let mut scheduler = Scheduler::new(context);
        let final_ts = scheduler.process_to_complete().unwrap();

        // Tick 1 loads; ticks 2-4 move to (7,5); tick 5 unloads.
        assert_eq!(final_ts, 5);
        let context = scheduler.into_context();
        assert_eq!(context.agvs[1].position, Point::new(10, 5));
        assert!(validate_trajectory(&elements, &records, context.recorder.rows()).is_ok());
    }

    #[test]
    fn test_process_is_noop_after_completion() {
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::end_point("EP01", 8, 5),
            MapElement::agv("AGV01", 4, 5, Direction::Right),
        ];
        elements.extend(corner_pins());
        let records = vec![TaskRecord::new("T1", "SP01", "EP01")];

        let context = SimContext::new(elements, records).unwrap();
        let mut scheduler = Scheduler::new(context);
        let final_ts = scheduler.process_to_complete().unwrap();
        let rows_before = scheduler.context().recorder.len();

        scheduler.process().unwrap();
        assert_eq!(scheduler.timestamp(), final_ts);
        assert_eq!(scheduler.context().recorder.len(), rows_before);
    }

    #[test]
    fn test_dynamic_obstacles_block_occupied_neighbours() {
        let mut elements = vec![
            MapElement::agv("AGV01", 5, 5, Direction::Right),
            MapElement::agv("AGV02", 6, 5, Direction::Left),
        ];
        elements.extend(corner_pins());
        let context = SimContext::new(elements, Vec::new()).unwrap();
        let scheduler = Scheduler::new(context);

        let obstacles = scheduler.dynamic_obstacles(0);
        assert!(obstacles.contains(&Point::new(6, 5)));
        let obstacles = scheduler.dynamic_obstacles(1);
        assert!(obstacles.contains(&Point::new(5, 5)));
    }

    #[test]
    fn test_dynamic_obstacles_preempt_cross_lock() {
        // AGV02 at (5,5) has stations on three sides; its only free
        // neighbour (6,5) is adjacent to AGV01, so AGV01 must not plan
        // through it.
        let mut elements = vec![
            MapElement::start_point("SP03", 4, 5),
            MapElement::end_point("EP07", 5, 6),
            MapElement::end_point("EP08", 5, 4),
            MapElement::agv("AGV01", 7, 5, Direction::Left),
            MapElement::agv("AGV02", 5, 5, Direction::Right),
        ];
        elements.extend(corner_pins());
        let context = SimContext::new(elements, Vec::new()).unwrap();
        let scheduler = Scheduler::new(context);

        let obstacles = scheduler.dynamic_obstacles(0);
        assert!(obstacles.contains(&Point::new(6, 5)));
    }

    #[test]
    fn test_cross_lock_override_horizontal() {
        // AGV02 just moved from (8,6), one cell above AGV01, with the
        // same heading; AGV01 wants to go up past it while AGV02's
        // destination pulls it back down. AGV01 must be forced to face Up
        // instead of cutting across.
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::end_point("EP01", 15, 9),
            MapElement::end_point("EP02", 15, 2),
            MapElement::agv("AGV01", 8, 5, Direction::Right),
            MapElement::agv("AGV02", 9, 6, Direction::Right),
        ];
        elements.extend(corner_pins());
        let records = vec![
            TaskRecord::new("T1", "SP01", "EP01"),
            TaskRecord::new("T2", "SP01", "EP02"),
        ];
        let context = SimContext::new(elements, records).unwrap();
        let mut scheduler = Scheduler::new(context);

        let prev_moves = vec![(1usize, Point::new(8, 6), 1usize)];
        assert_eq!(
            scheduler.cross_lock_override(0, 0, &prev_moves),
            Some(Direction::Up)
        );

        // A mover with a different heading never triggers the pattern.
        scheduler.context.agvs[1].heading = Direction::Up;
        assert_eq!(scheduler.cross_lock_override(0, 0, &prev_moves), None);
    }

    #[test]
    fn test_cross_lock_override_vertical() {
        // Both heading Up; AGV02 just moved from (7,5), left of AGV01,
        // while AGV01's destination lies further left and AGV02's pulls
        // it back right. AGV01 is forced to face Left.
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::end_point("EP01", 2, 15),
            MapElement::end_point("EP02", 14, 15),
            MapElement::agv("AGV01", 8, 5, Direction::Up),
            MapElement::agv("AGV02", 7, 6, Direction::Up),
        ];
        elements.extend(corner_pins());
        let records = vec![
            TaskRecord::new("T1", "SP01", "EP01"),
            TaskRecord::new("T2", "SP01", "EP02"),
        ];
        let context = SimContext::new(elements, records).unwrap();
        let scheduler = Scheduler::new(context);

        let prev_moves = vec![(1usize, Point::new(7, 5), 1usize)];
        assert_eq!(
            scheduler.cross_lock_override(0, 0, &prev_moves),
            Some(Direction::Left)
        );
    }

    #[test]
    fn test_shuffled_task_order_still_validates() {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::start_point("SP02", 3, 12),
            MapElement::end_point("EP01", 15, 5),
            MapElement::end_point("EP02", 15, 12),
            MapElement::agv("AGV01", 10, 8, Direction::Left),
        ];
        elements.extend(corner_pins());
        let base = vec![
            TaskRecord::new("T1", "SP01", "EP01"),
            TaskRecord::new("T2", "SP01", "EP02"),
            TaskRecord::new("T3", "SP02", "EP01"),
        ];

        for seed in [5555u64, 5556] {
            let mut records = base.clone();
            records.shuffle(&mut StdRng::seed_from_u64(seed));

            let context = SimContext::new(elements.clone(), records.clone()).unwrap();
            let mut scheduler = Scheduler::new(context);
            let final_ts = scheduler.process_to_complete().unwrap();

            let context = scheduler.into_context();
            assert_eq!(context.completed_count(), 3);
            assert!(final_ts < MAX_TIMESTAMP);
            assert!(
                validate_trajectory(&elements, &records, context.recorder.rows()).is_ok(),
                "seed {seed} produced an invalid trajectory"
            );
        }
    }

    #[test]
    fn test_loaded_plan_reaches_blocked_destination() {
        let mut elements = vec![
            MapElement::start_point("SP01", 3, 5),
            MapElement::end_point("EP01", 8, 5),
            MapElement::agv("AGV01", 4, 5, Direction::Right),
        ];
        elements.extend(corner_pins());
        let records = vec![TaskRecord::new("T1", "SP01", "EP01")];
        let mut context = SimContext::new(elements, records).unwrap();
        context.load_agv(0, 0, 1);

        let scheduler = Scheduler::new(context);
        let path = scheduler.plan_to_end(0, 0, &[]);
        // The end point is a fixed obstacle but must still be reachable
        // as a goal.
        assert_eq!(path.last(), Some(&Point::new(8, 5)));
    }
}
