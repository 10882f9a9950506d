//! Run quality metrics.
//!
//! Computes delivery statistics and the score of a finished (or aborted)
//! run from the task arena.
//!
//! # Scoring
//!
//! | Event | Points |
//! |-------|--------|
//! | Task delivered | +1 |
//! | High-priority task delivered by its deadline | +10 |
//! | High-priority task delivered late | −5 |

use crate::models::{Task, TaskPriority};

/// Points for any delivered task.
pub const DELIVERY_POINTS: i32 = 1;
/// Bonus for a High task delivered by its deadline.
pub const ON_TIME_BONUS: i32 = 10;
/// Penalty for a High task delivered late.
pub const LATE_PENALTY: i32 = -5;

/// Metrics of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunKpi {
    /// Delivered tasks.
    pub completed: usize,
    /// Tasks in the run.
    pub total: usize,
    /// Score under the delivery/deadline rule.
    pub score: i32,
    /// Final simulated second.
    pub final_timestamp: u32,
    /// Mean seconds from load to unload across delivered tasks.
    pub avg_task_duration: f64,
    /// Shortest delivery, seconds.
    pub min_task_duration: u32,
    /// Longest delivery, seconds.
    pub max_task_duration: u32,
}

impl RunKpi {
    /// Computes the metrics from the task arena after a run.
    ///
    /// A High task without a deadline counts as on time.
    pub fn calculate(tasks: &[Task], final_timestamp: u32) -> Self {
        let mut completed = 0usize;
        let mut score = 0i32;
        let mut total_duration = 0u64;
        let mut min_duration = u32::MAX;
        let mut max_duration = 0u32;

        for task in tasks {
            let Some(complete_ts) = task.complete_ts else {
                continue;
            };
            completed += 1;
            score += DELIVERY_POINTS;

            if task.record.priority == TaskPriority::High {
                let on_time = task
                    .record
                    .remaining_time
                    .map_or(true, |deadline| complete_ts <= deadline);
                score += if on_time { ON_TIME_BONUS } else { LATE_PENALTY };
            }

            if let Some(duration) = task.duration() {
                total_duration += u64::from(duration);
                min_duration = min_duration.min(duration);
                max_duration = max_duration.max(duration);
            }
        }

        let avg_task_duration = if completed == 0 {
            0.0
        } else {
            total_duration as f64 / completed as f64
        };

        Self {
            completed,
            total: tasks.len(),
            score,
            final_timestamp,
            avg_task_duration,
            min_task_duration: if completed == 0 { 0 } else { min_duration },
            max_task_duration: max_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, TaskRecord};

    fn delivered(record: TaskRecord, start_ts: u32, complete_ts: u32) -> Task {
        let mut task = Task::new(record, Point::new(3, 5), Point::new(18, 5));
        task.load_by(0, start_ts);
        task.unload(complete_ts);
        task
    }

    #[test]
    fn test_score_mixed_priorities() {
        let tasks = vec![
            delivered(TaskRecord::new("T1", "SP01", "EP01"), 1, 10),
            delivered(TaskRecord::new("T2", "SP01", "EP01"), 2, 20),
            delivered(TaskRecord::new("T3", "SP01", "EP01"), 3, 30),
            delivered(
                TaskRecord::new("T4", "SP01", "EP01")
                    .with_priority(TaskPriority::High)
                    .with_remaining_time(60),
                4,
                40,
            ),
            delivered(
                TaskRecord::new("T5", "SP01", "EP01")
                    .with_priority(TaskPriority::High)
                    .with_remaining_time(30),
                5,
                50,
            ),
        ];

        let kpi = RunKpi::calculate(&tasks, 50);
        // 5 deliveries + one on-time bonus - one late penalty.
        assert_eq!(kpi.score, 5 + 10 - 5);
        assert_eq!(kpi.completed, 5);
        assert_eq!(kpi.total, 5);
    }

    #[test]
    fn test_high_without_deadline_counts_on_time() {
        let tasks = vec![delivered(
            TaskRecord::new("T1", "SP01", "EP01").with_priority(TaskPriority::High),
            1,
            100,
        )];
        let kpi = RunKpi::calculate(&tasks, 100);
        assert_eq!(kpi.score, 11);
    }

    #[test]
    fn test_durations() {
        let tasks = vec![
            delivered(TaskRecord::new("T1", "SP01", "EP01"), 0, 10),
            delivered(TaskRecord::new("T2", "SP01", "EP01"), 10, 40),
        ];
        let kpi = RunKpi::calculate(&tasks, 40);
        assert_eq!(kpi.min_task_duration, 10);
        assert_eq!(kpi.max_task_duration, 30);
        assert!((kpi.avg_task_duration - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_incomplete_tasks_do_not_score() {
        let mut pending = Task::new(
            TaskRecord::new("T1", "SP01", "EP01"),
            Point::new(3, 5),
            Point::new(18, 5),
        );
        pending.load_by(0, 5); // running, never delivered
        let tasks = vec![pending];

        let kpi = RunKpi::calculate(&tasks, 400);
        assert_eq!(kpi.completed, 0);
        assert_eq!(kpi.score, 0);
        assert_eq!(kpi.min_task_duration, 0);
        assert!((kpi.avg_task_duration - 0.0).abs() < 1e-10);
    }
}
