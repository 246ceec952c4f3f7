//! Replication task summaries and job history.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::models::{JobRecord, ReplicationTask, TaskState};

pub const REPLICATION_RUN_METHOD: &str = "replication.run";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplicationStats {
    pub total_tasks: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub running: usize,
    pub success: usize,
    pub error: usize,
    pub never_run: usize,
    pub last_24h: usize,
}

pub fn statistics(tasks: &[ReplicationTask], now: DateTime<Utc>) -> ReplicationStats {
    let mut stats = ReplicationStats {
        total_tasks: tasks.len(),
        ..Default::default()
    };

    for task in tasks {
        if task.enabled {
            stats.enabled += 1;
        } else {
            stats.disabled += 1;
        }

        match task.state {
            TaskState::Running => stats.running += 1,
            TaskState::Success => stats.success += 1,
            state if state.is_failure() => stats.error += 1,
            _ => {}
        }

        match task.last_run_at {
            None => stats.never_run += 1,
            Some(at) if now - at <= TimeDelta::hours(24) => stats.last_24h += 1,
            Some(_) => {}
        }
    }

    stats
}

pub fn filter_tasks(tasks: Vec<ReplicationTask>, enabled_only: bool, failed_only: bool) -> Vec<ReplicationTask> {
    tasks
        .into_iter()
        .filter(|t| !enabled_only || t.enabled)
        .filter(|t| !failed_only || t.state.is_failure())
        .collect()
}

/// `replication.run` jobs started within the last `days`, optionally for a
/// single task. Jobs without a usable start time are dropped.
pub fn replication_history(
    jobs: Vec<JobRecord>,
    task_id: Option<u64>,
    days: i64,
    now: DateTime<Utc>,
) -> Vec<JobRecord> {
    let cutoff = now - TimeDelta::days(days);

    jobs.into_iter()
        .filter(|job| job.method == REPLICATION_RUN_METHOD)
        .filter(|job| task_id.map_or(true, |id| job.task_id == Some(id)))
        .filter(|job| job.started_at.is_some_and(|at| at >= cutoff))
        .collect()
}
