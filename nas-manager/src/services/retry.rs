//! Trigger-and-poll for replication tasks, with retry of failed ones.
//!
//! The middleware has no completion callback, so a triggered task is
//! observed by polling its state at a fixed interval until it reaches a
//! terminal state or the wait times out.

use futures_util::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::TaskRunner;
use crate::models::{ReplicationTask, TaskState};
use crate::{NasError, Result};

/// How a single wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Succeeded,
    Failed,
    TimedOut,
}

impl WaitOutcome {
    pub fn is_success(self) -> bool {
        self == WaitOutcome::Succeeded
    }
}

/// Poll `task_id` every `poll_interval` until it succeeds, fails, or
/// `timeout` has elapsed. A failed state query is logged and polling
/// continues.
pub async fn wait_outcome(
    runner: &dyn TaskRunner,
    task_id: u64,
    timeout: Duration,
    poll_interval: Duration,
) -> WaitOutcome {
    let start = Instant::now();

    while start.elapsed() < timeout {
        match runner.get_state(task_id).await {
            Ok(status) => match status.state {
                TaskState::Success => {
                    info!(task_id, "Replication completed successfully");
                    return WaitOutcome::Succeeded;
                }
                state if state.is_failure() => {
                    warn!(task_id, %state, "Replication failed");
                    return WaitOutcome::Failed;
                }
                state => debug!(task_id, %state, "Replication in progress"),
            },
            Err(e) => warn!(task_id, error = %e, "Failed to query replication state"),
        }

        sleep(poll_interval).await;
    }

    warn!(task_id, timeout_secs = timeout.as_secs(), "Timed out waiting for replication");
    WaitOutcome::TimedOut
}

/// `true` only if the task reached `SUCCESS`; failure and timeout are both
/// `false`. Use [`wait_outcome`] to tell them apart.
pub async fn wait_for_completion(
    runner: &dyn TaskRunner,
    task_id: u64,
    timeout: Duration,
    poll_interval: Duration,
) -> bool {
    wait_outcome(runner, task_id, timeout, poll_interval)
        .await
        .is_success()
}

// ── Retry sweep ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per task, including the first
    pub max_retries: u32,
    /// Pause between a failed attempt and the next one
    pub retry_delay: Duration,
    pub poll_interval: Duration,
    /// Wait budget for one attempt
    pub wait_timeout: Duration,
    /// Tasks retried at once
    pub concurrency: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
            wait_timeout: Duration::from_secs(600),
            concurrency: 1,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(NasError::InvalidInput("poll interval must be positive".to_string()));
        }
        if self.concurrency == 0 {
            return Err(NasError::InvalidInput("concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// What happened to one task during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRetryReport {
    pub task_id: u64,
    pub name: String,
    /// Attempts consumed, including ones whose trigger call failed
    pub attempts: u32,
    pub succeeded: bool,
    /// Outcome of the last wait, `None` if no trigger ever went through
    pub last_outcome: Option<WaitOutcome>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Tasks in a failure state when the sweep started
    pub total_failed: usize,
    pub succeeded: Vec<String>,
    pub still_failed: Vec<String>,
    /// Every task the sweep attempted, in sweep order
    pub retried: Vec<String>,
    pub reports: Vec<TaskRetryReport>,
}

pub struct RetryController<'a> {
    runner: &'a dyn TaskRunner,
    policy: RetryPolicy,
}

impl<'a> RetryController<'a> {
    pub fn new(runner: &'a dyn TaskRunner, policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { runner, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Retry every task currently in `ERROR`/`FAILED`.
    ///
    /// Per-task problems never abort the sweep; only a failure to list the
    /// tasks in the first place is returned as an error.
    pub async fn retry_failed(&self) -> Result<RetryOutcome> {
        let tasks = self.runner.list_tasks().await?;
        let failed: Vec<ReplicationTask> = tasks.into_iter().filter(|t| t.state.is_failure()).collect();

        info!(count = failed.len(), "Found failed replication tasks");

        // `buffered` yields in input order regardless of completion order
        let reports: Vec<TaskRetryReport> = stream::iter(failed)
            .map(|task| self.retry_task(task))
            .buffered(self.policy.concurrency)
            .collect()
            .await;

        let mut outcome = RetryOutcome {
            total_failed: reports.len(),
            ..Default::default()
        };
        for report in reports {
            outcome.retried.push(report.name.clone());
            if report.succeeded {
                outcome.succeeded.push(report.name.clone());
            } else {
                outcome.still_failed.push(report.name.clone());
            }
            outcome.reports.push(report);
        }

        info!(
            total = outcome.total_failed,
            succeeded = outcome.succeeded.len(),
            still_failed = outcome.still_failed.len(),
            "Retry sweep finished"
        );
        Ok(outcome)
    }

    /// Run `task` up to `max_retries` times until one attempt succeeds.
    /// With `max_retries == 0` nothing is triggered and the task stays failed.
    pub async fn retry_task(&self, task: ReplicationTask) -> TaskRetryReport {
        let max = self.policy.max_retries;
        let mut report = TaskRetryReport {
            task_id: task.id,
            name: task.name,
            attempts: 0,
            succeeded: false,
            last_outcome: None,
            last_error: None,
        };

        for attempt in 1..=max {
            report.attempts = attempt;
            info!(task_id = task.id, task = %report.name, attempt, max, "Retrying replication task");

            match self.runner.trigger(task.id).await {
                Ok(job) => {
                    debug!(task_id = task.id, %job, "Replication job started");
                    let outcome = wait_outcome(
                        self.runner,
                        task.id,
                        self.policy.wait_timeout,
                        self.policy.poll_interval,
                    )
                    .await;
                    report.last_outcome = Some(outcome);
                    if outcome.is_success() {
                        report.succeeded = true;
                        return report;
                    }
                }
                Err(e) => {
                    warn!(task_id = task.id, attempt, error = %e, "Failed to trigger replication task");
                    report.last_error = Some(e.to_string());
                }
            }

            if attempt < max {
                info!(task_id = task.id, delay_secs = self.policy.retry_delay.as_secs(), "Waiting before retry");
                sleep(self.policy.retry_delay).await;
            }
        }

        warn!(task_id = task.id, task = %report.name, attempts = max, "Replication task still failing");
        report
    }
}

/// Convenience wrapper around [`RetryController::retry_failed`].
pub async fn retry_failed(runner: &dyn TaskRunner, policy: RetryPolicy) -> Result<RetryOutcome> {
    RetryController::new(runner, policy)?.retry_failed().await
}
