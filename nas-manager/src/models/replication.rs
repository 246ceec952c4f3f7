use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::time::parse_remote_time;

// ── TaskState ──

/// Replication state as reported by the middleware.
///
/// States other than the ones listed (`PENDING`, `WAITING`, ...) collapse to
/// `Unknown`, which the poll loop treats as "not finished yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Running,
    Success,
    Error,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// `ERROR` and `FAILED` are the same thing for retry purposes.
    pub fn is_failure(self) -> bool {
        matches!(self, TaskState::Error | TaskState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Running => "RUNNING",
            TaskState::Success => "SUCCESS",
            TaskState::Error => "ERROR",
            TaskState::Failed => "FAILED",
            TaskState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ── ReplicationTask ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationTask {
    pub id: u64,
    pub name: String,
    pub enabled: bool,
    pub state: TaskState,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_snapshot: Option<String>,
    pub error: Option<String>,
    pub source_datasets: Vec<String>,
    pub target_dataset: Option<String>,
    pub direction: Option<String>,
    pub transport: Option<String>,
    pub recursive: bool,
    /// KiB/s, `None` for unlimited
    pub speed_limit: Option<u64>,
    pub schedule: Option<Value>,
}

impl ReplicationTask {
    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            state: self.state,
            last_run_at: self.last_run_at,
        }
    }
}

/// Snapshot of a task's progress used by the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStatus {
    pub state: TaskState,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// Middleware job id returned when a task is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub u64);

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Wire format ──

/// One entry of `GET replication`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplicationRecord {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub state: ReplicationStateRecord,
    #[serde(default)]
    pub source_datasets: Vec<String>,
    #[serde(default)]
    pub target_dataset: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub speed_limit: Option<u64>,
    #[serde(default)]
    pub schedule: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplicationStateRecord {
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub datetime: Value,
    #[serde(default)]
    pub last_snapshot: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<ReplicationRecord> for ReplicationTask {
    fn from(record: ReplicationRecord) -> Self {
        ReplicationTask {
            id: record.id,
            name: record.name.unwrap_or_else(|| format!("Task {}", record.id)),
            enabled: record.enabled,
            state: record.state.state,
            last_run_at: parse_remote_time(&record.state.datetime),
            last_snapshot: record.state.last_snapshot,
            error: record.state.error,
            source_datasets: record.source_datasets,
            target_dataset: record.target_dataset,
            direction: record.direction,
            transport: record.transport,
            recursive: record.recursive,
            speed_limit: record.speed_limit,
            schedule: record.schedule,
        }
    }
}

// ── Jobs ──

/// A middleware job from `GET core/get_jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: u64,
    pub method: String,
    /// First job argument, which is the task id for `replication.run`
    pub task_id: Option<u64>,
    pub state: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobWire {
    pub id: u64,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub time_started: Value,
    #[serde(default)]
    pub time_finished: Value,
}

impl From<JobWire> for JobRecord {
    fn from(wire: JobWire) -> Self {
        JobRecord {
            id: wire.id,
            method: wire.method,
            task_id: wire.arguments.first().and_then(Value::as_u64),
            state: wire.state.unwrap_or_else(|| "UNKNOWN".to_string()),
            started_at: parse_remote_time(&wire.time_started),
            finished_at: parse_remote_time(&wire.time_finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_parsing() {
        let parse = |s: &str| serde_json::from_value::<TaskState>(json!(s)).unwrap();
        assert_eq!(parse("RUNNING"), TaskState::Running);
        assert_eq!(parse("SUCCESS"), TaskState::Success);
        assert_eq!(parse("ERROR"), TaskState::Error);
        assert_eq!(parse("FAILED"), TaskState::Failed);
        assert_eq!(parse("PENDING"), TaskState::Unknown);
        assert_eq!(parse("UNKNOWN"), TaskState::Unknown);
    }

    #[test]
    fn test_failure_states() {
        assert!(TaskState::Error.is_failure());
        assert!(TaskState::Failed.is_failure());
        assert!(!TaskState::Running.is_failure());
        assert!(!TaskState::Unknown.is_failure());
    }

    #[test]
    fn test_record_conversion() {
        let record: ReplicationRecord = serde_json::from_value(json!({
            "id": 4,
            "name": "offsite",
            "enabled": true,
            "direction": "PUSH",
            "transport": "SSH",
            "source_datasets": ["tank/data"],
            "target_dataset": "backup/data",
            "speed_limit": null,
            "state": {"state": "ERROR", "datetime": {"$date": 1_700_000_000_000i64},
                      "error": "connection refused"}
        }))
        .unwrap();

        let task = ReplicationTask::from(record);
        assert_eq!(task.id, 4);
        assert_eq!(task.name, "offsite");
        assert_eq!(task.state, TaskState::Error);
        assert_eq!(task.last_run_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(task.error.as_deref(), Some("connection refused"));
        assert_eq!(task.speed_limit, None);
    }

    #[test]
    fn test_record_without_state_or_name() {
        let record: ReplicationRecord = serde_json::from_value(json!({"id": 9})).unwrap();
        let task = ReplicationTask::from(record);
        assert_eq!(task.name, "Task 9");
        assert_eq!(task.state, TaskState::Unknown);
        assert!(task.last_run_at.is_none());
        assert!(!task.enabled);
    }

    #[test]
    fn test_job_conversion() {
        let wire: JobWire = serde_json::from_value(json!({
            "id": 812,
            "method": "replication.run",
            "arguments": [3],
            "state": "SUCCESS",
            "time_started": {"$date": 1_700_000_000_000i64},
            "time_finished": null
        }))
        .unwrap();

        let job = JobRecord::from(wire);
        assert_eq!(job.task_id, Some(3));
        assert_eq!(job.state, "SUCCESS");
        assert!(job.started_at.is_some());
        assert!(job.finished_at.is_none());
    }
}
