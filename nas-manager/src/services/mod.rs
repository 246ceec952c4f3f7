//! Snapshot and replication logic on top of the remote collaborators.
//!
//! The services never talk HTTP themselves. They work against the two traits
//! below, implemented by [`crate::client::TrueNasClient`] and by in-memory
//! fakes in tests.

pub mod capacity;
pub mod replication;
pub mod retention;
pub mod retry;
pub mod snapshots;

use async_trait::async_trait;

use crate::models::{JobHandle, ReplicationTask, Snapshot, TaskStatus};
use crate::Result;

/// List and delete snapshots.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// All snapshots, or only those of `dataset` when given.
    async fn list(&self, dataset: Option<&str>) -> Result<Vec<Snapshot>>;

    async fn delete(&self, snapshot_id: &str) -> Result<()>;
}

/// Trigger and observe replication tasks.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<ReplicationTask>>;

    async fn trigger(&self, task_id: u64) -> Result<JobHandle>;

    async fn get_state(&self, task_id: u64) -> Result<TaskStatus>;
}
