use async_trait::async_trait;
use serde_json::{json, Value};

use super::TrueNasClient;
use crate::models::replication::{JobWire, ReplicationRecord};
use crate::models::{JobHandle, JobRecord, ReplicationTask, TaskStatus};
use crate::services::TaskRunner;
use crate::Result;

impl TrueNasClient {
    pub async fn replication_tasks(&self) -> Result<Vec<ReplicationTask>> {
        let records: Vec<ReplicationRecord> = self.get("replication").await?;
        Ok(records.into_iter().map(ReplicationTask::from).collect())
    }

    pub async fn replication_task(&self, task_id: u64) -> Result<ReplicationTask> {
        let record: ReplicationRecord = self.get(&format!("replication/id/{}", task_id)).await?;
        Ok(record.into())
    }

    /// Start a task now; returns the middleware job id.
    pub async fn run_replication(&self, task_id: u64) -> Result<JobHandle> {
        self.post(&format!("replication/id/{}/run", task_id), None).await
    }

    pub async fn update_replication(&self, task_id: u64, changes: Value) -> Result<ReplicationTask> {
        let record: ReplicationRecord = self
            .put(&format!("replication/id/{}", task_id), changes)
            .await?;
        Ok(record.into())
    }

    pub async fn set_replication_enabled(&self, task_id: u64, enabled: bool) -> Result<ReplicationTask> {
        self.update_replication(task_id, json!({ "enabled": enabled })).await
    }

    /// `None` removes the limit.
    pub async fn set_bandwidth_limit(&self, task_id: u64, limit_kbps: Option<u64>) -> Result<ReplicationTask> {
        self.update_replication(task_id, json!({ "speed_limit": limit_kbps })).await
    }

    pub async fn jobs(&self) -> Result<Vec<JobRecord>> {
        let jobs: Vec<JobWire> = self.get("core/get_jobs").await?;
        Ok(jobs.into_iter().map(JobRecord::from).collect())
    }
}

#[async_trait]
impl TaskRunner for TrueNasClient {
    async fn list_tasks(&self) -> Result<Vec<ReplicationTask>> {
        self.replication_tasks().await
    }

    async fn trigger(&self, task_id: u64) -> Result<JobHandle> {
        self.run_replication(task_id).await
    }

    async fn get_state(&self, task_id: u64) -> Result<TaskStatus> {
        Ok(self.replication_task(task_id).await?.status())
    }
}
