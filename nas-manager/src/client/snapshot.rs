use async_trait::async_trait;
use serde_json::{json, Value};

use super::{segment, TrueNasClient};
use crate::models::snapshot::SnapshotRecord;
use crate::models::{CreateSnapshotRequest, Snapshot};
use crate::services::SnapshotRepository;
use crate::Result;

impl TrueNasClient {
    /// All snapshots, filtered to `dataset` client-side when given.
    pub async fn snapshots(&self, dataset: Option<&str>) -> Result<Vec<Snapshot>> {
        let records: Vec<SnapshotRecord> = self.get("zfs/snapshot").await?;
        Ok(records
            .into_iter()
            .map(Snapshot::from)
            .filter(|s| dataset.map_or(true, |d| s.dataset == d))
            .collect())
    }

    pub async fn snapshot(&self, snapshot_id: &str) -> Result<Snapshot> {
        let record: SnapshotRecord = self
            .get(&format!("zfs/snapshot/id/{}", segment(snapshot_id)))
            .await?;
        Ok(record.into())
    }

    pub async fn create_snapshot(&self, request: &CreateSnapshotRequest) -> Result<Snapshot> {
        let record: SnapshotRecord = self
            .post("zfs/snapshot", Some(serde_json::to_value(request)?))
            .await?;
        Ok(record.into())
    }

    pub async fn delete_snapshot(&self, snapshot_id: &str, defer: bool) -> Result<()> {
        let endpoint = format!("zfs/snapshot/id/{}?defer={}", segment(snapshot_id), defer);
        let _: Value = self.request(reqwest::Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    pub async fn rollback_snapshot(&self, snapshot_id: &str, force: bool) -> Result<()> {
        let endpoint = format!("zfs/snapshot/id/{}/rollback", segment(snapshot_id));
        let _: Value = self.post(&endpoint, Some(json!({ "force": force }))).await?;
        Ok(())
    }

    pub async fn clone_snapshot(&self, snapshot_id: &str, dataset_dst: &str) -> Result<()> {
        let endpoint = format!("zfs/snapshot/id/{}/clone", segment(snapshot_id));
        let _: Value = self
            .post(&endpoint, Some(json!({ "dataset_dst": dataset_dst })))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotRepository for TrueNasClient {
    async fn list(&self, dataset: Option<&str>) -> Result<Vec<Snapshot>> {
        self.snapshots(dataset).await
    }

    async fn delete(&self, snapshot_id: &str) -> Result<()> {
        self.delete_snapshot(snapshot_id, false).await
    }
}
