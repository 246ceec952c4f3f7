use reqwest::Method;
use serde_json::Value;

use super::{segment, TrueNasClient};
use crate::models::dataset::DatasetRecord;
use crate::models::{CreateDatasetRequest, Dataset, UpdateDatasetRequest};
use crate::Result;

impl TrueNasClient {
    /// All datasets, or only those of `pool` when given.
    pub async fn datasets(&self, pool: Option<&str>) -> Result<Vec<Dataset>> {
        let records: Vec<DatasetRecord> = self.get("pool/dataset").await?;
        Ok(records
            .into_iter()
            .map(Dataset::from)
            .filter(|ds| pool.map_or(true, |p| ds.in_pool(p)))
            .collect())
    }

    pub async fn create_dataset(&self, request: &CreateDatasetRequest) -> Result<Dataset> {
        let record: DatasetRecord = self
            .post("pool/dataset", Some(serde_json::to_value(request)?))
            .await?;
        Ok(record.into())
    }

    pub async fn delete_dataset(&self, dataset_id: &str, recursive: bool) -> Result<()> {
        let endpoint = format!("pool/dataset/id/{}?recursive={}", segment(dataset_id), recursive);
        let _: Value = self.request(Method::DELETE, &endpoint, None).await?;
        Ok(())
    }

    pub async fn update_dataset(&self, dataset_id: &str, changes: &UpdateDatasetRequest) -> Result<Dataset> {
        let record: DatasetRecord = self
            .put(
                &format!("pool/dataset/id/{}", segment(dataset_id)),
                serde_json::to_value(changes)?,
            )
            .await?;
        Ok(record.into())
    }
}
