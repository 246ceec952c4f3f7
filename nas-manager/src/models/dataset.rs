use serde::{Deserialize, Serialize};

use super::snapshot::ZfsProperty;

/// A ZFS filesystem or volume from `GET pool/dataset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    /// `pool/child/...`
    pub id: String,
    pub name: String,
    pub pool: String,
    /// `FILESYSTEM` or `VOLUME`
    pub kind: String,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub compression: Option<String>,
    /// `None` when no quota is set
    pub quota_bytes: Option<u64>,
    pub mountpoint: Option<String>,
}

impl Dataset {
    /// True for the pool's root dataset and everything below it.
    pub fn in_pool(&self, pool: &str) -> bool {
        self.pool == pool
            || self
                .name
                .strip_prefix(pool)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

// ── Wire format ──

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub used: Option<ZfsProperty>,
    #[serde(default)]
    pub available: Option<ZfsProperty>,
    #[serde(default)]
    pub compression: Option<ZfsProperty>,
    #[serde(default)]
    pub quota: Option<ZfsProperty>,
    #[serde(default)]
    pub mountpoint: Option<String>,
}

impl From<DatasetRecord> for Dataset {
    fn from(record: DatasetRecord) -> Self {
        let name = record.name.unwrap_or_else(|| record.id.clone());
        let pool = record
            .pool
            .unwrap_or_else(|| name.split('/').next().unwrap_or_default().to_string());
        let bytes = |prop: &Option<ZfsProperty>| prop.as_ref().and_then(ZfsProperty::as_bytes);

        Dataset {
            used_bytes: bytes(&record.used).unwrap_or(0),
            available_bytes: bytes(&record.available).unwrap_or(0),
            // a zero quota means "none"
            quota_bytes: bytes(&record.quota).filter(|q| *q > 0),
            compression: record.compression.as_ref().and_then(ZfsProperty::as_text),
            kind: record.kind.unwrap_or_else(|| "FILESYSTEM".to_string()),
            mountpoint: record.mountpoint,
            id: record.id,
            name,
            pool,
        }
    }
}

/// Body of `POST pool/dataset`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDatasetRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    /// Bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<u64>,
}

/// Body of `PUT pool/dataset/id/{id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateDatasetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    /// Bytes, `Some(0)` removes the quota
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl UpdateDatasetRequest {
    pub fn is_empty(&self) -> bool {
        self.compression.is_none() && self.quota.is_none() && self.comments.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_conversion() {
        let record: DatasetRecord = serde_json::from_value(json!({
            "id": "tank/media",
            "name": "tank/media",
            "pool": "tank",
            "type": "FILESYSTEM",
            "mountpoint": "/mnt/tank/media",
            "used": {"parsed": 2048, "rawvalue": "2048", "value": "2K"},
            "available": {"parsed": null, "rawvalue": "4096", "value": "4K"},
            "compression": {"parsed": "lz4", "rawvalue": "lz4", "value": "LZ4"},
            "quota": {"parsed": 0, "rawvalue": "0", "value": null}
        }))
        .unwrap();

        let ds = Dataset::from(record);
        assert_eq!(ds.pool, "tank");
        assert_eq!(ds.used_bytes, 2048);
        assert_eq!(ds.available_bytes, 4096);
        assert_eq!(ds.compression.as_deref(), Some("LZ4"));
        assert_eq!(ds.quota_bytes, None);
        assert_eq!(ds.mountpoint.as_deref(), Some("/mnt/tank/media"));
    }

    #[test]
    fn test_minimal_record_derives_pool() {
        let record: DatasetRecord = serde_json::from_value(json!({"id": "fast/vm/disk0", "type": "VOLUME"})).unwrap();

        let ds = Dataset::from(record);
        assert_eq!(ds.name, "fast/vm/disk0");
        assert_eq!(ds.pool, "fast");
        assert_eq!(ds.kind, "VOLUME");
        assert_eq!(ds.compression, None);
    }

    #[test]
    fn test_in_pool_matches_whole_segment() {
        let record: DatasetRecord = serde_json::from_value(json!({"id": "tank2/data"})).unwrap();
        let ds = Dataset::from(record);

        assert!(ds.in_pool("tank2"));
        assert!(!ds.in_pool("tank"));
    }

    #[test]
    fn test_update_request_skips_unset_fields() {
        let req = UpdateDatasetRequest {
            quota: Some(0),
            ..Default::default()
        };
        assert!(!req.is_empty());
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"quota": 0}));
        assert!(UpdateDatasetRequest::default().is_empty());
    }
}
