use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::time::{parse_remote_time, parse_timestamp};

// ── Snapshot ──

/// A point-in-time capture of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// `pool/dataset@name`, unique across the system
    pub id: String,
    pub dataset: String,
    /// Short label after the `@`, unique only within a dataset
    pub name: String,
    /// `None` when the remote creation time could not be parsed
    pub created_at: Option<DateTime<Utc>>,
    pub used_bytes: u64,
}

impl Snapshot {
    /// Sort key where unparseable creation times compare as the oldest.
    pub fn created_or_min(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

// ── Wire format ──

/// One entry of `GET zfs/snapshot`.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub snapshot_name: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub properties: SnapshotProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotProperties {
    #[serde(default)]
    pub creation: Option<ZfsProperty>,
    #[serde(default)]
    pub used: Option<ZfsProperty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZfsProperty {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub rawvalue: Option<String>,
    #[serde(default)]
    pub parsed: Value,
}

impl ZfsProperty {
    fn as_time(&self) -> Option<DateTime<Utc>> {
        parse_remote_time(&self.parsed)
            .or_else(|| parse_remote_time(&self.value))
            .or_else(|| self.rawvalue.as_deref().and_then(parse_timestamp))
    }

    pub(crate) fn as_text(&self) -> Option<String> {
        self.value
            .as_str()
            .map(str::to_string)
            .or_else(|| self.rawvalue.clone())
    }

    pub(crate) fn as_bytes(&self) -> Option<u64> {
        self.parsed
            .as_u64()
            .or_else(|| self.rawvalue.as_deref().and_then(|r| r.parse().ok()))
    }
}

impl From<SnapshotRecord> for Snapshot {
    fn from(record: SnapshotRecord) -> Self {
        let full = if record.name.is_empty() { record.id.clone() } else { record.name.clone() };
        let (prefix, suffix) = match full.split_once('@') {
            Some((ds, snap)) => (Some(ds.to_string()), snap.to_string()),
            None => (None, full.clone()),
        };

        let dataset = record.dataset.or(prefix).unwrap_or_default();
        let name = record.snapshot_name.unwrap_or(suffix);
        let created_at = record.properties.creation.as_ref().and_then(ZfsProperty::as_time);
        let used_bytes = record
            .properties
            .used
            .as_ref()
            .and_then(ZfsProperty::as_bytes)
            .unwrap_or(0);

        Snapshot {
            id: record.id,
            dataset,
            name,
            created_at,
            used_bytes,
        }
    }
}

/// Body of `POST zfs/snapshot`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSnapshotRequest {
    pub dataset: String,
    pub name: String,
    pub recursive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Map<String, Value>>,
}
