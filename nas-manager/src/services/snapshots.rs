//! Snapshot filtering, sorting and bulk deletion.

use chrono::{DateTime, TimeDelta, Utc};
use std::str::FromStr;
use tracing::{info, warn};

use super::SnapshotRepository;
use crate::models::Snapshot;
use crate::{NasError, Result};

/// A snapshot the repository refused to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub snapshot_id: String,
    pub error: String,
}

/// Delete snapshots one by one, in order. A failure is logged and recorded,
/// and the remaining deletes still run.
pub async fn delete_each(repo: &dyn SnapshotRepository, snapshots: &[Snapshot]) -> Vec<DeleteFailure> {
    let mut failures = Vec::new();

    for snap in snapshots {
        match repo.delete(&snap.id).await {
            Ok(()) => info!(snapshot = %snap.id, "Deleted snapshot"),
            Err(e) => {
                warn!(snapshot = %snap.id, error = %e, "Failed to delete snapshot");
                failures.push(DeleteFailure {
                    snapshot_id: snap.id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    failures
}

// ── Filtering ──

/// Criteria for narrowing a snapshot listing. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFilter {
    pub dataset_contains: Option<String>,
    pub name_contains: Option<String>,
    /// Inclusive lower bound on creation time
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time
    pub created_before: Option<DateTime<Utc>>,
}

impl SnapshotFilter {
    pub fn is_empty(&self) -> bool {
        self.dataset_contains.is_none()
            && self.name_contains.is_none()
            && self.created_after.is_none()
            && self.created_before.is_none()
    }

    pub fn matches(&self, snap: &Snapshot) -> bool {
        if let Some(needle) = &self.dataset_contains {
            if !snap.dataset.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !snap.name.contains(needle.as_str()) {
                return false;
            }
        }
        // an unknown creation time never satisfies a date bound
        if let Some(after) = self.created_after {
            if !snap.created_at.is_some_and(|c| c >= after) {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if !snap.created_at.is_some_and(|c| c <= before) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
        snapshots.into_iter().filter(|s| self.matches(s)).collect()
    }
}

// ── Sorting ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Name,
    #[default]
    Created,
    Size,
}

impl FromStr for SortKey {
    type Err = NasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "created" => Ok(SortKey::Created),
            "size" => Ok(SortKey::Size),
            other => Err(NasError::InvalidInput(format!(
                "unknown sort key '{}' (expected name, created or size)",
                other
            ))),
        }
    }
}

/// Stable ascending sort by `key`, descending when `reverse` is set.
pub fn sort_snapshots(snapshots: &mut [Snapshot], key: SortKey, reverse: bool) {
    match key {
        SortKey::Name => snapshots.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::Created => snapshots.sort_by_key(Snapshot::created_or_min),
        SortKey::Size => snapshots.sort_by_key(|s| s.used_bytes),
    }
    if reverse {
        snapshots.reverse();
    }
}

// ── Bulk delete ──

#[derive(Debug, Clone)]
pub struct BulkDeleteReport {
    pub matched: Vec<Snapshot>,
    pub failures: Vec<DeleteFailure>,
    pub dry_run: bool,
}

impl BulkDeleteReport {
    pub fn deleted_count(&self) -> usize {
        if self.dry_run {
            0
        } else {
            self.matched.len() - self.failures.len()
        }
    }
}

/// Delete every snapshot of `dataset` matching `filter`.
pub async fn bulk_delete(
    repo: &dyn SnapshotRepository,
    dataset: &str,
    filter: &SnapshotFilter,
    dry_run: bool,
) -> Result<BulkDeleteReport> {
    let matched = filter.apply(repo.list(Some(dataset)).await?);
    info!(dataset, matched = matched.len(), dry_run, "Bulk delete");

    let failures = if dry_run {
        Vec::new()
    } else {
        delete_each(repo, &matched).await
    };

    Ok(BulkDeleteReport {
        matched,
        failures,
        dry_run,
    })
}

// ── Compare ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotComparison {
    /// Absolute difference in bytes held
    pub size_diff_bytes: u64,
    /// Absolute difference in creation time, `None` if either is unknown
    pub time_diff: Option<TimeDelta>,
}

pub fn compare(a: &Snapshot, b: &Snapshot) -> SnapshotComparison {
    SnapshotComparison {
        size_diff_bytes: a.used_bytes.abs_diff(b.used_bytes),
        time_diff: match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => Some((y - x).abs()),
            _ => None,
        },
    }
}
