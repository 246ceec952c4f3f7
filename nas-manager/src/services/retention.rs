//! Tiered snapshot retention.
//!
//! Snapshots are walked newest first. Each one belongs to the first
//! configured tier whose age window contains it and is kept while that tier
//! still has capacity. A snapshot whose tier is full is deleted; it does not
//! spill into a wider tier.
//!
//! The older cleanup script's cascading tier check let an overflow fall into
//! the next tier; that spill is intentionally not reproduced here.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::snapshots::{delete_each, DeleteFailure};
use super::SnapshotRepository;
use crate::models::Snapshot;
use crate::Result;

// ── Tier ──

/// Retention tiers in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Hourly, Tier::Daily, Tier::Weekly, Tier::Monthly];

    /// Oldest age a snapshot may have to fall in this tier (inclusive).
    pub fn max_age(self) -> TimeDelta {
        match self {
            Tier::Hourly => TimeDelta::hours(1),
            Tier::Daily => TimeDelta::days(1),
            Tier::Weekly => TimeDelta::weeks(1),
            Tier::Monthly => TimeDelta::days(30),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Hourly => "hourly",
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Monthly => "monthly",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ── Policy ──

/// Keep counts per tier. `None` means the tier is not evaluated at all,
/// which differs from `Some(0)`: an unconfigured tier lets its snapshots
/// fall through to the next configured one, a zero tier claims and deletes
/// them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<u32>,
}

impl RetentionPolicy {
    pub fn count(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Hourly => self.hourly,
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
        }
    }

    pub fn set(&mut self, tier: Tier, count: Option<u32>) {
        match tier {
            Tier::Hourly => self.hourly = count,
            Tier::Daily => self.daily = count,
            Tier::Weekly => self.weekly = count,
            Tier::Monthly => self.monthly = count,
        }
    }

    /// Configured tiers with their counts, in evaluation order.
    pub fn tiers(&self) -> impl Iterator<Item = (Tier, u32)> + '_ {
        Tier::ALL
            .into_iter()
            .filter_map(|tier| self.count(tier).map(|n| (tier, n)))
    }

    pub fn is_empty(&self) -> bool {
        self.tiers().next().is_none()
    }

    /// Overlay the tiers set in `other` on top of this policy.
    pub fn merged(mut self, other: &RetentionPolicy) -> RetentionPolicy {
        for (tier, count) in other.tiers() {
            self.set(tier, Some(count));
        }
        self
    }

    /// The tier a snapshot of this age belongs to, if any.
    pub fn tier_for(&self, age: TimeDelta) -> Option<(Tier, u32)> {
        self.tiers().find(|(tier, _)| age <= tier.max_age())
    }
}

// ── Decision ──

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetentionDecision {
    /// Kept snapshots, newest first
    pub kept: Vec<Snapshot>,
    /// Deleted snapshots, newest first
    pub deleted: Vec<Snapshot>,
    /// Tier that claimed each entry of `kept`
    pub kept_tiers: Vec<Tier>,
}

impl RetentionDecision {
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty() && self.deleted.is_empty()
    }

    pub fn kept_in(&self, tier: Tier) -> usize {
        self.kept_tiers.iter().filter(|t| **t == tier).count()
    }

    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no snapshots found".to_string();
        }
        format!("{} to delete, {} kept", self.deleted.len(), self.kept.len())
    }
}

/// Partition `snapshots` into kept and deleted under `policy` at `now`.
pub fn classify(mut snapshots: Vec<Snapshot>, policy: &RetentionPolicy, now: DateTime<Utc>) -> RetentionDecision {
    // newest first; sort_by is stable so equal timestamps keep input order
    snapshots.sort_by(|a, b| b.created_or_min().cmp(&a.created_or_min()));

    let mut used = [0u32; Tier::ALL.len()];
    let mut decision = RetentionDecision::default();

    for snap in snapshots {
        let claimed = snap
            .created_at
            .and_then(|created| policy.tier_for(now - created))
            .filter(|(tier, capacity)| used[tier.index()] < *capacity)
            .map(|(tier, _)| tier);

        match claimed {
            Some(tier) => {
                used[tier.index()] += 1;
                decision.kept.push(snap);
                decision.kept_tiers.push(tier);
            }
            None => decision.deleted.push(snap),
        }
    }

    decision
}

// ── Apply ──

#[derive(Debug, Clone)]
pub struct RetentionReport {
    pub dataset: String,
    pub decision: RetentionDecision,
    pub dry_run: bool,
    pub failures: Vec<DeleteFailure>,
}

impl RetentionReport {
    pub fn deleted_count(&self) -> usize {
        if self.dry_run {
            0
        } else {
            self.decision.deleted.len() - self.failures.len()
        }
    }

    pub fn message(&self) -> String {
        if self.decision.is_empty() {
            return "No snapshots found".to_string();
        }
        let kept = self.decision.kept.len();
        let deleted = self.decision.deleted.len();
        if self.dry_run {
            format!("Would delete {} snapshots, kept {}", deleted, kept)
        } else if self.failures.is_empty() {
            format!("Deleted {} snapshots, kept {}", deleted, kept)
        } else {
            format!(
                "Deleted {} of {} snapshots ({} failed), kept {}",
                self.deleted_count(),
                deleted,
                self.failures.len(),
                kept
            )
        }
    }
}

/// Classify the snapshots of `dataset` and, unless `dry_run`, delete the
/// losers. Individual delete failures end up in the report.
pub async fn apply_retention(
    repo: &dyn SnapshotRepository,
    dataset: &str,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<RetentionReport> {
    let snapshots = repo.list(Some(dataset)).await?;
    let decision = classify(snapshots, policy, now);

    info!(
        dataset,
        kept = decision.kept.len(),
        deleted = decision.deleted.len(),
        dry_run,
        "Retention decision"
    );

    let failures = if dry_run {
        Vec::new()
    } else {
        delete_each(repo, &decision.deleted).await
    };

    Ok(RetentionReport {
        dataset: dataset.to_string(),
        decision,
        dry_run,
        failures,
    })
}
