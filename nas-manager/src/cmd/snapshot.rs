use anyhow::{bail, Result};
use chrono::{DateTime, Local, TimeDelta, Utc};
use clap::{Args, Subcommand};
use nas_manager::models::{CreateSnapshotRequest, Snapshot};
use nas_manager::services::retention::{apply_retention, RetentionPolicy, Tier};
use nas_manager::services::snapshots::{self, bulk_delete, sort_snapshots, SnapshotFilter, SortKey};
use nas_manager::utils::time::parse_date;
use nas_manager::{Config, TrueNasClient};
use serde_json::{json, Map};

use super::{format_gib, format_size, format_time};

#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
    /// List snapshots
    List {
        /// Only this dataset (exact match)
        #[arg(short, long)]
        dataset: Option<String>,
        #[arg(long)]
        name_contains: Option<String>,
        #[arg(long)]
        dataset_contains: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        created_after: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        created_before: Option<String>,
        /// name, created or size
        #[arg(long, default_value = "created")]
        sort: SortKey,
        #[arg(long)]
        reverse: bool,
    },

    /// Create a snapshot
    Create {
        dataset: String,
        /// Defaults to the current local time
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        recursive: bool,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a snapshot
    Delete {
        snapshot_id: String,
        /// Defer destruction while the snapshot is held or cloned
        #[arg(long)]
        defer: bool,
    },

    /// Roll a dataset back to a snapshot
    Rollback {
        snapshot_id: String,
        /// Destroy newer snapshots if needed
        #[arg(short, long)]
        force: bool,
    },

    /// Clone a snapshot into a new dataset
    Clone { snapshot_id: String, new_dataset: String },

    /// Show one snapshot
    Info { snapshot_id: String },

    /// Size and age difference between two snapshots
    Compare { first: String, second: String },

    /// Apply a tiered retention policy to a dataset
    Retention {
        dataset: String,
        #[command(flatten)]
        policy: PolicyArgs,
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete all snapshots of a dataset matching a filter
    BulkDelete {
        #[arg(short, long)]
        dataset: String,
        #[arg(long)]
        name_contains: Option<String>,
        /// Only snapshots older than this many days
        #[arg(long)]
        older_than: Option<i64>,
        #[arg(long)]
        dry_run: bool,
    },
}

/// Per-tier keep counts; each overrides the configured `[retention]` value.
#[derive(Args, Debug, Default)]
pub struct PolicyArgs {
    #[arg(long)]
    hourly: Option<u32>,
    #[arg(long)]
    daily: Option<u32>,
    #[arg(long)]
    weekly: Option<u32>,
    #[arg(long)]
    monthly: Option<u32>,
}

impl PolicyArgs {
    fn policy_over(&self, base: RetentionPolicy) -> RetentionPolicy {
        base.merged(&RetentionPolicy {
            hourly: self.hourly,
            daily: self.daily,
            weekly: self.weekly,
            monthly: self.monthly,
        })
    }
}

pub async fn run(client: &TrueNasClient, config: &Config, command: SnapshotCommand) -> Result<()> {
    match command {
        SnapshotCommand::List {
            dataset,
            name_contains,
            dataset_contains,
            created_after,
            created_before,
            sort,
            reverse,
        } => {
            let filter = SnapshotFilter {
                dataset_contains,
                name_contains,
                created_after: created_after.as_deref().map(date_arg).transpose()?,
                // the whole day is included
                created_before: created_before
                    .as_deref()
                    .map(date_arg)
                    .transpose()?
                    .map(|d| d + TimeDelta::days(1) - TimeDelta::seconds(1)),
            };
            let mut list = filter.apply(client.snapshots(dataset.as_deref()).await?);
            sort_snapshots(&mut list, sort, reverse);
            print_table(&list);
        }

        SnapshotCommand::Create {
            dataset,
            name,
            recursive,
            comment,
        } => {
            let name = name.unwrap_or_else(|| Local::now().format("%Y%m%d-%H%M%S").to_string());
            let properties = comment.map(|c| {
                let mut props = Map::new();
                props.insert("org.truenas:comment".to_string(), json!(c));
                props
            });
            let snap = client
                .create_snapshot(&CreateSnapshotRequest {
                    dataset,
                    name,
                    recursive,
                    properties,
                })
                .await?;
            println!("Created snapshot {}", snap.id);
        }

        SnapshotCommand::Delete { snapshot_id, defer } => {
            client.delete_snapshot(&snapshot_id, defer).await?;
            println!("Deleted snapshot {}", snapshot_id);
        }

        SnapshotCommand::Rollback { snapshot_id, force } => {
            client.rollback_snapshot(&snapshot_id, force).await?;
            println!("Rolled back to {}", snapshot_id);
        }

        SnapshotCommand::Clone {
            snapshot_id,
            new_dataset,
        } => {
            client.clone_snapshot(&snapshot_id, &new_dataset).await?;
            println!("Cloned {} to {}", snapshot_id, new_dataset);
        }

        SnapshotCommand::Info { snapshot_id } => {
            let snap = client.snapshot(&snapshot_id).await?;
            println!("ID:      {}", snap.id);
            println!("Dataset: {}", snap.dataset);
            println!("Name:    {}", snap.name);
            println!("Created: {}", format_time(snap.created_at));
            println!("Used:    {}", format_size(snap.used_bytes));
        }

        SnapshotCommand::Compare { first, second } => {
            let a = client.snapshot(&first).await?;
            let b = client.snapshot(&second).await?;
            let cmp = snapshots::compare(&a, &b);
            println!("{:<10} {:<40} {:<40}", "", a.id, b.id);
            println!(
                "{:<10} {:<40} {:<40}",
                "Created",
                format_time(a.created_at),
                format_time(b.created_at)
            );
            println!(
                "{:<10} {:<40} {:<40}",
                "Used",
                format_size(a.used_bytes),
                format_size(b.used_bytes)
            );
            println!("Size difference: {}", format_size(cmp.size_diff_bytes));
            match cmp.time_diff {
                Some(diff) => println!(
                    "Time difference: {}d {}h {}m",
                    diff.num_days(),
                    diff.num_hours() % 24,
                    diff.num_minutes() % 60
                ),
                None => println!("Time difference: unknown"),
            }
        }

        SnapshotCommand::Retention {
            dataset,
            policy,
            dry_run,
        } => {
            let policy = policy.policy_over(config.retention);
            if policy.is_empty() {
                bail!("no retention tiers configured; pass --hourly/--daily/--weekly/--monthly or set [retention]");
            }

            let report = apply_retention(client, &dataset, &policy, Utc::now(), dry_run).await?;

            for tier in Tier::ALL {
                if let Some(count) = policy.count(tier) {
                    println!("{:<8} keep {:>3}, kept {:>3}", tier, count, report.decision.kept_in(tier));
                }
            }
            if !report.decision.deleted.is_empty() {
                println!();
                println!("{}:", if dry_run { "Would delete" } else { "Deleting" });
                print_table(&report.decision.deleted);
            }
            for failure in &report.failures {
                eprintln!("Failed to delete {}: {}", failure.snapshot_id, failure.error);
            }
            println!();
            println!("{}", report.message());
        }

        SnapshotCommand::BulkDelete {
            dataset,
            name_contains,
            older_than,
            dry_run,
        } => {
            let filter = SnapshotFilter {
                name_contains,
                created_before: older_than.map(|days| Utc::now() - TimeDelta::days(days)),
                ..Default::default()
            };
            let report = bulk_delete(client, &dataset, &filter, dry_run).await?;
            print_table(&report.matched);
            for failure in &report.failures {
                eprintln!("Failed to delete {}: {}", failure.snapshot_id, failure.error);
            }
            if dry_run {
                println!("Would delete {} snapshots", report.matched.len());
            } else {
                println!("Deleted {} of {} snapshots", report.deleted_count(), report.matched.len());
            }
        }
    }
    Ok(())
}

fn date_arg(raw: &str) -> Result<DateTime<Utc>> {
    parse_date(raw).ok_or_else(|| anyhow::anyhow!("invalid date '{}', expected YYYY-MM-DD", raw))
}

fn print_table(list: &[Snapshot]) {
    if list.is_empty() {
        println!("No snapshots found");
        return;
    }
    println!("{:<30} {:<30} {:<20} {:>12}", "DATASET", "NAME", "CREATED", "USED");
    for snap in list {
        println!(
            "{:<30} {:<30} {:<20} {:>12}",
            snap.dataset,
            snap.name,
            format_time(snap.created_at),
            format_gib(snap.used_bytes)
        );
    }
    println!("{} snapshot(s)", list.len());
}
