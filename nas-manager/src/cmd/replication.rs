use anyhow::{bail, Result};
use chrono::Utc;
use clap::Subcommand;
use nas_manager::models::ReplicationTask;
use nas_manager::services::replication::{filter_tasks, replication_history, statistics};
use nas_manager::services::retry::{wait_outcome, RetryController, WaitOutcome};
use nas_manager::{Config, TrueNasClient};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{format_time, or_dash};

#[derive(Subcommand, Debug)]
pub enum ReplicationCommand {
    /// List replication tasks
    List {
        #[arg(long)]
        enabled_only: bool,
        #[arg(long)]
        failed_only: bool,
    },

    /// Show one task in detail
    Status { task_id: u64 },

    /// Start a task now
    Run {
        task_id: u64,
        /// Block until the task finishes
        #[arg(short, long)]
        wait: bool,
        /// Seconds to wait (default: replication.wait_timeout_secs)
        #[arg(long)]
        timeout: Option<u64>,
    },

    Enable { task_id: u64 },

    Disable { task_id: u64 },

    /// Set or clear a task's bandwidth limit
    Bandwidth {
        task_id: u64,
        /// KiB/s; 0 or absent removes the limit
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Re-run every task in ERROR/FAILED state
    RetryFailed {
        /// Attempts per task
        #[arg(long)]
        max_retries: Option<u32>,
        /// Seconds between attempts
        #[arg(long)]
        delay: Option<u64>,
        /// Tasks retried at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Aggregate task counts
    Stats {
        #[arg(long)]
        task_id: Option<u64>,
    },

    /// Recent replication jobs
    History {
        #[arg(long)]
        task_id: Option<u64>,
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Refresh the task table until Ctrl-C
    Monitor {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 5)]
        refresh: u64,
    },
}

pub async fn run(client: &TrueNasClient, config: &Config, command: ReplicationCommand) -> Result<()> {
    match command {
        ReplicationCommand::List {
            enabled_only,
            failed_only,
        } => {
            let tasks = filter_tasks(client.replication_tasks().await?, enabled_only, failed_only);
            print_table(&tasks);
        }

        ReplicationCommand::Status { task_id } => {
            let task = client.replication_task(task_id).await?;
            println!("ID:        {}", task.id);
            println!("Name:      {}", task.name);
            println!("Enabled:   {}", task.enabled);
            println!("State:     {}", task.state);
            println!("Last run:  {}", format_time(task.last_run_at));
            println!("Snapshot:  {}", or_dash(task.last_snapshot.as_deref()));
            println!("Source:    {}", task.source_datasets.join(", "));
            println!("Target:    {}", or_dash(task.target_dataset.as_deref()));
            println!("Direction: {}", or_dash(task.direction.as_deref()));
            println!("Transport: {}", or_dash(task.transport.as_deref()));
            println!("Recursive: {}", task.recursive);
            match task.speed_limit {
                Some(limit) => println!("Bandwidth: {} KiB/s", limit),
                None => println!("Bandwidth: unlimited"),
            }
            if let Some(error) = &task.error {
                println!("Error:     {}", error);
            }
        }

        ReplicationCommand::Run {
            task_id,
            wait,
            timeout,
        } => {
            let job = client.run_replication(task_id).await?;
            println!("Started replication task {} (job {})", task_id, job);

            if wait {
                let policy = config.replication.retry_policy();
                let timeout = timeout.map(Duration::from_secs).unwrap_or(policy.wait_timeout);
                match wait_outcome(client, task_id, timeout, policy.poll_interval).await {
                    WaitOutcome::Succeeded => println!("Replication task {} completed", task_id),
                    WaitOutcome::Failed => bail!("replication task {} failed", task_id),
                    WaitOutcome::TimedOut => {
                        bail!("replication task {} did not finish within {}s", task_id, timeout.as_secs())
                    }
                }
            }
        }

        ReplicationCommand::Enable { task_id } => {
            let task = client.set_replication_enabled(task_id, true).await?;
            println!("Enabled replication task {} ({})", task.id, task.name);
        }

        ReplicationCommand::Disable { task_id } => {
            let task = client.set_replication_enabled(task_id, false).await?;
            println!("Disabled replication task {} ({})", task.id, task.name);
        }

        ReplicationCommand::Bandwidth { task_id, limit } => {
            let limit = limit.filter(|kbps| *kbps > 0);
            client.set_bandwidth_limit(task_id, limit).await?;
            match limit {
                Some(kbps) => println!("Limited task {} to {} KiB/s", task_id, kbps),
                None => println!("Removed bandwidth limit from task {}", task_id),
            }
        }

        ReplicationCommand::RetryFailed {
            max_retries,
            delay,
            concurrency,
        } => {
            let mut policy = config.replication.retry_policy();
            if let Some(n) = max_retries {
                policy.max_retries = n;
            }
            if let Some(secs) = delay {
                policy.retry_delay = Duration::from_secs(secs);
            }
            if let Some(n) = concurrency {
                policy.concurrency = n;
            }

            let controller = RetryController::new(client, policy)?;
            let policy = controller.policy();
            info!(
                max_retries = policy.max_retries,
                delay_secs = policy.retry_delay.as_secs(),
                concurrency = policy.concurrency,
                "Retrying failed replication tasks"
            );
            let outcome = controller.retry_failed().await?;
            if outcome.total_failed == 0 {
                println!("No failed replication tasks");
                return Ok(());
            }

            for report in &outcome.reports {
                let status = if report.succeeded { "OK" } else { "FAILED" };
                println!(
                    "{:<6} {:<30} attempts: {}{}",
                    status,
                    report.name,
                    report.attempts,
                    report
                        .last_error
                        .as_deref()
                        .map(|e| format!(" ({})", e))
                        .unwrap_or_default()
                );
            }
            println!(
                "Retried {}: {} succeeded, {} still failed",
                outcome.total_failed,
                outcome.succeeded.len(),
                outcome.still_failed.len()
            );
            if !outcome.still_failed.is_empty() {
                bail!("still failing: {}", outcome.still_failed.join(", "));
            }
        }

        ReplicationCommand::Stats { task_id } => {
            let mut tasks = client.replication_tasks().await?;
            if let Some(id) = task_id {
                tasks.retain(|t| t.id == id);
                if tasks.is_empty() {
                    bail!("replication task {} not found", id);
                }
            }
            let stats = statistics(&tasks, Utc::now());
            println!("Total tasks:   {}", stats.total_tasks);
            println!("Enabled:       {}", stats.enabled);
            println!("Disabled:      {}", stats.disabled);
            println!("Running:       {}", stats.running);
            println!("Success:       {}", stats.success);
            println!("Error:         {}", stats.error);
            println!("Never run:     {}", stats.never_run);
            println!("Ran in 24h:    {}", stats.last_24h);
        }

        ReplicationCommand::History { task_id, days } => {
            let jobs = replication_history(client.jobs().await?, task_id, days, Utc::now());
            if jobs.is_empty() {
                println!("No replication jobs in the last {} days", days);
                return Ok(());
            }
            println!("{:<8} {:<8} {:<10} {:<20} {:<20}", "JOB", "TASK", "STATE", "STARTED", "FINISHED");
            for job in &jobs {
                println!(
                    "{:<8} {:<8} {:<10} {:<20} {:<20}",
                    job.id,
                    job.task_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                    job.state,
                    format_time(job.started_at),
                    format_time(job.finished_at)
                );
            }
        }

        ReplicationCommand::Monitor { refresh } => monitor(client, Duration::from_secs(refresh.max(1))).await?,
    }
    Ok(())
}

async fn monitor(client: &TrueNasClient, refresh: Duration) -> Result<()> {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    info!(refresh_secs = refresh.as_secs(), "Monitoring replication tasks");

    loop {
        match client.replication_tasks().await {
            Ok(tasks) => {
                println!("Replication status at {}", format_time(Some(Utc::now())));
                print_table(&tasks);
                println!();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to fetch replication tasks"),
        }

        tokio::select! {
            _ = tokio::time::sleep(refresh) => {}
            _ = shutdown.cancelled() => {
                info!("Monitor stopped");
                return Ok(());
            }
        }
    }
}

fn print_table(tasks: &[ReplicationTask]) {
    if tasks.is_empty() {
        println!("No replication tasks found");
        return;
    }
    println!("{:<5} {:<30} {:<8} {:<10} {:<20}", "ID", "NAME", "ENABLED", "STATE", "LAST RUN");
    for task in tasks {
        println!(
            "{:<5} {:<30} {:<8} {:<10} {:<20}",
            task.id,
            task.name,
            if task.enabled { "yes" } else { "no" },
            task.state,
            format_time(task.last_run_at)
        );
    }
}
