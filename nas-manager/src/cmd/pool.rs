use anyhow::Result;
use clap::Subcommand;
use nas_manager::services::capacity::capacity_alerts;
use nas_manager::TrueNasClient;

use super::format_gib;

#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    /// List pools with usage
    List,

    /// Show one pool
    Status { pool_name: String },

    /// Report pools at or above a usage threshold
    CheckCapacity {
        /// Usage percentage that triggers an alert
        #[arg(long, default_value_t = 80.0)]
        threshold: f64,
    },
}

pub async fn run(client: &TrueNasClient, command: PoolCommand) -> Result<()> {
    match command {
        PoolCommand::List => {
            let pools = client.pools().await?;
            println!("{:<20} {:<10} {:>12} {:>12} {:>7}", "NAME", "STATUS", "SIZE", "FREE", "USED");
            for pool in &pools {
                let used = pool
                    .usage_pct()
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<20} {:<10} {:>12} {:>12} {:>7}",
                    pool.name,
                    pool.status,
                    format_gib(pool.size),
                    format_gib(pool.free()),
                    used
                );
            }
        }
        PoolCommand::Status { pool_name } => {
            let pool = client.pool(&pool_name).await?;
            println!("Name:      {}", pool.name);
            println!("Status:    {}", pool.status);
            println!("Healthy:   {}", if pool.healthy { "yes" } else { "no" });
            println!("Size:      {}", format_gib(pool.size));
            println!("Allocated: {}", format_gib(pool.allocated));
            println!("Free:      {}", format_gib(pool.free()));
            match pool.usage_pct() {
                Some(pct) => println!("Usage:     {:.1}%", pct),
                None => println!("Usage:     -"),
            }
        }
        PoolCommand::CheckCapacity { threshold } => {
            let alerts = capacity_alerts(&client.pools().await?, threshold);
            if alerts.is_empty() {
                println!("All pools below {:.0}% capacity", threshold);
                return Ok(());
            }
            for alert in &alerts {
                println!(
                    "WARNING: pool '{}' at {:.1}% ({} of {}, status {})",
                    alert.pool,
                    alert.usage_pct,
                    format_gib(alert.used_bytes),
                    format_gib(alert.total_bytes),
                    alert.status
                );
            }
            anyhow::bail!("{} pool(s) above {:.0}% capacity", alerts.len(), threshold);
        }
    }
    Ok(())
}
