use anyhow::Result;
use clap::Subcommand;
use nas_manager::models::health::active_alerts;
use nas_manager::TrueNasClient;

use super::{format_gib, or_dash};

#[derive(Subcommand, Debug)]
pub enum HealthCommand {
    /// Active system alerts
    Alerts,

    /// Service state and startup setting
    Services,

    /// Installed disks
    Disks,
}

pub async fn run(client: &TrueNasClient, command: HealthCommand) -> Result<()> {
    match command {
        HealthCommand::Alerts => {
            let alerts = active_alerts(client.alerts().await?);
            if alerts.is_empty() {
                println!("No active alerts");
                return Ok(());
            }
            println!("{:<10} {:<28} {}", "LEVEL", "TYPE", "MESSAGE");
            for alert in &alerts {
                println!(
                    "{:<10} {:<28} {}",
                    alert.level,
                    alert.klass,
                    or_dash(alert.formatted.as_deref()).trim()
                );
            }
        }

        HealthCommand::Services => {
            println!("{:<20} {:<8} {:<8}", "SERVICE", "STATE", "STARTUP");
            for svc in client.services().await? {
                println!(
                    "{:<20} {:<8} {:<8}",
                    svc.service,
                    if svc.is_running() { "Running" } else { "Stopped" },
                    if svc.enable { "Enabled" } else { "Disabled" }
                );
            }
        }

        HealthCommand::Disks => {
            println!("{:<10} {:<28} {:>12} {:<6} {:<20}", "DEVICE", "MODEL", "SIZE", "TYPE", "SERIAL");
            for disk in client.disks().await? {
                println!(
                    "{:<10} {:<28} {:>12} {:<6} {:<20}",
                    disk.name,
                    or_dash(disk.model.as_deref()),
                    format_gib(disk.size),
                    disk.kind.as_deref().unwrap_or("UNKNOWN"),
                    or_dash(disk.serial.as_deref())
                );
            }
        }
    }
    Ok(())
}
