use anyhow::Result;
use clap::Subcommand;
use nas_manager::TrueNasClient;

use super::{format_size, or_dash};

#[derive(Subcommand, Debug)]
pub enum SystemCommand {
    /// Show host, version and hardware
    Info,
}

pub async fn run(client: &TrueNasClient, command: SystemCommand) -> Result<()> {
    match command {
        SystemCommand::Info => {
            let info = client.system_info().await?;
            println!("Hostname:     {}", or_dash(info.hostname.as_deref()));
            println!("Version:      {}", or_dash(info.version.as_deref()));
            println!("Uptime:       {:.1} days", info.uptime_seconds / 86_400.0);
            println!("Manufacturer: {}", or_dash(info.system_manufacturer.as_deref()));
            println!("Product:      {}", or_dash(info.system_product.as_deref()));
            println!("CPU:          {}", or_dash(info.model.as_deref()));
            if let Some(cores) = info.cores {
                println!("Cores:        {}", cores);
            }
            if let Some(mem) = info.physmem {
                println!("Memory:       {}", format_size(mem));
            }
        }
    }
    Ok(())
}
