use anyhow::{bail, Result};
use clap::Subcommand;
use nas_manager::models::{CreateDatasetRequest, UpdateDatasetRequest};
use nas_manager::utils::size::parse_size;
use nas_manager::TrueNasClient;

use super::{format_gib, or_dash};

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// List datasets
    List {
        /// Only datasets in this pool
        #[arg(short, long)]
        pool: Option<String>,
    },

    /// Create a dataset
    Create {
        /// Full path, e.g. tank/media
        path: String,
        #[arg(long, default_value = "lz4")]
        compression: String,
        /// e.g. 100G
        #[arg(long)]
        quota: Option<String>,
    },

    /// Delete a dataset
    Delete {
        dataset_id: String,
        /// Also delete children and snapshots
        #[arg(short, long)]
        recursive: bool,
        /// Required; deletion cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// Change dataset properties
    Set {
        dataset_id: String,
        #[arg(long)]
        compression: Option<String>,
        /// e.g. 500G, 0 removes the quota
        #[arg(long)]
        quota: Option<String>,
        #[arg(long)]
        comments: Option<String>,
    },
}

pub async fn run(client: &TrueNasClient, command: DatasetCommand) -> Result<()> {
    match command {
        DatasetCommand::List { pool } => {
            let datasets = client.datasets(pool.as_deref()).await?;
            if datasets.is_empty() {
                println!("No datasets found");
                return Ok(());
            }
            println!(
                "{:<40} {:>12} {:>12} {:<12} {:<10}",
                "DATASET", "USED", "AVAILABLE", "COMPRESSION", "TYPE"
            );
            for ds in &datasets {
                println!(
                    "{:<40} {:>12} {:>12} {:<12} {:<10}",
                    ds.name,
                    format_gib(ds.used_bytes),
                    format_gib(ds.available_bytes),
                    or_dash(ds.compression.as_deref()),
                    ds.kind
                );
            }
        }

        DatasetCommand::Create {
            path,
            compression,
            quota,
        } => {
            let quota = quota.as_deref().map(parse_size).transpose()?;
            let ds = client
                .create_dataset(&CreateDatasetRequest {
                    name: path,
                    compression: Some(compression),
                    quota,
                })
                .await?;
            println!("Created dataset {}", ds.name);
        }

        DatasetCommand::Delete {
            dataset_id,
            recursive,
            yes,
        } => {
            if !yes {
                bail!("refusing to delete {} without --yes", dataset_id);
            }
            client.delete_dataset(&dataset_id, recursive).await?;
            println!("Deleted dataset {}", dataset_id);
        }

        DatasetCommand::Set {
            dataset_id,
            compression,
            quota,
            comments,
        } => {
            let changes = UpdateDatasetRequest {
                compression,
                quota: quota.as_deref().map(parse_size).transpose()?,
                comments,
            };
            if changes.is_empty() {
                bail!("nothing to change; pass --compression, --quota or --comments");
            }
            let ds = client.update_dataset(&dataset_id, &changes).await?;
            println!(
                "Updated {}: compression {}, quota {}",
                ds.name,
                or_dash(ds.compression.as_deref()),
                ds.quota_bytes.map(format_gib).unwrap_or_else(|| "none".to_string())
            );
        }
    }
    Ok(())
}
