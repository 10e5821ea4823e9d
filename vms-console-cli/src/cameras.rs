use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use vms_console::{CameraCatalog, ConsoleConfig, MessageKey, VmsType};

use crate::console::{api, print_table, report};

#[derive(Subcommand)]
pub enum CamerasCommand {
    /// List unified cameras
    List {
        /// Only cameras of this VMS type
        #[arg(long)]
        vms: Option<String>,
        /// Case-insensitive match on name, channel name or IP address
        #[arg(long)]
        search: Option<String>,
    },
    /// Re-import the cameras of one VMS into the unified schema
    Sync { vms: String },
    /// Camera counts in total and per VMS
    Stats,
    /// Show the raw vendor camera records of a VMS
    Raw {
        vms: String,
        /// Show the unprocessed JSON documents instead of the raw records
        #[arg(long)]
        json: bool,
    },
    /// Export unified cameras to CSV
    Export {
        /// Output CSV path
        #[arg(short, long, value_name = "OUTPUT PATH")]
        output: PathBuf,
        #[arg(long)]
        vms: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
}

fn apply_filters(catalog: &mut CameraCatalog, vms: &Option<String>, search: &Option<String>) {
    catalog.set_vms_filter(vms.as_deref().map(VmsType::from));
    if let Some(search) = search {
        catalog.set_search(search.as_str());
    }
}

pub async fn run(command: &CamerasCommand, config: &ConsoleConfig) -> Result<()> {
    let locale = config.locale();
    let mut catalog = CameraCatalog::new(api(config)?, locale.clone());

    match command {
        CamerasCommand::List { vms, search } => {
            report(catalog.refresh(None).await, catalog.banner())?;
            apply_filters(&mut catalog, vms, search);
            let cameras = catalog.filtered();
            if cameras.is_empty() {
                println!("{}", locale.text(MessageKey::NoCameras));
                return Ok(());
            }
            let rows: Vec<Vec<String>> = cameras
                .iter()
                .map(|c| {
                    vec![
                        c.id.clone(),
                        c.name.clone(),
                        c.channel_id.clone(),
                        c.ip_address.clone(),
                        c.port.clone(),
                        c.status.clone(),
                        c.vms.clone(),
                    ]
                })
                .collect();
            print_table(
                &["ID", "NAME", "CHANNEL", "IP", "PORT", "STATUS", "VMS"],
                &rows,
            );
        }
        CamerasCommand::Sync { vms } => {
            let result = catalog.synchronize(&VmsType::from(vms.as_str())).await;
            report(result, catalog.banner())?;
        }
        CamerasCommand::Stats => {
            report(catalog.refresh(None).await, catalog.banner())?;
            let stats = catalog.stats();
            println!("total: {}", stats.total);
            for (vms, count) in &stats.by_vms {
                println!("{}: {}", vms, count);
            }
        }
        CamerasCommand::Raw { vms, json } => {
            let vms = VmsType::from(vms.as_str());
            let result = if *json {
                catalog.raw_json(&vms).await
            } else {
                catalog.raw_cameras(&vms).await
            };
            let rows = report(result, catalog.banner())?;
            if !rows.is_empty() {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&rows).context("Failed to render raw data")?
                );
            }
        }
        CamerasCommand::Export {
            output,
            vms,
            search,
        } => {
            report(catalog.refresh(None).await, catalog.banner())?;
            apply_filters(&mut catalog, vms, search);
            let file = File::create(output)
                .context(format!("Failed to create CSV file: {}", output.display()))?;
            let written = catalog
                .export_csv(BufWriter::new(file))
                .context("Failed to export cameras")?;
            info!("Wrote {} cameras to {}", written, output.display());
            println!("{} cameras exported to {}", written, output.display());
        }
    }
    Ok(())
}
