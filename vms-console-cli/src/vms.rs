use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;
use vms_console::{AdditionalInfoItem, ConsoleConfig, VmsConfigUpdate, VmsDirectory, VmsType};

use crate::console::{api, parse_pair, print_table, report};

#[derive(Subcommand)]
pub enum VmsCommand {
    /// List the VMS types known to the server
    Types,
    /// List stored VMS connection configs
    Configs,
    /// Show one VMS connection config as JSON
    Show {
        /// VMS type, e.g. emstone, naiz or dahua
        vms: String,
    },
    /// Activate (or with --off, deactivate) a VMS
    Activate {
        vms: String,
        /// Deactivate instead
        #[arg(long)]
        off: bool,
    },
    /// Flip the active flag of a VMS
    Toggle { vms: String },
    /// Update the connection settings of a VMS
    Update {
        vms: String,
        #[arg(long)]
        ip: String,
        #[arg(long)]
        port: String,
        /// Defaults to the stored username
        #[arg(long)]
        username: Option<String>,
        /// The stored password is never returned, so omitting this sends an empty one
        #[arg(long)]
        password: Option<String>,
        /// Additional vendor settings; repeat for several entries
        #[arg(long = "info", value_name = "KEY=VALUE")]
        info: Vec<String>,
    },
    /// Run the server-side synchronization of one VMS
    Sync { vms: String },
    /// Run the server-side synchronization of every VMS
    SyncAll,
}

pub async fn run(command: &VmsCommand, config: &ConsoleConfig) -> Result<()> {
    let mut directory = VmsDirectory::new(api(config)?, config.locale());

    match command {
        VmsCommand::Types => {
            report(directory.refresh().await, None)?;
            for vms in directory.types() {
                println!("{}", vms);
            }
        }
        VmsCommand::Configs => {
            report(directory.refresh().await, directory.banner())?;
            let rows: Vec<Vec<String>> = directory
                .configs()
                .iter()
                .map(|c| {
                    vec![
                        c.vms_type.to_string(),
                        c.ip.clone(),
                        c.port.clone(),
                        c.username.clone(),
                        if c.is_active { "active" } else { "inactive" }.to_string(),
                        c.additional_info.len().to_string(),
                    ]
                })
                .collect();
            print_table(&["VMS", "IP", "PORT", "USERNAME", "STATE", "INFO"], &rows);
        }
        VmsCommand::Show { vms } => {
            let result = directory.fetch_config(&VmsType::from(vms.as_str())).await;
            let stored = report(result, directory.banner())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&stored).context("Failed to render config")?
            );
        }
        VmsCommand::Activate { vms, off } => {
            let result = directory.set_active(&VmsType::from(vms.as_str()), !off).await;
            report(result, directory.banner())?;
        }
        VmsCommand::Toggle { vms } => {
            report(directory.refresh().await, None)?;
            let result = directory.toggle_active(&VmsType::from(vms.as_str())).await;
            report(result, directory.banner())?;
        }
        VmsCommand::Update {
            vms,
            ip,
            port,
            username,
            password,
            info: entries,
        } => {
            let vms = VmsType::from(vms.as_str());
            let stored = directory.fetch_config(&vms).await.ok();
            let mut update = stored
                .as_ref()
                .map(VmsConfigUpdate::from_config)
                .unwrap_or_default();
            update.ip = ip.clone();
            update.port = port.clone();
            if let Some(username) = username {
                update.username = username.clone();
            }
            if let Some(password) = password {
                update.password = password.clone();
            }
            for entry in entries {
                let (key, value) = parse_pair(entry)?;
                update.upsert_info(AdditionalInfoItem::new(key, value));
            }
            info!(
                "Sending {} additional info entries for {}",
                update.additional_info.len(),
                vms
            );
            let result = directory.update_config(&vms, &update).await;
            report(result, directory.banner())?;
        }
        VmsCommand::Sync { vms } => {
            let result = directory.synchronize(&VmsType::from(vms.as_str())).await;
            report(result, directory.banner())?;
        }
        VmsCommand::SyncAll => {
            let result = directory.synchronize_all().await;
            report(result, directory.banner())?;
        }
    }
    Ok(())
}
