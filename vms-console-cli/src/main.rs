use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::{fs, io};
use tracing::{info, Level};
use vms_console::{ConsoleConfig, CONFIG_TEMPLATE};

mod cameras;
mod console;
mod mappings;
mod vms;

use cameras::CamerasCommand;
use mappings::MappingsCommand;
use vms::VmsCommand;

const DEFAULT_CONFIG_FILE: &str = "vms-console.jsonc";

/// VMS Integration Console
/// Manages VMS connections, unified cameras and field-mapping rules of a VMS integration server
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output for detailed request and state information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a console config file (JSON with comments)
    #[arg(short, long, global = true, value_name = "PATH TO CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the VMS integration API, overriding the config file
    #[arg(long, global = true, env = "VMS_CONSOLE_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage VMS connection configs and server-side synchronization
    Vms {
        #[command(subcommand)]
        command: VmsCommand,
    },
    /// Browse, synchronize and export unified cameras
    Cameras {
        #[command(subcommand)]
        command: CamerasCommand,
    },
    /// Inspect field structures and edit mapping rules
    Mappings {
        #[command(subcommand)]
        command: MappingsCommand,
    },
    /// Generate a commented console config template
    GenerateConfig {
        /// Output path for the generated config
        #[arg(
            short,
            long,
            default_value = DEFAULT_CONFIG_FILE,
            value_name = "OUTPUT PATH"
        )]
        output: PathBuf,
    },
    /// Validate a console config file (uses --config, or vms-console.jsonc)
    ValidateConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with appropriate level
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(io::stderr)
        .init();

    info!("VMS Integration Console starting up...");

    match &cli.command {
        Commands::GenerateConfig { output } => generate_config_command(output),
        Commands::ValidateConfig => validate_config_command(cli.config.as_deref()),
        Commands::Vms { command } => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            vms::run(command, &config).await
        }
        Commands::Cameras { command } => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            cameras::run(command, &config).await
        }
        Commands::Mappings { command } => {
            let config = load_config(cli.config.as_deref(), cli.base_url.as_deref())?;
            mappings::run(command, &config).await
        }
    }
}

/// Loads the config named on the command line, or built-in defaults when none is given,
/// then applies the base URL override.
fn load_config(path: Option<&Path>, base_url: Option<&str>) -> Result<ConsoleConfig> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            ConsoleConfig::from_file(path)
                .context("Failed to load config. See errors for additional details:")?
        }
        None => ConsoleConfig::default(),
    };
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url);
    }
    config.validate().context("Failed to validate config")?;
    info!("Using VMS integration API at {}", config.base_url);
    Ok(config)
}

fn generate_config_command(output: &Path) -> Result<()> {
    info!("Generating console config template...");

    // if output is a directory, append the default file name
    let full_file_output_path = if output.is_dir() {
        output.join(DEFAULT_CONFIG_FILE)
    } else {
        output.to_path_buf()
    };

    fs::write(&full_file_output_path, CONFIG_TEMPLATE)
        .context(format!("Failed to write config to: {}", output.display()))?;

    info!(
        "Successfully generated config template at: {}",
        full_file_output_path.display()
    );
    Ok(())
}

fn validate_config_command(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    info!("Validating config...");

    if !path.exists() {
        anyhow::bail!(
            "Config file not found: {}. Try using --config <PATH TO CONFIG>",
            path.display()
        );
    }

    let config = ConsoleConfig::from_file(path)
        .context("Failed to parse config. See errors for additional details:")?;
    config.validate().context("Failed to validate config")?;

    info!("Config validation successful");
    info!("Base URL: {}", config.base_url);
    info!("Path separator: {}", config.path_separator);
    println!("{}: OK", path.display());
    Ok(())
}
