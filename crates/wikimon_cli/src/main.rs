use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wikimon_storage::{TomlConfigStore, default_config_path};
use wikimon_telemetry::TelemetryConfig;

mod commands;

#[derive(Parser)]
#[command(name = "wikimon")]
#[command(version, about = "Monitor MediaWiki site statistics", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/wikimon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the stored preference
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a MediaWiki instance after validating its API
    Setup {
        /// Wiki API URL (e.g., https://en.wikipedia.org/w/api.php); prompts when omitted
        #[arg(long)]
        url: Option<String>,

        /// Only refresh on demand, never on a schedule
        #[arg(long)]
        no_polling: bool,
    },

    /// Fetch current statistics once and print every sensor
    Status {
        /// Print sensor states as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep polling configured instances and print each update
    Watch,

    /// Show configured instances
    List,

    /// Remove the configuration entry
    Remove {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path().context("Failed to locate config directory")?,
    };
    let store = TomlConfigStore::new(config_path);
    let prefs = store.load_preferences().context("Failed to load preferences")?;

    let level = cli.log_level.unwrap_or(prefs.log_level);
    let telemetry = TelemetryConfig::from_level_str(&level, cli.json_logs || prefs.json_logs)?;
    wikimon_telemetry::init_telemetry(&telemetry)?;
    tracing::debug!(config = %store.path().display(), "Using config file");

    match cli.command {
        Commands::Setup { url, no_polling } => commands::setup::run(&store, url, no_polling).await,
        Commands::Status { json } => commands::status::run(&store, json).await,
        Commands::Watch => commands::watch::run(&store).await,
        Commands::List => commands::list::run(&store),
        Commands::Remove { yes } => commands::remove::run(&store, yes),
    }
}
