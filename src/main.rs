use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trunkwatch::{
    actions::HttpActionDispatcher,
    config::MonitorConfig,
    engine::MonitorEngine,
    http_client::{HttpRetryConfig, create_retryable_http_client},
    probes::{SysinfoProcessProbe, WavDurationEstimator},
    supervisor::Supervisor,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "monitor_config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the monitoring loop.
    Run,
    /// Loads and validates the configuration, then exits.
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_monitor(&cli.config).await?,
        Commands::CheckConfig => {
            MonitorConfig::load(&cli.config)?;
            tracing::info!(path = %cli.config.display(), "Configuration is valid");
        }
    }

    Ok(())
}

async fn run_monitor(config_path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(MonitorConfig::load(config_path)?);

    let started_at = Utc::now();
    tracing::info!(start = %started_at, "Starting TrunkWatch");
    tracing::info!(log_file = %config.log_file.display(), "Log file");
    tracing::info!(recordings = %config.recordings_dir.display(), monitor_audio = config.monitor_audio, "Recordings directory");
    tracing::info!(interval = ?config.check_interval_seconds, process = %config.process_name, "Cycle settings");

    let client = Arc::new(create_retryable_http_client(&HttpRetryConfig::default())?);
    let dispatcher = Arc::new(HttpActionDispatcher::from_config(&config, client)?);

    let engine = MonitorEngine::new(
        Arc::clone(&config),
        Box::new(SysinfoProcessProbe::new()),
        Box::new(WavDurationEstimator::new()),
        dispatcher,
        started_at,
    );

    Supervisor::new(engine, config.check_interval_seconds).run().await;

    Ok(())
}
