use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use tradesync::config::mask_url_password;
use tradesync::coordination::install_signal_handlers;
use tradesync::logging::{init_logging, init_logging_simple};
use tradesync::terminal::server_candidates;
use tradesync::{
    AppConfig, BridgeTerminal, GracefulShutdown, PostgresStore, Scheduler, SyncOrchestrator,
    SyncSettings,
};

#[derive(Parser, Debug)]
#[command(name = "tradesync", version, about = "Sync trading terminal history into Postgres")]
struct Cli {
    /// Directory holding default.toml and per-environment overrides
    #[arg(long, env = "TRADESYNC_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run sync cycles until interrupted
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Apply database migrations and exit
    Migrate,
    /// Print the server name variants tried for a nominal server name
    Candidates { server: String },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run { once: false }) {
        Commands::Candidates { server } => {
            for (i, candidate) in server_candidates(&server).iter().enumerate() {
                println!("{}. {}", i + 1, candidate);
            }
        }
        Commands::Config => {
            init_logging_simple();
            let config = load_config(&cli.config_dir)?;
            println!("database.url            = {}", mask_url_password(&config.database.url));
            println!("database.max_connections = {}", config.database.max_connections);
            println!("sync.interval_secs      = {}", config.sync.interval_secs);
            println!("sync.history_from       = {}", config.sync.history_from.to_rfc3339());
            println!("sync.cancel_poll_ms     = {}", config.sync.cancel_poll_ms);
            println!("terminal.bridge_url     = {}", config.terminal.bridge_url);
            println!(
                "terminal.install_path   = {}",
                config.terminal.install_path.as_deref().unwrap_or("-")
            );
            println!("logging.level           = {}", config.logging.level);
        }
        Commands::Migrate => {
            init_logging_simple();
            let config = load_config(&cli.config_dir)?;
            let store =
                PostgresStore::new(&config.database.url, config.database.max_connections).await?;
            store.migrate().await?;
            println!("Migrations applied");
        }
        Commands::Run { once } => {
            let config = load_config(&cli.config_dir)?;
            init_logging(&config.logging);
            run_worker(config, once).await?;
        }
    }

    Ok(())
}

fn load_config(config_dir: &std::path::Path) -> anyhow::Result<AppConfig> {
    let config = AppConfig::load_from(config_dir)
        .with_context(|| format!("loading configuration from {}", config_dir.display()))?;

    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("config: {e}");
        }
        anyhow::bail!("invalid configuration ({} problems)", errors.len());
    }

    Ok(config)
}

async fn run_worker(config: AppConfig, once: bool) -> anyhow::Result<()> {
    info!("========================================");
    info!("TRADESYNC WORKER - {}", if once { "single cycle" } else { "continuous" });
    info!("Interval: {}s", config.sync.interval_secs);
    info!("History from: {}", config.sync.history_from.to_rfc3339());
    info!("Press Ctrl+C to stop");
    info!("========================================");

    let shutdown = Arc::new(GracefulShutdown::new());
    install_signal_handlers(shutdown.clone());

    let store = PostgresStore::new(&config.database.url, config.database.max_connections)
        .await
        .context("connecting to the position store")?;
    let terminal = BridgeTerminal::new(&config.terminal.bridge_url)?;

    let settings = SyncSettings {
        history_from: config.sync.history_from,
        install_path: config.terminal.install_path.clone(),
    };
    let orchestrator =
        SyncOrchestrator::new(store.clone(), store, terminal, settings, shutdown.clone());

    if once {
        if let Err(e) = orchestrator.run_cycle().await {
            error!("Cycle aborted: {}", e);
        }
    } else {
        Scheduler::from_config(&config.sync, shutdown).run(&orchestrator).await;
    }

    info!("Worker finished");
    Ok(())
}
