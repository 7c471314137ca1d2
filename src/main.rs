use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use raydium_pool_watcher::config::{self, Config};
use raydium_pool_watcher::db::Database;
use raydium_pool_watcher::models::LogNotification;
use raydium_pool_watcher::monitoring::{LogsSubscriber, PoolMonitor};
use raydium_pool_watcher::pipeline::Pipeline;
use raydium_pool_watcher::solana;

/// Watch Solana logs for new Raydium pools and record them in a watchlist
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Solana RPC URL (overrides RPC_URL)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Solana websocket URL (overrides WS_URL)
    #[arg(long)]
    ws_url: Option<String>,

    /// Watchlist database (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Address the logs subscription filters on (overrides WATCH_ADDRESS)
    #[arg(long)]
    watch_address: Option<String>,

    /// Keep the records of previous runs instead of purging at startup
    #[arg(long)]
    keep_watchlist: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.rpc_url {
            config.rpc_url = url;
        }
        if let Some(url) = self.ws_url {
            config.ws_url = url;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(address) = self.watch_address {
            config.watch_address = address;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables
    dotenv().ok();

    // Initialize logging
    init_logger();

    let args = Args::parse();
    let keep_watchlist = args.keep_watchlist;

    info!("Starting Raydium pool watcher...");

    // Load configuration
    let mut config = config::load_config()?;
    args.apply(&mut config);
    info!("Configuration loaded, watching {}", config.watch_address);

    // Initialize Solana infrastructure
    let solana_client = solana::create_client_from_config(&config)
        .context("Failed to create Solana client")?;

    // Verify connection by getting current slot
    match solana_client.get_slot().await {
        Ok(slot) => info!("Current Solana slot: {} - RPC connection established", slot),
        Err(e) => warn!("Could not reach Solana RPC yet: {}", e),
    }

    // Connect to database
    let db = Database::new(&config.database_url).await?;
    info!("Database initialized at {}", config.database_url);

    let pipeline = Arc::new(Pipeline::new(Arc::new(solana_client), Arc::new(db), &config)?);

    if keep_watchlist {
        info!("Keeping existing watchlist records");
    } else {
        pipeline.purge_watchlist().await;
    }

    // Channel between the logs feed and the pipeline
    let (event_tx, event_rx) = mpsc::channel::<LogNotification>(config.event_queue_capacity);

    let mut subscriber = LogsSubscriber::from_config(&config);
    let subscriber_handle = tokio::spawn(async move {
        if let Err(e) = subscriber.start_monitoring(event_tx).await {
            error!("Logs subscriber stopped: {}", e);
        }
    });

    let pipeline_handle = tokio::spawn(pipeline.run(event_rx));

    // Wait for Ctrl+C signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Dropping the sender closes the queue and lets the pipeline drain
    subscriber_handle.abort();

    // Wait for in-flight events to complete
    if tokio::time::timeout(Duration::from_secs(5), pipeline_handle).await.is_err() {
        warn!("Pipeline did not drain within 5s");
    }

    info!("Shutting down...");
    Ok(())
}

fn init_logger() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info")
    );
}
