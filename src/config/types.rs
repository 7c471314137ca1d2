use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use std::env;
use std::time::Duration;

/// Configuration for the Raydium pool watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Solana RPC URL
    pub rpc_url: String,
    /// Solana websocket URL for the logs feed
    pub ws_url: String,
    /// Watchlist database location
    pub database_url: String,
    /// Address the logs subscription filters on
    pub watch_address: String,
    /// Raydium AMM v4 program id
    pub amm_program_id: String,
    /// Raydium authority that owns the pool vaults
    pub amm_authority: String,
    /// Mint treated as the quote side (wrapped SOL)
    pub quote_mint: String,
    /// Commitment requested for the logs subscription
    pub subscribe_commitment: String,
    /// Commitment requested when fetching transactions
    pub fetch_commitment: String,
    /// Seconds to wait before re-subscribing after a disconnect
    pub reconnect_delay_secs: u64,
    /// Seconds to wait for the subscription acknowledgement
    pub subscribe_ack_timeout_secs: u64,
    /// Capacity of the queue between the feed and the pipeline
    pub event_queue_capacity: usize,
    /// Events processed concurrently before the queue stops draining
    pub max_in_flight_events: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            ws_url: "wss://api.mainnet-beta.solana.com".to_string(),
            database_url: "watchlist.db".to_string(),
            watch_address: "7YttLkHDoNj9wyDur5pM1ejNaAvT9X4eqaYcHQqtj2G5".to_string(),
            amm_program_id: "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8".to_string(),
            amm_authority: "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1".to_string(),
            quote_mint: "So11111111111111111111111111111111111111112".to_string(),
            subscribe_commitment: "processed".to_string(),
            fetch_commitment: "confirmed".to_string(),
            reconnect_delay_secs: 5,
            subscribe_ack_timeout_secs: 10,
            event_queue_capacity: 1024,
            max_in_flight_events: 64,
        }
    }
}

impl Config {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn subscribe_ack_timeout(&self) -> Duration {
        Duration::from_secs(self.subscribe_ack_timeout_secs)
    }
}

/// Loads configuration from environment variables, falling back to default values
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let strings: [(&str, &mut String); 9] = [
        ("RPC_URL", &mut config.rpc_url),
        ("WS_URL", &mut config.ws_url),
        ("DATABASE_URL", &mut config.database_url),
        ("WATCH_ADDRESS", &mut config.watch_address),
        ("AMM_PROGRAM_ID", &mut config.amm_program_id),
        ("AMM_AUTHORITY", &mut config.amm_authority),
        ("QUOTE_MINT", &mut config.quote_mint),
        ("SUBSCRIBE_COMMITMENT", &mut config.subscribe_commitment),
        ("FETCH_COMMITMENT", &mut config.fetch_commitment),
    ];
    for (key, slot) in strings {
        if let Ok(value) = env::var(key) {
            *slot = value;
        }
    }

    if let Ok(delay) = env::var("RECONNECT_DELAY_SECS") {
        config.reconnect_delay_secs = delay.parse()
            .with_context(|| format!("Invalid RECONNECT_DELAY_SECS: {}", delay))?;
    }

    if let Ok(timeout) = env::var("SUBSCRIBE_ACK_TIMEOUT_SECS") {
        config.subscribe_ack_timeout_secs = timeout.parse()
            .with_context(|| format!("Invalid SUBSCRIBE_ACK_TIMEOUT_SECS: {}", timeout))?;
    }

    if let Ok(capacity) = env::var("EVENT_QUEUE_CAPACITY") {
        let value: usize = capacity.parse()
            .with_context(|| format!("Invalid EVENT_QUEUE_CAPACITY: {}", capacity))?;
        config.event_queue_capacity = value.max(1);
    }

    if let Ok(limit) = env::var("MAX_IN_FLIGHT_EVENTS") {
        let value: usize = limit.parse()
            .with_context(|| format!("Invalid MAX_IN_FLIGHT_EVENTS: {}", limit))?;
        config.max_in_flight_events = value.max(1);
    }

    Ok(config)
}
