pub mod client;
pub mod fetcher;
pub mod rpc_helpers;
pub mod token_meta;

pub use client::ChainClient;
pub use client::SolanaClient;
pub use fetcher::TransactionFetcher;
pub use rpc_helpers::*;
pub use token_meta::resolve_token_meta;

use crate::config::Config;
use crate::error::WatcherResult;

/// Create a Solana client from the application configuration
pub fn create_client_from_config(config: &Config) -> WatcherResult<SolanaClient> {
    let commitment = parse_commitment(&config.fetch_commitment)?;
    Ok(SolanaClient::new_with_commitment(&config.rpc_url, commitment))
}
