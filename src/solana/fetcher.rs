use log::debug;
use solana_sdk::commitment_config::CommitmentConfig;
use std::sync::Arc;

use crate::error::WatcherResult;
use crate::models::ParsedTransaction;
use crate::solana::client::ChainClient;
use crate::utils::short_id;

/// Fetches the parsed transaction behind a log notification.
///
/// One request per call; callers that want retries loop themselves. A
/// transaction that failed on-chain is still returned.
pub struct TransactionFetcher {
    client: Arc<dyn ChainClient>,
    commitment: CommitmentConfig,
}

impl TransactionFetcher {
    pub fn new(client: Arc<dyn ChainClient>, commitment: CommitmentConfig) -> Self {
        Self { client, commitment }
    }

    pub async fn fetch(&self, signature: &str) -> WatcherResult<Option<ParsedTransaction>> {
        let tx = self.client.get_parsed_transaction(signature, self.commitment).await?;
        match &tx {
            Some(tx) => debug!(
                "Fetched {} at slot {} ({} post balances)",
                short_id(signature),
                tx.slot,
                tx.post_token_balances().len()
            ),
            None => debug!("Transaction {} not found at {:?}", short_id(signature), self.commitment.commitment),
        }
        Ok(tx)
    }
}
