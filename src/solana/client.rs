use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_transaction_status::UiTransactionEncoding;

use crate::error::{WatcherError, WatcherResult};
use crate::models::{MintInfo, ParsedTransaction};
use crate::solana::rpc_helpers::send_raw_request;
use crate::solana::token_meta::parse_mint_account;

/// The RPC queries the pipeline consumes
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `getTransaction` with `jsonParsed` encoding; `None` when the node has no such transaction
    async fn get_parsed_transaction(
        &self,
        signature: &str,
        commitment: CommitmentConfig,
    ) -> WatcherResult<Option<ParsedTransaction>>;

    /// Raw account data, `None` when the account does not exist
    async fn get_account_data(&self, address: &Pubkey) -> WatcherResult<Option<Vec<u8>>>;

    /// Raw (undecimalized) balance of a token account
    async fn get_token_account_balance(&self, address: &Pubkey) -> WatcherResult<u64>;

    /// Parsed mint account, `None` when the mint does not exist
    async fn get_mint_info(&self, mint: &Pubkey) -> WatcherResult<Option<MintInfo>>;
}

/// Wrapper around the nonblocking Solana RPC client
pub struct SolanaClient {
    rpc_client: RpcClient,
    commitment: CommitmentConfig,
}

impl SolanaClient {
    pub fn new_with_commitment(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        let rpc_client = RpcClient::new_with_commitment(rpc_url.to_string(), commitment);
        Self { rpc_client, commitment }
    }

    /// Get the current Solana slot
    pub async fn get_slot(&self) -> WatcherResult<u64> {
        debug!("Getting current slot");
        let slot = self.rpc_client.get_slot().await?;
        Ok(slot)
    }
}

#[async_trait]
impl ChainClient for SolanaClient {
    async fn get_parsed_transaction(
        &self,
        signature: &str,
        commitment: CommitmentConfig,
    ) -> WatcherResult<Option<ParsedTransaction>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(commitment),
            max_supported_transaction_version: Some(0),
        };
        let params = json!([signature, serde_json::to_value(config)?]);

        let response: Option<Value> =
            send_raw_request(&self.rpc_client, RpcRequest::GetTransaction, params).await?;

        match response {
            Some(value) if !value.is_null() => Ok(Some(ParsedTransaction::from_value(value)?)),
            _ => Ok(None),
        }
    }

    async fn get_account_data(&self, address: &Pubkey) -> WatcherResult<Option<Vec<u8>>> {
        let response = self.rpc_client
            .get_account_with_commitment(address, self.commitment)
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> WatcherResult<u64> {
        let balance = self.rpc_client.get_token_account_balance(address).await?;
        balance.amount.parse::<u64>().map_err(|e| {
            WatcherError::Decode(format!("token balance of {} is not an integer: {}", address, e))
        })
    }

    async fn get_mint_info(&self, mint: &Pubkey) -> WatcherResult<Option<MintInfo>> {
        let params = json!([
            mint.to_string(),
            { "encoding": "jsonParsed", "commitment": self.commitment.commitment }
        ]);
        let response: Value =
            send_raw_request(&self.rpc_client, RpcRequest::GetAccountInfo, params).await?;

        match response.get("value") {
            Some(account) if !account.is_null() => Ok(Some(parse_mint_account(account))),
            _ => Ok(None),
        }
    }
}
