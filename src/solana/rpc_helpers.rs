use log::debug;
use serde::de::DeserializeOwned;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::{WatcherError, WatcherResult};

/// Parse pubkey from string with helpful error message
pub fn parse_pubkey(pubkey_str: &str) -> WatcherResult<Pubkey> {
    Pubkey::from_str(pubkey_str)
        .map_err(|e| WatcherError::Decode(format!("Failed to parse pubkey {}: {}", pubkey_str, e)))
}

/// Parse a commitment level such as `processed` or `confirmed`
pub fn parse_commitment(level: &str) -> WatcherResult<CommitmentConfig> {
    CommitmentConfig::from_str(level)
        .map_err(|_| WatcherError::Decode(format!("Unknown commitment level: {}", level)))
}

/// Make a direct JSON RPC request and deserialize the `result` field.
///
/// Used where the typed client would decode into `solana-transaction-status`
/// structures and we want the node's JSON as-is.
pub async fn send_raw_request<T: DeserializeOwned>(
    rpc_client: &RpcClient,
    request: RpcRequest,
    params: serde_json::Value,
) -> WatcherResult<T> {
    debug!("RPC {} {}", request, params);
    let response = rpc_client.send(request, params).await?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_values() {
        assert!(parse_pubkey("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8").is_ok());
        assert!(parse_pubkey("not-a-key").is_err());
        assert_eq!(parse_commitment("processed").unwrap(), CommitmentConfig::processed());
        assert_eq!(parse_commitment("confirmed").unwrap(), CommitmentConfig::confirmed());
    }
}
