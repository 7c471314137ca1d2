use log::{debug, warn};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

use crate::models::{MintInfo, TokenMeta};
use crate::solana::client::ChainClient;

/// Read name, symbol and decimals out of a `jsonParsed` mint account.
///
/// Plain SPL mints only carry decimals. Token-2022 mints may carry a
/// `tokenMetadata` extension with the name and symbol.
pub fn parse_mint_account(account: &Value) -> MintInfo {
    let info = match account.pointer("/data/parsed/info") {
        Some(info) => info,
        None => return MintInfo::default(),
    };

    let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

    let mut mint = MintInfo {
        name: text(info, "name"),
        symbol: text(info, "symbol"),
        decimals: info.get("decimals").and_then(Value::as_u64).and_then(|d| u8::try_from(d).ok()),
    };

    let metadata = info.get("extensions")
        .and_then(Value::as_array)
        .and_then(|exts| {
            exts.iter().find(|ext| ext.get("extension").and_then(Value::as_str) == Some("tokenMetadata"))
        })
        .and_then(|ext| ext.get("state"));

    if let Some(state) = metadata {
        mint.name = mint.name.or_else(|| text(state, "name"));
        mint.symbol = mint.symbol.or_else(|| text(state, "symbol"));
    }

    mint
}

/// Best-effort metadata lookup; any failure yields `TokenMeta::default()`
pub async fn resolve_token_meta(client: &dyn ChainClient, mint: &Pubkey) -> TokenMeta {
    match client.get_mint_info(mint).await {
        Ok(Some(info)) => {
            debug!("Mint {} resolved: {:?}", mint, info);
            TokenMeta::from(info)
        }
        Ok(None) => {
            warn!("Mint account {} not found, using default token metadata", mint);
            TokenMeta::default()
        }
        Err(e) => {
            warn!("Failed to fetch mint {}: {}", mint, e);
            TokenMeta::default()
        }
    }
}
