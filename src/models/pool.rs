use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A discovered Raydium pool, the unit stored in the watchlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub signature: String,
    pub creator: Option<String>,
    pub pool_address: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub base_token: BaseTokenInfo,
    pub quote_token: QuoteTokenInfo,
    pub reserves: PoolReserves,
    /// Unix time the pool opens for trading, when the logs announce it
    pub open_time: Option<u64>,
    /// OpenBook market id from the `ray_log` init record
    pub market: Option<String>,
    pub raw_logs: Vec<String>,
    pub raw_transaction: Option<serde_json::Value>,
}

/// The newly listed token side of the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseTokenInfo {
    pub address: Option<String>,
    pub decimals: u8,
    pub lp_amount: u64,
    pub name: String,
    pub symbol: String,
}

impl Default for BaseTokenInfo {
    fn default() -> Self {
        let meta = TokenMeta::default();
        Self {
            address: None,
            decimals: 0,
            lp_amount: 0,
            name: meta.name,
            symbol: meta.symbol,
        }
    }
}

/// The quote side of the pool (wrapped SOL)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteTokenInfo {
    pub address: Option<String>,
    pub decimals: u8,
    pub lp_amount: u64,
}

/// Raw vault balances of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub base_reserve_raw: u64,
    pub quote_reserve_raw: u64,
}

/// Display metadata for a mint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMeta {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            symbol: "Unknown".to_string(),
            decimals: 0,
        }
    }
}

/// Whatever the mint lookup could read; every field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MintInfo {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

impl From<MintInfo> for TokenMeta {
    fn from(info: MintInfo) -> Self {
        let fallback = TokenMeta::default();
        Self {
            name: info.name.filter(|n| !n.is_empty()).unwrap_or(fallback.name),
            symbol: info.symbol.filter(|s| !s.is_empty()).unwrap_or(fallback.symbol),
            decimals: info.decimals.unwrap_or(fallback.decimals),
        }
    }
}
