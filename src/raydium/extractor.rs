use log::debug;

use crate::config::Config;
use crate::models::{ParsedTransaction, TokenBalance};
use crate::raydium::log_parser::{parse_logs, LogFacts};
use crate::utils::short_id;

/// One side of a new pool as seen in the creating transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSide {
    pub mint: Option<String>,
    pub decimals: Option<u8>,
    pub lp_amount: u64,
}

impl From<&TokenBalance> for TokenSide {
    fn from(balance: &TokenBalance) -> Self {
        Self {
            mint: Some(balance.mint.clone()),
            decimals: Some(balance.ui_token_amount.decimals),
            lp_amount: balance.raw_amount(),
        }
    }
}

/// Where the token amounts came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactsSource {
    PostBalances,
    Logs,
    Nothing,
}

/// Structured facts about a pool creation
#[derive(Debug, Clone, PartialEq)]
pub struct EventFacts {
    pub signature: String,
    pub creator: Option<String>,
    pub base: Option<TokenSide>,
    pub quote: Option<TokenSide>,
    pub pool_address: Option<String>,
    /// Trading start announced by `initialize2` or the `ray_log` init record
    pub open_time: Option<u64>,
    pub market: Option<String>,
    pub source: FactsSource,
}

/// Result of running the extractor over one event
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Facts(EventFacts),
    /// The transaction was missing or failed on-chain; only the signature is known
    Incomplete { signature: String },
}

impl Extraction {
    pub fn signature(&self) -> &str {
        match self {
            Extraction::Facts(facts) => &facts.signature,
            Extraction::Incomplete { signature } => signature,
        }
    }
}

/// Pulls pool-creation facts out of a parsed Raydium transaction
#[derive(Debug, Clone)]
pub struct EventExtractor {
    amm_program_id: String,
    amm_authority: String,
    quote_mint: String,
}

impl EventExtractor {
    pub fn new(amm_program_id: &str, amm_authority: &str, quote_mint: &str) -> Self {
        Self {
            amm_program_id: amm_program_id.to_string(),
            amm_authority: amm_authority.to_string(),
            quote_mint: quote_mint.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.amm_program_id, &config.amm_authority, &config.quote_mint)
    }

    pub fn extract(&self, signature: &str, tx: Option<&ParsedTransaction>, logs: &[String]) -> Extraction {
        let tx = match tx {
            Some(tx) if tx.execution_error().is_none() => tx,
            Some(tx) => {
                debug!("{} failed on-chain: {:?}", short_id(signature), tx.execution_error());
                return Extraction::Incomplete { signature: signature.to_string() };
            }
            None => return Extraction::Incomplete { signature: signature.to_string() },
        };

        let balances = tx.post_token_balances();
        let base = self.find_balance(balances, false).map(TokenSide::from);
        let quote = self.find_balance(balances, true).map(TokenSide::from);
        let log_facts = parse_logs(logs);

        let (base, quote, source) = if base.is_some() || quote.is_some() {
            (base, quote, FactsSource::PostBalances)
        } else if log_facts.has_amounts() {
            let (base, quote) = self.sides_from_logs(&log_facts);
            (Some(base), Some(quote), FactsSource::Logs)
        } else {
            (None, None, FactsSource::Nothing)
        };

        Extraction::Facts(EventFacts {
            signature: signature.to_string(),
            creator: tx.signer().map(str::to_string),
            base,
            quote,
            pool_address: self.find_pool_address(tx),
            open_time: log_facts.open_time,
            market: log_facts.market().map(|market| market.to_string()),
            source,
        })
    }

    fn find_balance<'a>(&self, balances: &'a [TokenBalance], quote: bool) -> Option<&'a TokenBalance> {
        balances.iter().find(|balance| {
            balance.owner.as_deref() == Some(self.amm_authority.as_str())
                && (balance.mint == self.quote_mint) == quote
        })
    }

    fn sides_from_logs(&self, facts: &LogFacts) -> (TokenSide, TokenSide) {
        let record = facts.init_record.as_ref();
        let base = TokenSide {
            mint: None,
            decimals: record.map(|r| r.coin_decimals),
            lp_amount: facts.init_coin_amount.unwrap_or(0),
        };
        let quote = TokenSide {
            mint: Some(self.quote_mint.clone()),
            decimals: record.map(|r| r.pc_decimals),
            lp_amount: facts.init_pc_amount.unwrap_or(0),
        };
        (base, quote)
    }

    /// Within each inner-instruction group the vault-initialising instruction
    /// comes after the setup instructions, so groups are scanned back to front.
    pub fn find_pool_address(&self, tx: &ParsedTransaction) -> Option<String> {
        for group in tx.inner_instructions() {
            let found = group.instructions.iter().rev().find_map(|ix| {
                match (ix.owner(), ix.account()) {
                    (Some(owner), Some(account)) if owner == self.amm_program_id => Some(account),
                    _ => None,
                }
            });
            if let Some(account) = found {
                return Some(account.to_string());
            }
        }
        debug!("No pool address found in transaction at slot {}", tx.slot);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const AMM: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";
    const AUTHORITY: &str = "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1";
    const WSOL: &str = "So11111111111111111111111111111111111111112";

    fn extractor() -> EventExtractor {
        EventExtractor::new(AMM, AUTHORITY, WSOL)
    }

    fn ix(owner: &str, account: &str) -> Value {
        json!({"parsed": {"info": {"account": account, "owner": owner}, "type": "initializeAccount"}, "programId": "Tok"})
    }

    fn tx(meta: Value) -> ParsedTransaction {
        ParsedTransaction::from_value(json!({
            "slot": 1,
            "transaction": {"message": {"accountKeys": [{"pubkey": "Creator"}, {"pubkey": "Other"}]}},
            "meta": meta
        }))
        .unwrap()
    }

    fn balance(mint: &str, owner: &str, amount: &str, decimals: u8) -> Value {
        json!({"mint": mint, "owner": owner, "uiTokenAmount": {"amount": amount, "decimals": decimals}})
    }

    #[test]
    fn reverse_scan_picks_last_amm_instruction() {
        let tx = tx(json!({
            "err": null,
            "innerInstructions": [{"index": 0, "instructions": [ix("X", "A"), ix(AMM, "B"), ix(AMM, "C")]}]
        }));
        assert_eq!(extractor().find_pool_address(&tx), Some("C".to_string()));
    }

    #[test]
    fn first_group_with_a_match_wins() {
        let tx = tx(json!({
            "innerInstructions": [
                {"index": 0, "instructions": [ix("X", "A")]},
                {"index": 1, "instructions": [ix(AMM, "D"), ix("X", "E")]},
                {"index": 2, "instructions": [ix(AMM, "F")]}
            ]
        }));
        assert_eq!(extractor().find_pool_address(&tx), Some("D".to_string()));
    }

    #[test]
    fn picks_base_and_quote_from_post_balances() {
        let tx = tx(json!({
            "err": null,
            "postTokenBalances": [
                balance("UserMint", "SomeUser", "5", 6),
                balance(WSOL, AUTHORITY, "500", 9),
                balance("NewMint", AUTHORITY, "1000000", 6)
            ],
            "innerInstructions": [{"index": 0, "instructions": [ix(AMM, "Pool")]}]
        }));

        match extractor().extract("SIG", Some(&tx), &[]) {
            Extraction::Facts(facts) => {
                assert_eq!(facts.creator.as_deref(), Some("Creator"));
                assert_eq!(facts.pool_address.as_deref(), Some("Pool"));
                assert_eq!(facts.source, FactsSource::PostBalances);
                let base = facts.base.unwrap();
                assert_eq!(base.mint.as_deref(), Some("NewMint"));
                assert_eq!((base.decimals, base.lp_amount), (Some(6), 1_000_000));
                let quote = facts.quote.unwrap();
                assert_eq!(quote.mint.as_deref(), Some(WSOL));
                assert_eq!(quote.lp_amount, 500);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn log_fallback_without_post_balances() {
        let tx = tx(json!({"err": null}));
        let logs = vec!["initialize2: init_pc_amount: 500, init_coin_amount: 1000000".to_string()];
        match extractor().extract("SIG1", Some(&tx), &logs) {
            Extraction::Facts(facts) => {
                assert_eq!(facts.source, FactsSource::Logs);
                assert_eq!(facts.quote.unwrap().lp_amount, 500);
                assert_eq!(facts.base.unwrap().lp_amount, 1_000_000);
                assert_eq!(facts.pool_address, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fallback_is_skipped_when_balances_exist() {
        let tx = tx(json!({"postTokenBalances": [balance(WSOL, AUTHORITY, "7", 9)]}));
        let logs = vec!["initialize2: init_pc_amount: 500, init_coin_amount: 1000000".to_string()];
        match extractor().extract("S", Some(&tx), &logs) {
            Extraction::Facts(facts) => {
                assert_eq!(facts.source, FactsSource::PostBalances);
                assert_eq!(facts.base, None);
                assert_eq!(facts.quote.unwrap().lp_amount, 7);
                assert_eq!(facts.open_time, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn open_time_is_kept_alongside_post_balances() {
        let tx = tx(json!({"postTokenBalances": [balance(WSOL, AUTHORITY, "7", 9)]}));
        let logs = vec!["Program log: initialize2: InitializeInstruction2 { nonce: 254, open_time: 1700000123, init_pc_amount: 7, init_coin_amount: 9 }".to_string()];
        match extractor().extract("S", Some(&tx), &logs) {
            Extraction::Facts(facts) => {
                assert_eq!(facts.source, FactsSource::PostBalances);
                assert_eq!(facts.open_time, Some(1_700_000_123));
                assert_eq!(facts.market, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn failed_or_missing_transaction_is_incomplete() {
        let failed = tx(json!({"err": {"InstructionError": [0, {"Custom": 1}]}}));
        assert_eq!(
            extractor().extract("S", Some(&failed), &[]),
            Extraction::Incomplete { signature: "S".to_string() }
        );
        assert_eq!(extractor().extract("S", None, &[]).signature(), "S");
    }
}
