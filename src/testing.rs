//! In-memory stand-ins for the chain, used by the unit and integration tests.

use async_trait::async_trait;
use solana_client::client_error::ClientErrorKind;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{WatcherError, WatcherResult};
use crate::models::{MintInfo, ParsedTransaction};
use crate::solana::client::ChainClient;

/// A `ChainClient` answering from maps filled by the test
#[derive(Default)]
pub struct FakeChain {
    transactions: Mutex<HashMap<String, ParsedTransaction>>,
    failing_signatures: Mutex<Vec<String>>,
    stalled_signatures: Mutex<Vec<String>>,
    panicking_signatures: Mutex<Vec<String>>,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    balances: Mutex<HashMap<Pubkey, u64>>,
    mints: Mutex<HashMap<Pubkey, MintInfo>>,
    transaction_fetches: AtomicUsize,
}

impl FakeChain {
    pub fn add_transaction(&self, signature: &str, tx: ParsedTransaction) {
        self.transactions.lock().unwrap().insert(signature.to_string(), tx);
    }

    /// Fetching this signature fails like an unreachable RPC node
    pub fn fail_transaction(&self, signature: &str) {
        self.failing_signatures.lock().unwrap().push(signature.to_string());
    }

    /// Fetching this signature never completes, like a hung RPC node
    pub fn stall_transaction(&self, signature: &str) {
        self.stalled_signatures.lock().unwrap().push(signature.to_string());
    }

    /// Fetching this signature panics inside the event task
    pub fn panic_on_transaction(&self, signature: &str) {
        self.panicking_signatures.lock().unwrap().push(signature.to_string());
    }

    pub fn add_account(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    pub fn set_balance(&self, token_account: Pubkey, amount: u64) {
        self.balances.lock().unwrap().insert(token_account, amount);
    }

    pub fn add_mint(&self, mint: Pubkey, info: MintInfo) {
        self.mints.lock().unwrap().insert(mint, info);
    }

    pub fn transaction_fetches(&self) -> usize {
        self.transaction_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn get_parsed_transaction(
        &self,
        signature: &str,
        _commitment: CommitmentConfig,
    ) -> WatcherResult<Option<ParsedTransaction>> {
        self.transaction_fetches.fetch_add(1, Ordering::SeqCst);
        let listed = |list: &Mutex<Vec<String>>| list.lock().unwrap().iter().any(|s| s == signature);

        if listed(&self.panicking_signatures) {
            panic!("fetch of {} blew up", signature);
        }
        if listed(&self.stalled_signatures) {
            std::future::pending::<()>().await;
        }
        if listed(&self.failing_signatures) {
            return Err(WatcherError::Rpc(
                ClientErrorKind::Custom(format!("rpc unreachable for {}", signature)).into(),
            ));
        }
        Ok(self.transactions.lock().unwrap().get(signature).cloned())
    }

    async fn get_account_data(&self, address: &Pubkey) -> WatcherResult<Option<Vec<u8>>> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> WatcherResult<u64> {
        self.balances.lock().unwrap().get(address).copied()
            .ok_or_else(|| WatcherError::NotFound(format!("token account {}", address)))
    }

    async fn get_mint_info(&self, mint: &Pubkey) -> WatcherResult<Option<MintInfo>> {
        Ok(self.mints.lock().unwrap().get(mint).cloned())
    }
}
