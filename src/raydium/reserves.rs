use log::debug;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::error::{WatcherError, WatcherResult};
use crate::models::PoolReserves;
use crate::raydium::layout::AmmPoolLayout;
use crate::solana::client::ChainClient;

/// Reads the current vault balances of a Raydium AMM v4 pool
pub struct ReserveResolver {
    client: Arc<dyn ChainClient>,
}

impl ReserveResolver {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Raw balances of the base and quote vaults. Decimal scaling is left to the caller.
    pub async fn resolve(&self, pool: &Pubkey) -> WatcherResult<PoolReserves> {
        let data = self.client.get_account_data(pool).await?
            .ok_or_else(|| WatcherError::NotFound(format!("pool account {}", pool)))?;

        let layout = AmmPoolLayout::decode(&data)?;
        let (base_vault, quote_vault) = (layout.base_vault(), layout.quote_vault());
        debug!("Pool {} vaults: base {} quote {}", pool, base_vault, quote_vault);

        let (base_reserve_raw, quote_reserve_raw) = tokio::try_join!(
            self.client.get_token_account_balance(&base_vault),
            self.client.get_token_account_balance(&quote_vault),
        )?;

        Ok(PoolReserves { base_reserve_raw, quote_reserve_raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::raydium::layout::synthetic_pool_account;
    use crate::testing::FakeChain;

    #[tokio::test]
    async fn returns_vault_balances() {
        let chain = FakeChain::default();
        let pool = Pubkey::new_unique();
        let (base_vault, quote_vault) = (Pubkey::new_unique(), Pubkey::new_unique());
        chain.add_account(pool, synthetic_pool_account(&base_vault, &quote_vault));
        chain.set_balance(base_vault, 1_000_000);
        chain.set_balance(quote_vault, 500);

        let resolver = ReserveResolver::new(Arc::new(chain));
        let reserves = resolver.resolve(&pool).await.unwrap();
        assert_eq!(reserves, PoolReserves { base_reserve_raw: 1_000_000, quote_reserve_raw: 500 });
    }

    #[tokio::test]
    async fn missing_pool_is_not_found() {
        let resolver = ReserveResolver::new(Arc::new(FakeChain::default()));
        let err = resolver.resolve(&Pubkey::new_unique()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn wrong_layout_is_decode_error() {
        let chain = FakeChain::default();
        let pool = Pubkey::new_unique();
        chain.add_account(pool, vec![1u8; 165]);
        let resolver = ReserveResolver::new(Arc::new(chain));
        assert_eq!(resolver.resolve(&pool).await.unwrap_err().kind(), ErrorKind::Decode);
    }
}
