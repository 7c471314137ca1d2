use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

use crate::error::{WatcherError, WatcherResult};

/// Size of a Raydium AMM v4 pool account
pub const AMM_INFO_LEN: usize = 752;

#[allow(dead_code)]
#[derive(Debug, Clone, BorshDeserialize)]
struct Fees {
    min_separate_numerator: u64,
    min_separate_denominator: u64,
    trade_fee_numerator: u64,
    trade_fee_denominator: u64,
    pnl_numerator: u64,
    pnl_denominator: u64,
    swap_fee_numerator: u64,
    swap_fee_denominator: u64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, BorshDeserialize)]
struct StateData {
    need_take_pnl_coin: u64,
    need_take_pnl_pc: u64,
    total_pnl_pc: u64,
    total_pnl_coin: u64,
    pool_open_time: u64,
    punish_pc_amount: u64,
    punish_coin_amount: u64,
    orderbook_to_init_time: u64,
    swap_coin_in_amount: u128,
    swap_pc_out_amount: u128,
    swap_acc_pc_fee: u64,
    swap_pc_in_amount: u128,
    swap_coin_out_amount: u128,
    swap_acc_coin_fee: u64,
}

/// On-chain `AmmInfo` of the Raydium AMM v4 program, little-endian and unpadded.
/// "coin" is the base side, "pc" the quote side.
#[allow(dead_code)]
#[derive(Debug, Clone, BorshDeserialize)]
pub struct AmmPoolLayout {
    pub status: u64,
    nonce: u64,
    order_num: u64,
    depth: u64,
    pub coin_decimals: u64,
    pub pc_decimals: u64,
    state: u64,
    reset_flag: u64,
    min_size: u64,
    vol_max_cut_ratio: u64,
    amount_wave: u64,
    coin_lot_size: u64,
    pc_lot_size: u64,
    min_price_multiplier: u64,
    max_price_multiplier: u64,
    sys_decimal_value: u64,
    fees: Fees,
    state_data: StateData,
    coin_vault: [u8; 32],
    pc_vault: [u8; 32],
    coin_mint: [u8; 32],
    pc_mint: [u8; 32],
    lp_mint: [u8; 32],
    open_orders: [u8; 32],
    market: [u8; 32],
    market_program: [u8; 32],
    target_orders: [u8; 32],
    padding1: [u64; 8],
    amm_owner: [u8; 32],
    pub lp_amount: u64,
    client_order_id: u64,
    recent_epoch: u64,
    padding2: u64,
}

impl AmmPoolLayout {
    pub fn decode(data: &[u8]) -> WatcherResult<Self> {
        if data.len() < AMM_INFO_LEN {
            return Err(WatcherError::Decode(format!(
                "AMM account is {} bytes, expected {}",
                data.len(),
                AMM_INFO_LEN
            )));
        }
        let layout = Self::deserialize(&mut &data[..AMM_INFO_LEN])
            .map_err(|e| WatcherError::Decode(format!("AMM account layout: {}", e)))?;
        if layout.status == 0 {
            return Err(WatcherError::Decode("AMM account is not initialized".to_string()));
        }
        Ok(layout)
    }

    pub fn base_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.coin_vault)
    }

    pub fn quote_vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.pc_vault)
    }
}


#[cfg(test)]
pub(crate) fn synthetic_pool_account(base_vault: &Pubkey, quote_vault: &Pubkey) -> Vec<u8> {
    let mut data = vec![0u8; AMM_INFO_LEN];
    data[offsets::STATUS..offsets::STATUS + 8].copy_from_slice(&6u64.to_le_bytes());
    data[offsets::BASE_VAULT..offsets::BASE_VAULT + 32].copy_from_slice(base_vault.as_ref());
    data[offsets::QUOTE_VAULT..offsets::QUOTE_VAULT + 32].copy_from_slice(quote_vault.as_ref());
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_vaults_at_fixed_offsets() {
        let base = Pubkey::new_unique();
        let quote = Pubkey::new_unique();
        let data = synthetic_pool_account(&base, &quote);

        let layout = AmmPoolLayout::decode(&data).unwrap();
        assert_eq!(layout.base_vault(), base);
        assert_eq!(layout.quote_vault(), quote);
    }

    #[test]
    fn rejects_short_or_uninitialized_accounts() {
        assert!(AmmPoolLayout::decode(&[0u8; 100]).is_err());
        assert!(AmmPoolLayout::decode(&vec![0u8; AMM_INFO_LEN]).is_err());
    }
}
