/// Scale a raw token amount by its mint decimals
pub fn raw_to_ui(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}
