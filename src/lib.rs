pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod pipeline;
pub mod raydium;
pub mod solana;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;
