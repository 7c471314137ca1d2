pub mod notification;
pub mod pool;
pub mod transaction;

pub use notification::{decode_feed_message, FeedMessage, LogNotification};
pub use pool::{BaseTokenInfo, MintInfo, PoolRecord, PoolReserves, QuoteTokenInfo, TokenMeta};
pub use transaction::{InnerInstruction, InnerInstructionGroup, ParsedTransaction, TokenBalance};
