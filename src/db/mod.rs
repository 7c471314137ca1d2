mod sqlite;
pub mod store;

pub use sqlite::Database;
pub use store::{InsertOutcome, WatchlistQuery, WatchlistStore};
