use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;

use crate::db::store::{InsertOutcome, WatchlistQuery, WatchlistStore};
use crate::error::{WatcherError, WatcherResult};
use crate::models::{BaseTokenInfo, PoolRecord, PoolReserves, QuoteTokenInfo};

const MEMORY_URL: &str = "sqlite::memory:";

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// An in-memory database lives only as long as its one connection, so that
/// connection is opened eagerly and never reaped or recycled.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if is_memory_url(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

/// Database manager for the pool watchlist
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);

        let pool = pool_options(database_url)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", database_url))?;

        let db = Self { pool };
        db.init_schema().await?;

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pools (
                signature TEXT PRIMARY KEY,
                creator TEXT,
                pool_address TEXT,
                discovered_at TIMESTAMP NOT NULL,
                base_address TEXT,
                base_decimals INTEGER NOT NULL,
                base_lp_amount TEXT NOT NULL,
                base_name TEXT NOT NULL,
                base_symbol TEXT NOT NULL,
                quote_address TEXT,
                quote_decimals INTEGER NOT NULL,
                quote_lp_amount TEXT NOT NULL,
                base_reserve_raw TEXT NOT NULL,
                quote_reserve_raw TEXT NOT NULL,
                open_time TEXT,
                market TEXT,
                raw_logs TEXT NOT NULL,
                raw_transaction TEXT
            )"
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_pools_pool_address ON pools (pool_address)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_pools_creator ON pools (creator)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count(&self) -> WatcherResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pools")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Plain insert; a primary-key collision comes back as `Duplicate`
    async fn insert(&self, record: &PoolRecord) -> WatcherResult<()> {
        let raw_logs = serde_json::to_string(&record.raw_logs)?;
        let raw_transaction = record.raw_transaction.as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            "INSERT INTO pools (
                signature, creator, pool_address, discovered_at,
                base_address, base_decimals, base_lp_amount, base_name, base_symbol,
                quote_address, quote_decimals, quote_lp_amount,
                base_reserve_raw, quote_reserve_raw, open_time, market, raw_logs, raw_transaction
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        )
        .bind(&record.signature)
        .bind(&record.creator)
        .bind(&record.pool_address)
        .bind(record.discovered_at)
        .bind(&record.base_token.address)
        .bind(record.base_token.decimals as i64)
        .bind(record.base_token.lp_amount.to_string())
        .bind(&record.base_token.name)
        .bind(&record.base_token.symbol)
        .bind(&record.quote_token.address)
        .bind(record.quote_token.decimals as i64)
        .bind(record.quote_token.lp_amount.to_string())
        .bind(record.reserves.base_reserve_raw.to_string())
        .bind(record.reserves.quote_reserve_raw.to_string())
        .bind(record.open_time.map(|t| t.to_string()))
        .bind(&record.market)
        .bind(raw_logs)
        .bind(raw_transaction)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(WatcherError::Duplicate(record.signature.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl WatchlistStore for Database {
    async fn insert_if_absent(&self, record: &PoolRecord) -> WatcherResult<InsertOutcome> {
        let existing = self.find_one(&WatchlistQuery::Signature(record.signature.clone())).await?;
        if existing.is_some() {
            debug!("Signature {} already in the watchlist", record.signature);
            return Ok(InsertOutcome { inserted: false });
        }

        match self.insert(record).await {
            Ok(()) => Ok(InsertOutcome { inserted: true }),
            Err(WatcherError::Duplicate(signature)) => {
                debug!("Signature {} inserted concurrently, skipping", signature);
                Ok(InsertOutcome { inserted: false })
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_all(&self) -> WatcherResult<u64> {
        let result = sqlx::query("DELETE FROM pools").execute(&self.pool).await?;
        info!("Deleted {} watchlist records", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn find_one(&self, query: &WatchlistQuery) -> WatcherResult<Option<PoolRecord>> {
        let (column, value) = match query {
            WatchlistQuery::Signature(v) => ("signature", v),
            WatchlistQuery::PoolAddress(v) => ("pool_address", v),
            WatchlistQuery::Creator(v) => ("creator", v),
        };
        let sql = format!("SELECT * FROM pools WHERE {} = ?1 ORDER BY discovered_at LIMIT 1", column);

        let row: Option<PoolRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PoolRecord::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
struct PoolRow {
    signature: String,
    creator: Option<String>,
    pool_address: Option<String>,
    discovered_at: DateTime<Utc>,
    base_address: Option<String>,
    base_decimals: i64,
    base_lp_amount: String,
    base_name: String,
    base_symbol: String,
    quote_address: Option<String>,
    quote_decimals: i64,
    quote_lp_amount: String,
    base_reserve_raw: String,
    quote_reserve_raw: String,
    open_time: Option<String>,
    market: Option<String>,
    raw_logs: String,
    raw_transaction: Option<String>,
}

fn column_u64(column: &str, value: &str) -> WatcherResult<u64> {
    value.parse()
        .map_err(|e| WatcherError::Decode(format!("column {} holds {:?}: {}", column, value, e)))
}

fn column_u8(column: &str, value: i64) -> WatcherResult<u8> {
    u8::try_from(value)
        .map_err(|e| WatcherError::Decode(format!("column {} holds {}: {}", column, value, e)))
}

impl TryFrom<PoolRow> for PoolRecord {
    type Error = WatcherError;

    fn try_from(row: PoolRow) -> WatcherResult<Self> {
        Ok(PoolRecord {
            base_token: BaseTokenInfo {
                address: row.base_address,
                decimals: column_u8("base_decimals", row.base_decimals)?,
                lp_amount: column_u64("base_lp_amount", &row.base_lp_amount)?,
                name: row.base_name,
                symbol: row.base_symbol,
            },
            quote_token: QuoteTokenInfo {
                address: row.quote_address,
                decimals: column_u8("quote_decimals", row.quote_decimals)?,
                lp_amount: column_u64("quote_lp_amount", &row.quote_lp_amount)?,
            },
            reserves: PoolReserves {
                base_reserve_raw: column_u64("base_reserve_raw", &row.base_reserve_raw)?,
                quote_reserve_raw: column_u64("quote_reserve_raw", &row.quote_reserve_raw)?,
            },
            open_time: row.open_time.as_deref()
                .map(|t| column_u64("open_time", t))
                .transpose()?,
            market: row.market,
            raw_logs: serde_json::from_str(&row.raw_logs)?,
            raw_transaction: row.raw_transaction.as_deref().map(serde_json::from_str).transpose()?,
            signature: row.signature,
            creator: row.creator,
            pool_address: row.pool_address,
            discovered_at: row.discovered_at,
        })
    }
}

/// Initialize an in-memory database for testing
#[cfg(test)]
pub async fn init_test_db() -> Result<Database> {
    Database::new(MEMORY_URL).await
}
