use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::config::Config;
use crate::db::{InsertOutcome, WatchlistStore};
use crate::error::{WatcherError, WatcherResult};
use crate::models::{
    BaseTokenInfo, LogNotification, ParsedTransaction, PoolRecord, PoolReserves, QuoteTokenInfo, TokenMeta,
};
use crate::raydium::{EventExtractor, EventFacts, Extraction, ReserveResolver};
use crate::solana::{parse_commitment, parse_pubkey, resolve_token_meta, ChainClient, TransactionFetcher};
use crate::utils::{raw_to_ui, short_id};

/// Lifecycle of one notification through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStage {
    Received,
    Fetched,
    Extracted,
    Enriched,
    Persisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The feed already marked the transaction as failed
    Skipped,
    /// Reached the store; `inserted` is false when the signature was already recorded
    Persisted { inserted: bool },
}

#[derive(Debug, Error)]
#[error("{stage:?} stage failed for {signature}: {source}")]
pub struct EventFailure {
    pub signature: String,
    pub stage: EventStage,
    #[source]
    pub source: WatcherError,
}

/// Totals reported when the pipeline drains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Turns log notifications into watchlist records
pub struct Pipeline {
    chain: Arc<dyn ChainClient>,
    store: Arc<dyn WatchlistStore>,
    fetcher: TransactionFetcher,
    extractor: EventExtractor,
    resolver: ReserveResolver,
    max_in_flight: usize,
}

impl Pipeline {
    pub fn new(chain: Arc<dyn ChainClient>, store: Arc<dyn WatchlistStore>, config: &Config) -> WatcherResult<Self> {
        let commitment = parse_commitment(&config.fetch_commitment)?;
        Ok(Self {
            fetcher: TransactionFetcher::new(chain.clone(), commitment),
            extractor: EventExtractor::from_config(config),
            resolver: ReserveResolver::new(chain.clone()),
            max_in_flight: config.max_in_flight_events.max(1),
            chain,
            store,
        })
    }

    /// Clear the watchlist before a run. Failure is logged and ignored.
    pub async fn purge_watchlist(&self) {
        match self.store.delete_all().await {
            Ok(count) => info!("Purged {} records from the watchlist", count),
            Err(e) => error!("Failed to purge watchlist: {}", e),
        }
    }

    /// Drive one notification from receipt to the store
    pub async fn process(&self, notification: LogNotification) -> Result<EventOutcome, EventFailure> {
        let signature = notification.signature.clone();
        let id = short_id(&signature);

        if notification.failed() {
            debug!("{} skipped, transaction failed: {:?}", id, notification.err);
            return Ok(EventOutcome::Skipped);
        }
        debug!("{} {:?}", id, EventStage::Received);

        let tx = self.fetcher.fetch(&signature).await.map_err(|source| EventFailure {
            signature: signature.clone(),
            stage: EventStage::Fetched,
            source,
        })?;
        debug!("{} {:?}", id, EventStage::Fetched);

        let extraction = self.extractor.extract(&signature, tx.as_ref(), &notification.logs);
        debug!("{} {:?}", id, EventStage::Extracted);

        let record = match extraction {
            Extraction::Facts(facts) => self.enrich(facts, tx.as_ref(), notification.logs).await,
            Extraction::Incomplete { signature } => {
                warn!("{} has no usable transaction data, recording signature only", id);
                incomplete_record(signature, tx.as_ref(), notification.logs)
            }
        };
        debug!("{} {:?}", id, EventStage::Enriched);

        let outcome = match self.store.insert_if_absent(&record).await {
            Ok(outcome) => outcome,
            Err(WatcherError::Duplicate(_)) => InsertOutcome { inserted: false },
            Err(source) => {
                return Err(EventFailure { signature, stage: EventStage::Persisted, source });
            }
        };

        if outcome.inserted {
            info!(
                "New pool recorded: {} (pool {}, creator {})",
                id,
                record.pool_address.as_deref().unwrap_or("-"),
                record.creator.as_deref().unwrap_or("-")
            );
        } else {
            debug!("{} already on the watchlist", id);
        }
        Ok(EventOutcome::Persisted { inserted: outcome.inserted })
    }

    async fn enrich(&self, facts: EventFacts, tx: Option<&ParsedTransaction>, logs: Vec<String>) -> PoolRecord {
        let reserves = match &facts.pool_address {
            Some(pool) => self.pool_reserves(pool).await,
            None => PoolReserves::default(),
        };

        let base_side = facts.base.unwrap_or_default();
        let quote_side = facts.quote.unwrap_or_default();

        let meta = match base_side.mint.as_deref().map(parse_pubkey) {
            Some(Ok(mint)) => resolve_token_meta(self.chain.as_ref(), &mint).await,
            Some(Err(e)) => {
                warn!("Base mint is not a valid address: {}", e);
                TokenMeta::default()
            }
            None => TokenMeta::default(),
        };

        let base_token = BaseTokenInfo {
            address: base_side.mint,
            decimals: base_side.decimals.unwrap_or(meta.decimals),
            lp_amount: base_side.lp_amount,
            name: meta.name,
            symbol: meta.symbol,
        };
        let quote_token = QuoteTokenInfo {
            address: quote_side.mint,
            decimals: quote_side.decimals.unwrap_or(0),
            lp_amount: quote_side.lp_amount,
        };

        if facts.pool_address.is_some() {
            info!(
                "{} reserves: {} {} / {} quote",
                short_id(&facts.signature),
                raw_to_ui(reserves.base_reserve_raw, base_token.decimals),
                base_token.symbol,
                raw_to_ui(reserves.quote_reserve_raw, quote_token.decimals)
            );
        }

        PoolRecord {
            signature: facts.signature,
            creator: facts.creator,
            pool_address: facts.pool_address,
            discovered_at: Utc::now(),
            base_token,
            quote_token,
            reserves,
            open_time: facts.open_time,
            market: facts.market,
            raw_logs: logs,
            raw_transaction: tx.map(|tx| tx.raw.clone()),
        }
    }

    async fn pool_reserves(&self, pool: &str) -> PoolReserves {
        let address = match parse_pubkey(pool) {
            Ok(address) => address,
            Err(e) => {
                warn!("Pool address {} is not valid: {}", pool, e);
                return PoolReserves::default();
            }
        };
        match self.resolver.resolve(&address).await {
            Ok(reserves) => reserves,
            Err(e) => {
                warn!("Could not read reserves of {} ({:?}): {}", pool, e.kind(), e);
                PoolReserves::default()
            }
        }
    }

    /// Consume the event queue until it closes, one task per event.
    ///
    /// At most `max_in_flight_events` run at once; beyond that the queue is left
    /// to fill so senders wait. In-flight events are drained before returning.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<LogNotification>) -> PipelineSummary {
        let mut tasks = JoinSet::new();
        let mut summary = PipelineSummary::default();

        loop {
            tokio::select! {
                next = rx.recv(), if tasks.len() < self.max_in_flight => match next {
                    Some(notification) => {
                        let pipeline = self.clone();
                        tasks.spawn(async move { pipeline.process(notification).await });
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    summary.record(joined);
                }
            }
        }

        debug!("Event queue closed, draining {} in-flight events", tasks.len());
        while let Some(joined) = tasks.join_next().await {
            summary.record(joined);
        }

        info!(
            "Pipeline stopped: {} inserted, {} duplicates, {} skipped, {} failed",
            summary.inserted, summary.duplicates, summary.skipped, summary.failed
        );
        summary
    }
}

impl PipelineSummary {
    fn record(&mut self, joined: Result<Result<EventOutcome, EventFailure>, JoinError>) {
        match joined {
            Ok(Ok(EventOutcome::Persisted { inserted: true })) => self.inserted += 1,
            Ok(Ok(EventOutcome::Persisted { inserted: false })) => self.duplicates += 1,
            Ok(Ok(EventOutcome::Skipped)) => self.skipped += 1,
            Ok(Err(failure)) => {
                error!("Dropping event: {}", failure);
                self.failed += 1;
            }
            Err(e) => {
                error!("Event task aborted: {}", e);
                self.failed += 1;
            }
        }
    }
}

fn incomplete_record(signature: String, tx: Option<&ParsedTransaction>, logs: Vec<String>) -> PoolRecord {
    PoolRecord {
        signature,
        creator: None,
        pool_address: None,
        discovered_at: Utc::now(),
        base_token: BaseTokenInfo::default(),
        quote_token: QuoteTokenInfo::default(),
        reserves: PoolReserves::default(),
        open_time: None,
        market: None,
        raw_logs: logs,
        raw_transaction: tx.map(|tx| tx.raw.clone()),
    }
}
