use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::WatcherResult;
use crate::models::LogNotification;

/// Trait for sources of pool-creation events
#[async_trait]
pub trait PoolMonitor: Send {
    /// Push every matching notification onto `tx` until the receiver is dropped
    async fn start_monitoring(&mut self, tx: mpsc::Sender<LogNotification>) -> WatcherResult<()>;
}
