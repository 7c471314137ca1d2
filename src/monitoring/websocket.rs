use async_trait::async_trait;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::Config;
use crate::error::{WatcherError, WatcherResult};
use crate::models::{decode_feed_message, FeedMessage, LogNotification};
use crate::monitoring::pool_monitor::PoolMonitor;
use crate::utils::short_id;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIBE_ID: u64 = 1;

/// How a single connection ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The feed went away; reconnect
    Disconnected,
    /// Nobody is listening any more; stop for good
    ReceiverGone,
}

/// Watches a Solana websocket `logsSubscribe` feed for transactions mentioning one address.
///
/// Runs forever: every disconnect or failed subscribe is followed by a fixed
/// delay and a fresh connection with exactly one subscribe request.
pub struct LogsSubscriber {
    ws_url: String,
    mentions: String,
    commitment: String,
    reconnect_delay: Duration,
    ack_timeout: Duration,
}

impl LogsSubscriber {
    pub fn new(ws_url: &str, mentions: &str, commitment: &str) -> Self {
        let defaults = Config::default();
        Self {
            ws_url: ws_url.to_string(),
            mentions: mentions.to_string(),
            commitment: commitment.to_string(),
            reconnect_delay: defaults.reconnect_delay(),
            ack_timeout: defaults.subscribe_ack_timeout(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.ws_url, &config.watch_address, &config.subscribe_commitment)
            .with_reconnect_delay(config.reconnect_delay())
            .with_ack_timeout(config.subscribe_ack_timeout())
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    fn subscribe_request(&self) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": SUBSCRIBE_ID,
            "method": "logsSubscribe",
            "params": [
                { "mentions": [self.mentions] },
                { "commitment": self.commitment }
            ]
        })
        .to_string()
    }

    async fn run_session(&self, tx: &mpsc::Sender<LogNotification>) -> WatcherResult<SessionEnd> {
        let (ws_stream, _) = connect_async(self.ws_url.as_str()).await?;
        info!("Connected to {}", self.ws_url);

        let (mut write, mut read) = ws_stream.split();
        write.send(Message::Text(self.subscribe_request())).await?;

        let subscription = match timeout(self.ack_timeout, await_ack(&mut read)).await {
            Ok(ack) => ack?,
            Err(_) => {
                return Err(WatcherError::SubscribeRejected(format!(
                    "no acknowledgement within {:?}",
                    self.ack_timeout
                )))
            }
        };
        info!("Subscribed to logs mentioning {} (subscription {})", self.mentions, subscription);

        loop {
            let frame = tokio::select! {
                frame = read.next() => frame,
                _ = tx.closed() => return Ok(SessionEnd::ReceiverGone),
            };

            match frame {
                Some(Ok(Message::Text(text))) => match decode_feed_message(&text) {
                    Ok(FeedMessage::Notification(notification)) => {
                        debug!("Received {}", short_id(&notification.signature));
                        if tx.send(notification).await.is_err() {
                            return Ok(SessionEnd::ReceiverGone);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping malformed feed message: {}", e),
                },
                Some(Ok(Message::Ping(payload))) => write.send(Message::Pong(payload)).await?,
                Some(Ok(Message::Close(frame))) => {
                    info!("Feed closed the connection: {:?}", frame);
                    return Ok(SessionEnd::Disconnected);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(SessionEnd::Disconnected),
            }
        }
    }
}

/// Wait for the reply to our subscribe request
async fn await_ack(read: &mut SplitStream<WsStream>) -> WatcherResult<u64> {
    while let Some(frame) = read.next().await {
        match frame? {
            Message::Text(text) => match decode_feed_message(&text) {
                Ok(FeedMessage::SubscribeAck { id, subscription }) if id == SUBSCRIBE_ID => {
                    return Ok(subscription);
                }
                Ok(FeedMessage::SubscribeError { id: Some(SUBSCRIBE_ID), message }) => {
                    return Err(WatcherError::SubscribeRejected(message));
                }
                Ok(FeedMessage::SubscribeError { id, message }) => {
                    debug!("Ignoring error for request {:?}: {}", id, message);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping malformed feed message: {}", e),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
    Err(WatcherError::SubscribeRejected("feed closed before acknowledging".to_string()))
}

#[async_trait]
impl PoolMonitor for LogsSubscriber {
    async fn start_monitoring(&mut self, tx: mpsc::Sender<LogNotification>) -> WatcherResult<()> {
        info!("Starting logs subscription on {} (commitment {})", self.ws_url, self.commitment);

        loop {
            match self.run_session(&tx).await {
                Ok(SessionEnd::ReceiverGone) => {
                    info!("Event queue closed, stopping logs subscription");
                    return Ok(());
                }
                Ok(SessionEnd::Disconnected) => warn!("Logs feed disconnected"),
                Err(e) => error!("Logs feed session failed: {}", e),
            }

            info!("Reconnecting in {:?}", self.reconnect_delay);
            tokio::select! {
                _ = sleep(self.reconnect_delay) => {}
                _ = tx.closed() => {
                    info!("Event queue closed, stopping logs subscription");
                    return Ok(());
                }
            }
        }
    }
}
