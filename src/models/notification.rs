use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WatcherError, WatcherResult};

/// A single `logsNotification` delivered by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogNotification {
    pub signature: String,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub err: Option<Value>,
}

impl LogNotification {
    /// The feed reports the transaction itself as failed
    pub fn failed(&self) -> bool {
        self.err.as_ref().map_or(false, |err| !err.is_null())
    }
}

/// Every inbound feed message the subscriber cares about
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    SubscribeAck { id: u64, subscription: u64 },
    SubscribeError { id: Option<u64>, message: String },
    Notification(LogNotification),
    Other,
}

#[derive(Deserialize)]
struct LogsParams {
    result: LogsResult,
}

#[derive(Deserialize)]
struct LogsResult {
    value: LogsValue,
}

#[derive(Deserialize)]
struct LogsValue {
    signature: String,
    #[serde(default)]
    logs: Option<Vec<String>>,
    #[serde(default)]
    err: Option<Value>,
}

/// Decode one text frame from the feed.
///
/// Only a `logsNotification` with a broken payload is an error; shapes we don't
/// recognise come back as `FeedMessage::Other`.
pub fn decode_feed_message(text: &str) -> WatcherResult<FeedMessage> {
    let value: Value = serde_json::from_str(text)?;

    if value.get("method").and_then(Value::as_str) == Some("logsNotification") {
        let params = value.get("params").cloned()
            .ok_or_else(|| WatcherError::Decode("logsNotification without params".to_string()))?;
        let params: LogsParams = serde_json::from_value(params)
            .map_err(|e| WatcherError::Decode(format!("logsNotification payload: {}", e)))?;
        let inner = params.result.value;
        return Ok(FeedMessage::Notification(LogNotification {
            signature: inner.signature,
            logs: inner.logs.unwrap_or_default(),
            err: inner.err.filter(|err| !err.is_null()),
        }));
    }

    let id = value.get("id").and_then(Value::as_u64);

    if let Some(error) = value.get("error") {
        let message = error.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Ok(FeedMessage::SubscribeError { id, message });
    }

    if let (Some(id), Some(subscription)) = (id, value.get("result").and_then(Value::as_u64)) {
        return Ok(FeedMessage::SubscribeAck { id, subscription });
    }

    Ok(FeedMessage::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_notification() {
        let text = r#"{"jsonrpc":"2.0","method":"logsNotification","params":{"result":{"context":{"slot":5},"value":{"signature":"SIG1","err":null,"logs":["a","b"]}},"subscription":7}}"#;
        let msg = decode_feed_message(text).unwrap();
        assert_eq!(
            msg,
            FeedMessage::Notification(LogNotification {
                signature: "SIG1".to_string(),
                logs: vec!["a".to_string(), "b".to_string()],
                err: None,
            })
        );
    }

    #[test]
    fn keeps_transaction_error() {
        let text = r#"{"method":"logsNotification","params":{"result":{"value":{"signature":"S","err":{"InstructionError":[0,"Custom"]},"logs":null}}}}"#;
        match decode_feed_message(text).unwrap() {
            FeedMessage::Notification(n) => {
                assert!(n.failed());
                assert!(n.logs.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn decodes_ack_and_error() {
        assert_eq!(
            decode_feed_message(r#"{"jsonrpc":"2.0","result":42,"id":1}"#).unwrap(),
            FeedMessage::SubscribeAck { id: 1, subscription: 42 }
        );
        assert_eq!(
            decode_feed_message(r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params"},"id":1}"#).unwrap(),
            FeedMessage::SubscribeError { id: Some(1), message: "Invalid params".to_string() }
        );
    }

    #[test]
    fn ignores_unknown_shapes_and_rejects_garbage() {
        assert_eq!(decode_feed_message(r#"{"method":"slotNotification"}"#).unwrap(), FeedMessage::Other);
        assert!(decode_feed_message("not json").is_err());
        assert!(decode_feed_message(r#"{"method":"logsNotification","params":{"result":{}}}"#).is_err());
    }
}
