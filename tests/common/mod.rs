//! A scripted logs feed served over a local websocket.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// What the feed does on one accepted connection
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Acknowledge, send `frames`, then close the socket if `close` is set
    Ack { frames: Vec<String>, close: bool },
    /// Send `noise` before acknowledging, then `frames`, and stay open
    AckAfter { noise: Vec<String>, frames: Vec<String> },
    /// Answer the subscribe request with a JSON-RPC error
    Reject,
}

#[derive(Debug)]
pub enum FeedEvent {
    Connected(Instant),
    /// A text frame sent by the client
    Request(String),
    Closed(Instant),
}

pub struct ScriptedFeed {
    pub url: String,
    pub events: mpsc::UnboundedReceiver<FeedEvent>,
    pub handle: JoinHandle<()>,
}

impl ScriptedFeed {
    pub async fn start(script: Vec<Behaviour>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (events_tx, events) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            for behaviour in script {
                let (stream, _) = listener.accept().await.unwrap();
                let _ = events_tx.send(FeedEvent::Connected(Instant::now()));
                let mut ws = accept_async(stream).await.unwrap();

                if let Some(Ok(Message::Text(request))) = ws.next().await {
                    let _ = events_tx.send(FeedEvent::Request(request));
                }

                match behaviour {
                    Behaviour::Reject => {
                        let error = json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "Invalid params"}});
                        let _ = ws.send(Message::Text(error.to_string())).await;
                        let _ = ws.close(None).await;
                        let _ = events_tx.send(FeedEvent::Closed(Instant::now()));
                    }
                    Behaviour::AckAfter { noise, frames } => {
                        for frame in noise {
                            ws.send(Message::Text(frame)).await.unwrap();
                        }
                        let ack = json!({"jsonrpc": "2.0", "id": 1, "result": 7});
                        ws.send(Message::Text(ack.to_string())).await.unwrap();
                        for frame in frames {
                            ws.send(Message::Text(frame)).await.unwrap();
                        }
                    }
                    Behaviour::Ack { frames, close } => {
                        let ack = json!({"jsonrpc": "2.0", "id": 1, "result": 7});
                        ws.send(Message::Text(ack.to_string())).await.unwrap();
                        for frame in frames {
                            ws.send(Message::Text(frame)).await.unwrap();
                        }
                        if close {
                            let _ = ws.close(None).await;
                            let _ = events_tx.send(FeedEvent::Closed(Instant::now()));
                        }
                    }
                }

                // Record anything else the client sends until it goes away
                while let Some(Ok(message)) = ws.next().await {
                    if let Message::Text(text) = message {
                        let _ = events_tx.send(FeedEvent::Request(text));
                    }
                }
            }
        });

        Self { url, events, handle }
    }

    /// Every event recorded so far
    pub fn drain(&mut self) -> Vec<FeedEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub fn notification(signature: &str, logs: &[&str]) -> String {
    json!({
        "jsonrpc": "2.0",
        "method": "logsNotification",
        "params": {
            "result": {
                "context": {"slot": 1},
                "value": {"signature": signature, "err": null, "logs": logs}
            },
            "subscription": 7
        }
    })
    .to_string()
}
