mod common;

use common::{notification, Behaviour, FeedEvent, ScriptedFeed};
use raydium_pool_watcher::models::LogNotification;
use raydium_pool_watcher::monitoring::{LogsSubscriber, PoolMonitor};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

const WATCHED: &str = "7YttLkHDoNj9wyDur5pM1ejNaAvT9X4eqaYcHQqtj2G5";
const DELAY: Duration = Duration::from_millis(300);

fn spawn_subscriber(url: &str) -> (mpsc::Receiver<LogNotification>, JoinHandle<()>) {
    let mut subscriber = LogsSubscriber::new(url, WATCHED, "processed")
        .with_reconnect_delay(DELAY)
        .with_ack_timeout(Duration::from_secs(2));
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(async move {
        subscriber.start_monitoring(tx).await.unwrap();
    });
    (rx, handle)
}

async fn next_signature(rx: &mut mpsc::Receiver<LogNotification>) -> String {
    timeout(Duration::from_secs(5), rx.recv()).await
        .expect("no notification in time")
        .expect("queue closed")
        .signature
}

/// Stop the subscriber by dropping the queue, then wait for the feed script to finish
async fn shut_down(rx: mpsc::Receiver<LogNotification>, subscriber: JoinHandle<()>, feed: &mut ScriptedFeed) -> Vec<FeedEvent> {
    drop(rx);
    timeout(Duration::from_secs(5), subscriber).await.unwrap().unwrap();
    timeout(Duration::from_secs(5), &mut feed.handle).await.unwrap().unwrap();
    feed.drain()
}

fn requests(events: &[FeedEvent]) -> Vec<Value> {
    events.iter()
        .filter_map(|e| match e {
            FeedEvent::Request(text) => Some(serde_json::from_str(text).unwrap()),
            _ => None,
        })
        .collect()
}

fn connections(events: &[FeedEvent]) -> usize {
    events.iter().filter(|e| matches!(e, FeedEvent::Connected(_))).count()
}

#[tokio::test]
async fn reconnects_once_after_the_delay_and_resubscribes() {
    let mut feed = ScriptedFeed::start(vec![
        Behaviour::Ack { frames: vec![notification("FIRST", &[])], close: true },
        Behaviour::Ack { frames: vec![notification("SECOND", &[])], close: false },
    ])
    .await;
    let (mut rx, subscriber) = spawn_subscriber(&feed.url);

    assert_eq!(next_signature(&mut rx).await, "FIRST");
    assert_eq!(next_signature(&mut rx).await, "SECOND");

    let events = shut_down(rx, subscriber, &mut feed).await;
    assert_eq!(connections(&events), 2);

    // One subscribe per connection and nothing else
    let requests = requests(&events);
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request["method"], "logsSubscribe");
        assert_eq!(request["params"][0]["mentions"][0], WATCHED);
        assert_eq!(request["params"][1]["commitment"], "processed");
    }

    let closed_at = events.iter().find_map(|e| match e {
        FeedEvent::Closed(at) => Some(*at),
        _ => None,
    });
    let reconnected_at = events.iter().filter_map(|e| match e {
        FeedEvent::Connected(at) => Some(*at),
        _ => None,
    })
    .nth(1);
    let gap = reconnected_at.unwrap() - closed_at.unwrap();
    assert!(gap >= DELAY, "reconnected after {:?}", gap);
    assert!(gap < DELAY + Duration::from_secs(2), "reconnected after {:?}", gap);
}

#[tokio::test]
async fn malformed_messages_do_not_drop_the_connection() {
    let mut feed = ScriptedFeed::start(vec![Behaviour::Ack {
        frames: vec![
            "not json".to_string(),
            r#"{"method":"logsNotification","params":{"result":{}}}"#.to_string(),
            r#"{"method":"slotNotification","params":{}}"#.to_string(),
            notification("GOOD", &["Program log: hi"]),
        ],
        close: false,
    }])
    .await;
    let (mut rx, subscriber) = spawn_subscriber(&feed.url);

    assert_eq!(next_signature(&mut rx).await, "GOOD");

    let events = shut_down(rx, subscriber, &mut feed).await;
    assert_eq!(connections(&events), 1);
    assert_eq!(requests(&events).len(), 1);
}

#[tokio::test]
async fn rejected_subscription_takes_the_reconnect_path() {
    let mut feed = ScriptedFeed::start(vec![
        Behaviour::Reject,
        Behaviour::Ack { frames: vec![notification("AFTER", &[])], close: false },
    ])
    .await;
    let (mut rx, subscriber) = spawn_subscriber(&feed.url);

    assert_eq!(next_signature(&mut rx).await, "AFTER");

    let events = shut_down(rx, subscriber, &mut feed).await;
    assert_eq!(connections(&events), 2);
    assert_eq!(requests(&events).len(), 2);
}

#[tokio::test]
async fn errors_for_other_requests_do_not_reject_the_subscription() {
    let mut feed = ScriptedFeed::start(vec![Behaviour::AckAfter {
        noise: vec![
            r#"{"jsonrpc":"2.0","id":99,"error":{"code":-32601,"message":"Method not found"}}"#.to_string(),
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#.to_string(),
        ],
        frames: vec![notification("KEPT", &[])],
    }])
    .await;
    let (mut rx, subscriber) = spawn_subscriber(&feed.url);

    assert_eq!(next_signature(&mut rx).await, "KEPT");

    let events = shut_down(rx, subscriber, &mut feed).await;
    assert_eq!(connections(&events), 1);
    assert_eq!(requests(&events).len(), 1);
}
