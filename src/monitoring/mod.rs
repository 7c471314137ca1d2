pub mod pool_monitor;
mod websocket;

pub use pool_monitor::PoolMonitor;
pub use websocket::LogsSubscriber;
