//! Stream session state machine
//!
//! One session owns the socket lifecycle for one symbol: connect, route
//! inbound frames to the store, buffer trades and flush them on a fixed
//! cadence, and retry after a fixed delay when the transport drops. The
//! whole lifecycle runs inside a single spawned task, so depth deltas hit
//! the store in strict arrival order and nothing needs a lock beyond the
//! store's own.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::WsClient;
use crate::config::Config;
use crate::parser::ParsedMessage;
use crate::store::{ConnectionStatus, MarketStore};
use crate::trades::Trade;

/// Handle to a running stream session.
///
/// Dropping the handle leaves the task running; call
/// [`StreamSession::shutdown`] to stop it. Shutdown awaits the task, so
/// once it returns no callback of this session can touch the store again.
pub struct StreamSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamSession {
    /// Spawn a session for one symbol. The task starts connecting
    /// immediately; starting twice is impossible since spawning is the
    /// only entry point.
    pub fn spawn(symbol: &str, store: Arc<MarketStore>, config: Arc<Config>) -> Self {
        let cancel = CancellationToken::new();
        let runner = SessionRunner {
            symbol: symbol.to_lowercase(),
            store,
            config,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(runner.run());
        Self { cancel, task }
    }

    /// Stop the session and wait for its task to finish. Idempotent with
    /// respect to the token; safe to call while the task is mid-reconnect.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

struct SessionRunner {
    symbol: String,
    store: Arc<MarketStore>,
    config: Arc<Config>,
    cancel: CancellationToken,
}

impl SessionRunner {
    /// Connect-process-retry loop. Every attempt starts from a clean
    /// store: deltas missed while disconnected make the retained book
    /// unusable, so reconnects rebuild from scratch too.
    async fn run(self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.store.reset().await;
            self.store
                .set_connection_status(ConnectionStatus::Connecting)
                .await;

            let mut client = WsClient::new(&self.config.ws_endpoint, &self.symbol);
            let connect_result = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = client.connect() => result,
            };
            match connect_result {
                Ok(()) => {
                    self.store
                        .set_connection_status(ConnectionStatus::Connected)
                        .await;
                    self.pump(&mut client).await;
                    client.close().await;
                }
                Err(e) => {
                    warn!(symbol = %self.symbol, error = %e, "Connection attempt failed");
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }

            self.store
                .set_connection_status(ConnectionStatus::Disconnected)
                .await;

            let delay = Duration::from_millis(self.config.reconnect_delay_ms);
            info!(
                symbol = %self.symbol,
                delay_secs = delay.as_secs(),
                "Scheduling reconnect"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        debug!(symbol = %self.symbol, "Session task exiting");
    }

    /// Process frames until the transport drops or the session is
    /// cancelled. Trades accumulate locally and reach the store only on
    /// the flush tick, bounding trade-driven update frequency no matter
    /// how bursty the feed is.
    async fn pump(&self, client: &mut WsClient) {
        let mut pending: Vec<Trade> = Vec::new();
        let mut flush = interval(Duration::from_millis(self.config.trade_flush_interval_ms));
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = flush.tick() => {
                    flush_pending(&self.store, &mut pending).await;
                }
                frame = client.recv() => match frame {
                    Ok(Some(text)) => route_frame(&self.store, &text, &mut pending).await,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(symbol = %self.symbol, error = %e, "Transport failure");
                        return;
                    }
                }
            }
        }
    }
}

/// Classify one frame and route it: depth deltas apply to the store in
/// arrival order, trades go to the pending buffer, anything else is
/// dropped with a log line.
async fn route_frame(store: &MarketStore, raw: &str, pending: &mut Vec<Trade>) {
    match ParsedMessage::parse(raw) {
        ParsedMessage::Depth(delta) => store.apply_depth_delta(&delta).await,
        ParsedMessage::Trade(trade) => pending.push(trade.into()),
        ParsedMessage::Unknown(frame) => {
            warn!(len = frame.len(), "Dropping unrecognized frame");
        }
    }
}

/// Hand the buffered trades to the store in one batch. An empty buffer is
/// a no-op so the flush tick never causes a spurious store call.
async fn flush_pending(store: &MarketStore, pending: &mut Vec<Trade>) {
    if pending.is_empty() {
        return;
    }
    let batch = std::mem::take(pending);
    store.add_trades(&batch).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn depth_frame() -> &'static str {
        r#"{"stream":"btcusdt@depth","data":{"e":"depthUpdate","E":1672531200000,"s":"BTCUSDT","U":1,"u":2,"b":[["50000.00","1.5"]],"a":[["50001.00","2.0"]]}}"#
    }

    fn trade_frame(id: u64) -> String {
        format!(
            r#"{{"stream":"btcusdt@aggTrade","data":{{"e":"aggTrade","E":1672531200000,"s":"BTCUSDT","a":{},"p":"50000.50","q":"0.25","f":1,"l":1,"T":1672531200000,"m":false}}}}"#,
            id
        )
    }

    #[tokio::test]
    async fn test_depth_frame_applies_immediately() {
        let store = MarketStore::new("btcusdt");
        let mut pending = Vec::new();

        route_frame(&store, depth_frame(), &mut pending).await;

        let snap = store.snapshot().await;
        assert_eq!(snap.best_bid(), Some(dec!(50000.00)));
        assert_eq!(snap.best_ask(), Some(dec!(50001.00)));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_trade_frame_buffers_without_store_call() {
        let store = MarketStore::new("btcusdt");
        let mut pending = Vec::new();

        route_frame(&store, &trade_frame(1), &mut pending).await;
        route_frame(&store, &trade_frame(2), &mut pending).await;

        assert_eq!(pending.len(), 2);
        assert!(store.snapshot().await.trades.is_empty());
    }

    #[tokio::test]
    async fn test_flush_drains_buffer_in_arrival_order() {
        let store = MarketStore::new("btcusdt");
        let mut pending = Vec::new();
        route_frame(&store, &trade_frame(1), &mut pending).await;
        route_frame(&store, &trade_frame(2), &mut pending).await;

        flush_pending(&store, &mut pending).await;

        assert!(pending.is_empty());
        let snap = store.snapshot().await;
        let ids: Vec<_> = snap.trades.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_empty_flush_does_not_notify() {
        let store = MarketStore::new("btcusdt");
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        let mut pending = Vec::new();
        flush_pending(&store, &mut pending).await;

        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_failed_connect_sets_disconnected_and_schedules_once() {
        // Nothing listens on port 9, so the connect attempt is refused
        // immediately; the large delay keeps the session parked in its
        // backoff sleep for the rest of the test.
        let config = Arc::new(Config {
            ws_endpoint: "ws://127.0.0.1:9".to_string(),
            reconnect_delay_ms: 60_000,
            ..Config::default()
        });
        let store = Arc::new(MarketStore::new("btcusdt"));
        let rx = store.subscribe();

        let session = StreamSession::spawn("btcusdt", store.clone(), config);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(
            store.connection_status().await,
            ConnectionStatus::Disconnected
        );
        // One attempt is reset + Connecting + Disconnected, three version
        // bumps; a second scheduled attempt inside the delay window would
        // push the counter past that.
        assert_eq!(*rx.borrow(), 3);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*rx.borrow(), 3);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped() {
        let store = MarketStore::new("btcusdt");
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        let mut pending = Vec::new();
        route_frame(&store, "{ not json", &mut pending).await;

        assert!(pending.is_empty());
        assert!(!rx.has_changed().unwrap());
    }
}
