//! Reconciliation store
//!
//! The single source of truth for one displayed instrument: both book
//! sides, the recent-trade tape, the active symbol, and connection status.
//! Mutations go through the action surface below; readers take snapshots
//! and learn about changes through a watch channel carrying a version
//! counter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};

use crate::book::{BookSide, RankedLevel, Side};
use crate::parser::DepthDelta;
use crate::trades::{Trade, TradeLog};

/// Connection status of the active stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Read-side snapshot handed to the presentation layer
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub symbol: String,
    pub status: ConnectionStatus,
    /// Ranked best-first with cumulative depth
    pub bids: Vec<RankedLevel>,
    pub asks: Vec<RankedLevel>,
    /// Newest first, at most [`crate::trades::TRADE_LOG_CAPACITY`]
    pub trades: Vec<Trade>,
}

impl StoreSnapshot {
    /// Best bid price, if the book has one
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Best ask price, if the book has one
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    /// Spread between best ask and best bid
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct StoreState {
    symbol: String,
    bids: BookSide,
    asks: BookSide,
    trades: TradeLog,
    status: ConnectionStatus,
}

/// Owns the market state exclusively; shared as `Arc<MarketStore>` between
/// the session, the supervisor, and however many readers subscribe.
#[derive(Debug)]
pub struct MarketStore {
    state: RwLock<StoreState>,
    update_tx: watch::Sender<u64>,
}

impl MarketStore {
    /// Create a store for an initial symbol, empty and disconnected
    pub fn new(symbol: &str) -> Self {
        let (update_tx, _) = watch::channel(0);
        Self {
            state: RwLock::new(StoreState {
                symbol: symbol.to_string(),
                bids: BookSide::new(),
                asks: BookSide::new(),
                trades: TradeLog::new(),
                status: ConnectionStatus::Disconnected,
            }),
            update_tx,
        }
    }

    /// Subscribe to change notifications. The value is a version counter
    /// bumped after every observable mutation; subscribers re-derive their
    /// view from [`MarketStore::snapshot`] when it moves.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.update_tx.subscribe()
    }

    fn notify(&self) {
        self.update_tx.send_modify(|version| *version += 1);
    }

    /// Record the active symbol. Does not clear state; the session clears
    /// via [`MarketStore::reset`] when it starts for the new symbol, so a
    /// consumer never sees an empty book flash mid-switch.
    pub async fn set_symbol(&self, symbol: &str) {
        let mut state = self.state.write().await;
        state.symbol = symbol.to_string();
        drop(state);
        self.notify();
    }

    /// Update connection status
    pub async fn set_connection_status(&self, status: ConnectionStatus) {
        let mut state = self.state.write().await;
        state.status = status;
        drop(state);
        self.notify();
    }

    /// Apply one depth delta to both sides as a single observable
    /// transition
    pub async fn apply_depth_delta(&self, delta: &DepthDelta) {
        let mut state = self.state.write().await;
        state.bids.apply_delta(&delta.bids);
        state.asks.apply_delta(&delta.asks);
        drop(state);
        self.notify();
    }

    /// Merge a flushed trade batch. All-duplicate or empty batches leave
    /// the log untouched and produce no notification.
    pub async fn add_trades(&self, batch: &[Trade]) {
        let mut state = self.state.write().await;
        let changed = state.trades.add_batch(batch);
        drop(state);
        if changed {
            self.notify();
        }
    }

    /// Clear books and trades for a fresh session. Symbol and connection
    /// status are left alone.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.bids.clear();
        state.asks.clear();
        state.trades.clear();
        drop(state);
        self.notify();
    }

    /// Current symbol
    pub async fn symbol(&self) -> String {
        self.state.read().await.symbol.clone()
    }

    /// Current connection status
    pub async fn connection_status(&self) -> ConnectionStatus {
        self.state.read().await.status
    }

    /// Take a full read-side snapshot with freshly ranked views
    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            symbol: state.symbol.clone(),
            status: state.status,
            bids: state.bids.ranked(Side::Bid),
            asks: state.asks.ranked(Side::Ask),
            trades: state.trades.iter().cloned().collect(),
        }
    }
}
