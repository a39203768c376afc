//! Depthfeed - exchange stream reconciliation engine
//!
//! This crate ingests an exchange's combined WebSocket stream (incremental
//! order-book deltas and aggregate trades), maintains a consistent
//! in-memory view of the book and a bounded recent-trade tape, and exposes
//! that view through snapshots plus a watch-channel change notification.

pub mod book;
pub mod config;
pub mod error;
pub mod parser;
pub mod session;
pub mod store;
pub mod supervisor;
pub mod trades;

pub use book::{BookSide, RankedLevel, Side};
pub use config::Config;
pub use error::{FeedError, Result};
pub use parser::{AggTrade, DepthDelta, ParsedMessage, PriceLevel};
pub use session::StreamSession;
pub use store::{ConnectionStatus, MarketStore, StoreSnapshot};
pub use supervisor::SessionSupervisor;
pub use trades::{Trade, TradeLog, TRADE_LOG_CAPACITY};
