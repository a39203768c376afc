//! Depthfeed - exchange stream reconciliation engine
//!
//! Connects to an exchange combined WebSocket stream, maintains order-book
//! and recent-trade state for one displayed symbol, and logs a compact
//! market summary whenever the state changes. The log consumer stands in
//! for a real presentation layer reading the same snapshot surface.

mod book;
mod config;
mod error;
mod parser;
mod session;
mod store;
mod supervisor;
mod trades;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::store::MarketStore;
use crate::supervisor::SessionSupervisor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting depthfeed");

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!(symbol = %config.symbol, endpoint = %config.ws_endpoint, "Configuration loaded");

    // Single source of truth, shared with the supervisor and the consumer
    let store = Arc::new(MarketStore::new(&config.symbol));

    // Start streaming the configured symbol
    let mut supervisor = SessionSupervisor::new(store.clone(), config.clone());
    supervisor.set_symbol(&config.symbol).await;

    // Display stand-in: re-derive the view on every change notification
    let display_store = store.clone();
    let depth_levels = config.depth_levels;
    tokio::spawn(async move {
        run_display(display_store, depth_levels).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    supervisor.shutdown().await;

    Ok(())
}

/// Wait on the store's watch channel and log a market summary, coalescing
/// bursts to at most one line per second.
async fn run_display(store: Arc<MarketStore>, depth_levels: usize) {
    let mut updates = store.subscribe();

    while updates.changed().await.is_ok() {
        let snap = store.snapshot().await;

        let last_trade = snap.trades.first().map(|t| {
            let time = chrono::DateTime::from_timestamp_millis(t.time as i64)
                .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
                .unwrap_or_default();
            let side = if t.is_seller_initiated { "sell" } else { "buy" };
            format!("{} {} @ {} ({})", side, t.quantity, t.price, time)
        });

        info!(
            symbol = %snap.symbol,
            status = ?snap.status,
            best_bid = ?snap.best_bid(),
            best_ask = ?snap.best_ask(),
            spread = ?snap.spread(),
            bid_levels = snap.bids.len().min(depth_levels),
            ask_levels = snap.asks.len().min(depth_levels),
            last_trade = ?last_trade,
            "Market update"
        );

        sleep(Duration::from_secs(1)).await;
    }
}
