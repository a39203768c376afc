//! Configuration module for the feed engine

use serde::Deserialize;
use std::env;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Initial instrument symbol to stream (e.g., "btcusdt")
    pub symbol: String,

    /// WebSocket endpoint for the exchange combined-stream API
    pub ws_endpoint: String,

    /// Interval between trade-buffer flushes in milliseconds
    pub trade_flush_interval_ms: u64,

    /// Fixed delay before a reconnect attempt in milliseconds
    pub reconnect_delay_ms: u64,

    /// Book depth levels shown by the display consumer
    pub depth_levels: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            symbol: env::var("SYMBOL")
                .unwrap_or_else(|_| "btcusdt".to_string())
                .trim()
                .to_lowercase(),
            ws_endpoint: env::var("WS_ENDPOINT")
                .unwrap_or_else(|_| "wss://data-stream.binance.com/stream".to_string()),
            trade_flush_interval_ms: env::var("TRADE_FLUSH_INTERVAL_MS")
                .unwrap_or_else(|_| "200".to_string())
                .parse()
                .unwrap_or(200),
            reconnect_delay_ms: env::var("RECONNECT_DELAY_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            depth_levels: env::var("DEPTH_LEVELS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap_or(15),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: "btcusdt".to_string(),
            ws_endpoint: "wss://data-stream.binance.com/stream".to_string(),
            trade_flush_interval_ms: 200,
            reconnect_delay_ms: 5000,
            depth_levels: 15,
        }
    }
}
