//! Session supervisor
//!
//! Reacts to symbol changes: tears down the previous session, records the
//! new symbol, and starts a fresh session against it. Exactly one session
//! is alive at a time.

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::session::StreamSession;
use crate::store::MarketStore;

/// Owns the currently active stream session
pub struct SessionSupervisor {
    store: Arc<MarketStore>,
    config: Arc<Config>,
    active: Option<StreamSession>,
}

impl SessionSupervisor {
    /// Create a supervisor with no session running yet
    pub fn new(store: Arc<MarketStore>, config: Arc<Config>) -> Self {
        Self {
            store,
            config,
            active: None,
        }
    }

    /// Switch the displayed instrument. The previous session is fully shut
    /// down before the new one spawns, so no frame from the old symbol can
    /// land in the freshly reset store.
    pub async fn set_symbol(&mut self, symbol: &str) {
        let symbol = symbol.to_lowercase();

        if let Some(previous) = self.active.take() {
            info!(symbol = %symbol, "Replacing active stream session");
            previous.shutdown().await;
        }

        self.store.set_symbol(&symbol).await;
        self.active = Some(StreamSession::spawn(
            &symbol,
            self.store.clone(),
            self.config.clone(),
        ));
    }

    /// Stop the active session, if any. Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.active.take() {
            session.shutdown().await;
        }
    }

    /// Whether a session is currently running
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
}
