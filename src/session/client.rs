//! WebSocket client for the exchange combined stream
//!
//! Handles connection, subscription, and message reception for one symbol.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::error::{FeedError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client for a single connection
pub struct WsClient {
    stream: Option<WsStream>,
    endpoint: String,
    symbol: String,
}

impl WsClient {
    /// Create a new client for one symbol
    pub fn new(endpoint: &str, symbol: &str) -> Self {
        Self {
            stream: None,
            endpoint: endpoint.to_string(),
            symbol: symbol.to_lowercase(),
        }
    }

    /// Connect, subscribed to the depth and aggregate-trade channels
    pub async fn connect(&mut self) -> Result<()> {
        let streams = format!("{sym}@depth/{sym}@aggTrade", sym = self.symbol);
        let url = format!("{}?streams={}", self.endpoint, streams);

        info!(url = %url, "Connecting to exchange WebSocket");

        let (ws_stream, response) = connect_async(&url).await.map_err(|e| {
            FeedError::WebSocketConnection(format!("Failed to connect: {}", e))
        })?;

        info!(status = ?response.status(), "WebSocket connected");
        self.stream = Some(ws_stream);

        Ok(())
    }

    /// Receive the next frame.
    ///
    /// `Ok(Some(text))` carries a data frame; `Ok(None)` means a control
    /// frame was absorbed (ping answered, pong ignored) and the caller
    /// should poll again; `Err` means the connection is gone.
    ///
    /// Cancel safety: callers race this future against timers in a
    /// `select!`. Dropping it never loses a data frame, but a pong reply
    /// mid-send can be lost; the exchange tolerates a missed pong and the
    /// reconnect loop covers the eventual idle disconnect.
    pub async fn recv(&mut self) -> Result<Option<String>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| FeedError::WebSocketConnection("Not connected".to_string()))?;

        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!(len = text.len(), "Received text frame");
                Ok(Some(text))
            }
            Some(Ok(Message::Binary(data))) => {
                let text = String::from_utf8_lossy(&data).to_string();
                Ok(Some(text))
            }
            Some(Ok(Message::Ping(data))) => {
                debug!("Received ping, sending pong");
                if let Some(stream) = self.stream.as_mut() {
                    let _ = stream.send(Message::Pong(data)).await;
                }
                Ok(None)
            }
            Some(Ok(Message::Pong(_))) => {
                debug!("Received pong");
                Ok(None)
            }
            Some(Ok(Message::Close(frame))) => {
                warn!(frame = ?frame, "Received close frame");
                self.stream = None;
                Err(FeedError::WebSocketConnection(
                    "Connection closed".to_string(),
                ))
            }
            Some(Ok(Message::Frame(_))) => Ok(None),
            Some(Err(e)) => {
                error!(error = %e, "WebSocket error");
                self.stream = None;
                Err(FeedError::WebSocketMessage(e.to_string()))
            }
            None => {
                warn!("WebSocket stream ended");
                self.stream = None;
                Err(FeedError::WebSocketConnection(
                    "Stream ended".to_string(),
                ))
            }
        }
    }

    /// Close the connection
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}
