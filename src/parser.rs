//! Parser module for exchange WebSocket messages
//!
//! Handles deserialization of depth deltas and aggregate trades arriving on
//! the combined stream, and classification by originating channel.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Incremental depth delta message
#[derive(Debug, Clone, Deserialize)]
pub struct DepthDelta {
    /// Event type
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time (milliseconds)
    #[serde(rename = "E")]
    pub event_time: u64,

    /// Symbol
    #[serde(rename = "s")]
    pub symbol: String,

    /// Changed bid levels
    #[serde(rename = "b", deserialize_with = "deserialize_price_levels")]
    pub bids: Vec<PriceLevel>,

    /// Changed ask levels
    #[serde(rename = "a", deserialize_with = "deserialize_price_levels")]
    pub asks: Vec<PriceLevel>,
}

/// Aggregate trade message
#[derive(Debug, Clone, Deserialize)]
pub struct AggTrade {
    /// Event type
    #[serde(rename = "e")]
    pub event_type: String,

    /// Event time
    #[serde(rename = "E")]
    pub event_time: u64,

    /// Symbol
    #[serde(rename = "s")]
    pub symbol: String,

    /// Aggregate trade ID
    #[serde(rename = "a")]
    pub trade_id: u64,

    /// Price
    #[serde(rename = "p", deserialize_with = "deserialize_decimal")]
    pub price: Decimal,

    /// Quantity
    #[serde(rename = "q", deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,

    /// Trade time
    #[serde(rename = "T")]
    pub trade_time: u64,

    /// Is buyer the maker (true means the trade was seller-initiated)
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Price level (price, quantity pair)
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Combined stream message wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMessage {
    /// Stream name, e.g. "btcusdt@depth"
    pub stream: String,

    /// Data payload
    pub data: serde_json::Value,
}

/// Parsed WebSocket message, classified by channel
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Depth(DepthDelta),
    Trade(AggTrade),
    Unknown(String),
}

impl ParsedMessage {
    /// Parse and classify a raw WebSocket frame.
    ///
    /// Unrecognized stream tags and payloads that fail to decode come back
    /// as `Unknown`; the caller drops those and keeps going.
    pub fn parse(raw: &str) -> Self {
        let stream_msg = match serde_json::from_str::<StreamMessage>(raw) {
            Ok(msg) => msg,
            Err(_) => return ParsedMessage::Unknown(raw.to_string()),
        };

        if stream_msg.stream.ends_with("@depth") {
            match serde_json::from_value::<DepthDelta>(stream_msg.data) {
                Ok(delta) => ParsedMessage::Depth(delta),
                Err(_) => ParsedMessage::Unknown(raw.to_string()),
            }
        } else if stream_msg.stream.ends_with("@aggTrade") {
            match serde_json::from_value::<AggTrade>(stream_msg.data) {
                Ok(trade) => ParsedMessage::Trade(trade),
                Err(_) => ParsedMessage::Unknown(raw.to_string()),
            }
        } else {
            ParsedMessage::Unknown(raw.to_string())
        }
    }
}

/// Custom deserializer for Decimal from string
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Decimal::from_str(&s).map_err(serde::de::Error::custom)
}

/// Custom deserializer for price levels from array of string pairs
fn deserialize_price_levels<'de, D>(deserializer: D) -> Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<String>> = Deserialize::deserialize(deserializer)?;
    raw.into_iter()
        .map(|pair| {
            if pair.len() != 2 {
                return Err(serde::de::Error::custom("Invalid price level format"));
            }
            Ok(PriceLevel {
                price: Decimal::from_str(&pair[0]).map_err(serde::de::Error::custom)?,
                quantity: Decimal::from_str(&pair[1]).map_err(serde::de::Error::custom)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_depth_delta() {
        let raw = r#"{
            "stream": "btcusdt@depth",
            "data": {
                "e": "depthUpdate",
                "E": 1672531200000,
                "s": "BTCUSDT",
                "U": 100,
                "u": 105,
                "b": [["50000.00", "1.5"], ["49999.00", "2.0"]],
                "a": [["50001.00", "1.0"], ["50002.00", "0.5"]]
            }
        }"#;

        let msg = ParsedMessage::parse(raw);
        if let ParsedMessage::Depth(delta) = msg {
            assert_eq!(delta.symbol, "BTCUSDT");
            assert_eq!(delta.bids.len(), 2);
            assert_eq!(delta.asks.len(), 2);
            assert_eq!(delta.bids[0].price, Decimal::from_str("50000.00").unwrap());
            assert_eq!(delta.asks[1].quantity, Decimal::from_str("0.5").unwrap());
        } else {
            panic!("Expected Depth");
        }
    }

    #[test]
    fn test_parse_agg_trade() {
        let raw = r#"{
            "stream": "btcusdt@aggTrade",
            "data": {
                "e": "aggTrade",
                "E": 1672531200000,
                "s": "BTCUSDT",
                "a": 12345,
                "p": "50000.50",
                "q": "0.5",
                "f": 100,
                "l": 105,
                "T": 1672531200000,
                "m": true
            }
        }"#;

        let msg = ParsedMessage::parse(raw);
        if let ParsedMessage::Trade(trade) = msg {
            assert_eq!(trade.trade_id, 12345);
            assert_eq!(trade.price, Decimal::from_str("50000.50").unwrap());
            assert!(trade.is_buyer_maker);
        } else {
            panic!("Expected Trade");
        }
    }

    #[test]
    fn test_unknown_stream_tag() {
        let raw = r#"{"stream": "btcusdt@kline_1m", "data": {"e": "kline"}}"#;
        assert!(matches!(ParsedMessage::parse(raw), ParsedMessage::Unknown(_)));
    }

    #[test]
    fn test_malformed_frame() {
        assert!(matches!(
            ParsedMessage::parse("not json at all"),
            ParsedMessage::Unknown(_)
        ));
    }

    #[test]
    fn test_depth_with_bad_payload_is_unknown() {
        let raw = r#"{"stream": "btcusdt@depth", "data": {"e": "depthUpdate"}}"#;
        assert!(matches!(ParsedMessage::parse(raw), ParsedMessage::Unknown(_)));
    }
}
