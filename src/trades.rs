//! Recent-trade history
//!
//! A bounded, de-duplicated tape of aggregate trades, newest first.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::parser::AggTrade;

/// Maximum number of trades retained by the log
pub const TRADE_LOG_CAPACITY: usize = 50;

/// A single aggregate trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade time in milliseconds since the epoch
    pub time: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    /// True when the aggressor was a seller (buyer was the maker)
    pub is_seller_initiated: bool,
    /// Feed-assigned aggregate trade id, the de-duplication key
    pub id: u64,
}

impl From<AggTrade> for Trade {
    fn from(raw: AggTrade) -> Self {
        Self {
            time: raw.trade_time,
            price: raw.price,
            quantity: raw.quantity,
            is_seller_initiated: raw.is_buyer_maker,
            id: raw.trade_id,
        }
    }
}

/// Bounded, de-duplicated trade tape, newest first
#[derive(Debug, Default, Clone)]
pub struct TradeLog {
    trades: VecDeque<Trade>,
}

impl TradeLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of trades, in the order given.
    ///
    /// Trades whose id is already in the log are skipped; the rest go to
    /// the front. Truncation to capacity happens once after the whole batch
    /// so a duplicate check never races an eviction within the same call.
    /// Returns whether anything was inserted, letting the caller skip
    /// change notification for all-duplicate or empty batches.
    pub fn add_batch(&mut self, batch: &[Trade]) -> bool {
        let mut inserted = false;
        for trade in batch {
            if self.trades.iter().any(|t| t.id == trade.id) {
                continue;
            }
            self.trades.push_front(trade.clone());
            inserted = true;
        }

        if inserted {
            self.trades.truncate(TRADE_LOG_CAPACITY);
        }
        inserted
    }

    /// Most recent trade, if any
    pub fn latest(&self) -> Option<&Trade> {
        self.trades.front()
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter()
    }

    /// Number of retained trades
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Whether the log holds no trades
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Drop every trade
    pub fn clear(&mut self) {
        self.trades.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(id: u64) -> Trade {
        Trade {
            time: 1_672_531_200_000 + id,
            price: dec!(50000.50),
            quantity: dec!(0.5),
            is_seller_initiated: id % 2 == 0,
            id,
        }
    }

    #[test]
    fn test_insertion_is_newest_first() {
        let mut log = TradeLog::new();
        assert!(log.add_batch(&[trade(1), trade(2), trade(3)]));

        let ids: Vec<_> = log.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(log.latest().unwrap().id, 3);
    }

    #[test]
    fn test_duplicate_ids_are_skipped() {
        let mut log = TradeLog::new();
        log.add_batch(&[trade(1), trade(2)]);
        assert!(log.add_batch(&[trade(2), trade(3)]));

        let ids: Vec<_> = log.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        // Full log ids 1..=50 (newest 50); batch [50, 51] inserts only 51
        // and evicts id 1.
        let mut log = TradeLog::new();
        let fill: Vec<_> = (1..=50).map(trade).collect();
        log.add_batch(&fill);
        assert_eq!(log.len(), 50);

        assert!(log.add_batch(&[trade(50), trade(51)]));
        assert_eq!(log.len(), 50);
        assert_eq!(log.latest().unwrap().id, 51);
        assert!(!log.iter().any(|t| t.id == 1));
        assert!(log.iter().any(|t| t.id == 2));
    }

    #[test]
    fn test_no_duplicate_ids_at_any_point() {
        let mut log = TradeLog::new();
        log.add_batch(&[trade(1), trade(1), trade(2), trade(2), trade(1)]);

        let ids: Vec<_> = log.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_empty_and_all_duplicate_batches_report_unchanged() {
        let mut log = TradeLog::new();
        log.add_batch(&[trade(7)]);

        assert!(!log.add_batch(&[]));
        assert!(!log.add_batch(&[trade(7)]));
        assert_eq!(log.len(), 1);
    }
}
