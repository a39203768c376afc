//! Order book side
//!
//! One price→quantity mapping per side, kept exact with `Decimal` keys.
//! Sort order is derived on read; deltas only touch the map.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::parser::PriceLevel;

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

/// A ranked price level with running depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLevel {
    pub price: Decimal,
    pub quantity: Decimal,
    /// Running quantity sum from the best price outward
    pub cumulative: Decimal,
}

/// One side of the order book for a single symbol
#[derive(Debug, Default, Clone)]
pub struct BookSide {
    levels: BTreeMap<Decimal, Decimal>,
}

impl BookSide {
    /// Create an empty side
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of delta entries in arrival order.
    ///
    /// A zero quantity removes the price level (no-op when absent, the feed
    /// is allowed to delete levels we never saw); anything else inserts or
    /// overwrites. A price repeated within one batch keeps the last write.
    pub fn apply_delta(&mut self, entries: &[PriceLevel]) {
        for level in entries {
            if level.quantity == Decimal::ZERO {
                self.levels.remove(&level.price);
            } else {
                self.levels.insert(level.price, level.quantity);
            }
        }
    }

    /// Derive a fresh ranked snapshot, best price first.
    ///
    /// Bids rank descending, asks ascending; `cumulative` accumulates
    /// quantity from the best price outward. Recomputed from the live map
    /// on every call.
    pub fn ranked(&self, side: Side) -> Vec<RankedLevel> {
        let mut cumulative = Decimal::ZERO;
        let rank = |(price, quantity): (&Decimal, &Decimal), cumulative: &mut Decimal| {
            *cumulative += *quantity;
            RankedLevel {
                price: *price,
                quantity: *quantity,
                cumulative: *cumulative,
            }
        };

        match side {
            Side::Bid => self
                .levels
                .iter()
                .rev()
                .map(|entry| rank(entry, &mut cumulative))
                .collect(),
            Side::Ask => self
                .levels
                .iter()
                .map(|entry| rank(entry, &mut cumulative))
                .collect(),
        }
    }

    /// Best price on this side, if any
    pub fn best(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Bid => self.levels.last_key_value().map(|(p, _)| *p),
            Side::Ask => self.levels.first_key_value().map(|(p, _)| *p),
        }
    }

    /// Quantity resting at a price, if the level exists
    pub fn quantity_at(&self, price: Decimal) -> Option<Decimal> {
        self.levels.get(&price).copied()
    }

    /// Number of populated price levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the side holds no levels
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Drop every level
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
