use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::values::{Price, Quantity};

/// Order book level (price + aggregated amount)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub amount: Quantity,
}

impl BookLevel {
    pub fn new(price: Price, amount: Quantity) -> Self {
        Self { price, amount }
    }
}

/// Order book snapshot
///
/// Asks ascend by price, bids descend by price, and no two levels on the
/// same side share a price. Built once, never updated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Orderbook {
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

impl Orderbook {
    /// Build a snapshot from raw levels in any order.
    ///
    /// Levels sharing a price are merged, empty levels dropped, and each side
    /// is cut to `depth` levels.
    pub fn from_levels(
        asks: impl IntoIterator<Item = BookLevel>,
        bids: impl IntoIterator<Item = BookLevel>,
        depth: usize,
    ) -> Self {
        let asks = aggregate(asks).into_iter().take(depth).collect();
        let bids = aggregate(bids).into_iter().rev().take(depth).collect();
        Self { asks, bids }
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    /// Spread between best ask and best bid
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Check side ordering and price uniqueness
    pub fn is_well_formed(&self) -> bool {
        self.asks.windows(2).all(|w| w[0].price < w[1].price)
            && self.bids.windows(2).all(|w| w[0].price > w[1].price)
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

/// Merge levels by price, ascending
fn aggregate(levels: impl IntoIterator<Item = BookLevel>) -> Vec<BookLevel> {
    let mut by_price: BTreeMap<Price, Quantity> = BTreeMap::new();
    for level in levels {
        *by_price.entry(level.price).or_insert(Decimal::ZERO) += level.amount;
    }
    by_price
        .into_iter()
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .map(|(price, amount)| BookLevel::new(price, amount))
        .collect()
}

impl fmt::Display for Orderbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Asks:")?;
        for level in &self.asks {
            writeln!(f, "{}\t{}", level.price, level.amount)?;
        }
        writeln!(f, "Bids:")?;
        for level in &self.bids {
            writeln!(f, "{}\t{}", level.price, level.amount)?;
        }
        Ok(())
    }
}
