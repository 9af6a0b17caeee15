use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Pair;
use crate::values::{Price, Quantity};

/// Summary quote for a market
///
/// Fields an exchange cannot fill (no trades yet, empty book side) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub pair: Pair,
    /// Last trade price
    pub last: Option<Price>,
    /// Best bid
    pub bid: Option<Price>,
    /// Best ask
    pub ask: Option<Price>,
    pub high: Option<Price>,
    pub low: Option<Price>,
    /// Traded amount over the exchange's ticker window
    pub volume: Quantity,
}

impl Ticker {
    /// Ticker of a market with no activity
    pub fn empty(pair: Pair) -> Self {
        Self {
            pair,
            last: None,
            bid: None,
            ask: None,
            high: None,
            low: None,
            volume: Decimal::ZERO,
        }
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.ask? - self.bid?)
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt(value: Option<Price>) -> String {
            value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
        }
        write!(
            f,
            "{} last={} bid={} ask={} high={} low={} vol={}",
            self.pair,
            opt(self.last),
            opt(self.bid),
            opt(self.ask),
            opt(self.high),
            opt(self.low),
            self.volume
        )
    }
}
