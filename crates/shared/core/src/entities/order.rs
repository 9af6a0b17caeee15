use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DATE_TIME_FORMAT, Pair, TradeType};
use crate::error::{CodecError, CodecResult};
use crate::values::{OrderId, Price, Quantity, Timestamp};

/// Open limit order as reported by an exchange
///
/// `remain` is the unfilled part of `amount` and never exceeds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub side: TradeType,
    pub pair: Pair,
    pub price: Price,
    pub remain: Quantity,
    pub amount: Quantity,
}

impl Order {
    /// Create a freshly placed, unfilled order
    pub fn new(
        id: OrderId,
        timestamp: Timestamp,
        side: TradeType,
        pair: Pair,
        price: Price,
        amount: Quantity,
    ) -> Self {
        Self {
            id,
            timestamp,
            side,
            pair,
            price,
            remain: amount,
            amount,
        }
    }

    /// Rebuild an order reported by an exchange, checking `remain <= amount`
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        timestamp: Timestamp,
        side: TradeType,
        pair: Pair,
        price: Price,
        remain: Quantity,
        amount: Quantity,
    ) -> CodecResult<Self> {
        let order = Self {
            id,
            timestamp,
            side,
            pair,
            price,
            remain,
            amount,
        };
        order.validate()?;
        Ok(order)
    }

    /// Check the quantity invariant
    pub fn validate(&self) -> CodecResult<()> {
        if self.remain < Decimal::ZERO || self.remain > self.amount {
            return Err(CodecError::Format(format!(
                "order {} remain {} outside of [0, {}]",
                self.id, self.remain, self.amount
            )));
        }
        Ok(())
    }

    /// Fill up to `qty`, returning the quantity actually filled
    pub fn fill(&mut self, qty: Quantity) -> Quantity {
        let filled = qty.min(self.remain).max(Decimal::ZERO);
        self.remain -= filled;
        filled
    }

    /// Quantity executed so far
    pub fn filled(&self) -> Quantity {
        self.amount - self.remain
    }

    /// Returns true if nothing remains to be filled
    pub fn is_filled(&self) -> bool {
        self.remain.is_zero()
    }

    /// Value of the unfilled part in the base currency, `None` when it
    /// does not fit in a `Decimal`
    pub fn remaining_notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.remain)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{:.6}\t{:.6}({:.6})",
            self.timestamp.format(DATE_TIME_FORMAT),
            self.id,
            self.side,
            self.pair,
            self.price,
            self.remain,
            self.amount
        )
    }
}
