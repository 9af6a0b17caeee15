use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{DATE_TIME_FORMAT, Symbol};
use crate::values::{Timestamp, TransactionId};

/// One ledger movement: deposit, withdrawal, fee or trade settlement
///
/// `amounts` holds the signed balance delta per currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: Timestamp,
    pub amounts: BTreeMap<Symbol, Decimal>,
    pub description: String,
}

impl Transaction {
    pub fn new(id: TransactionId, timestamp: Timestamp, description: impl Into<String>) -> Self {
        Self {
            id,
            timestamp,
            amounts: BTreeMap::new(),
            description: description.into(),
        }
    }

    /// Add a delta for one currency, accumulating if already present
    pub fn with_amount(mut self, currency: Symbol, delta: Decimal) -> Self {
        *self.amounts.entry(currency).or_insert(Decimal::ZERO) += delta;
        self
    }

    /// Delta for a currency, zero if untouched
    pub fn amount(&self, currency: &Symbol) -> Decimal {
        self.amounts.get(currency).copied().unwrap_or(Decimal::ZERO)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.timestamp.format(DATE_TIME_FORMAT), self.id)?;
        for (currency, delta) in &self.amounts {
            write!(f, "\t{}:{:.6}", currency, delta)?;
        }
        write!(f, "\t{}", self.description)
    }
}
