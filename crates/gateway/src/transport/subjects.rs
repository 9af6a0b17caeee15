//! Logical channel names

use coincross_core::Pair;

/// Subjects for logical message routing
pub struct Subjects;

impl Subjects {
    /// Trade prints for a pair: `trades.btc_usd`
    pub fn trades(pair: &Pair) -> String {
        format!("trades.{}", pair.to_wire())
    }
}
