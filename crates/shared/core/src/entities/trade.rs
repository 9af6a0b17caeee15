use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Pair, TIME_FORMAT, TradeType};
use crate::values::{Price, Quantity, Timestamp, TradeId, format_significant};

/// One executed match, as printed by the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: Timestamp,
    /// Side of the taker
    #[serde(rename = "type")]
    pub side: TradeType,
    pub pair: Pair,
    pub price: Price,
    pub amount: Quantity,
}

impl Trade {
    pub fn new(
        id: TradeId,
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
            amount,
        }
    }

    /// Notional value of the trade (price * amount), `None` on overflow
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.amount)
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = format!("{:.3}", self.amount);
        let price = format_significant(self.price, 6);
        write!(
            f,
            "{} {}\t{}\t{:>8}@{:<8}\t!{}",
            self.pair,
            self.id,
            self.side,
            amount,
            price,
            self.timestamp.format(TIME_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::from_epoch_secs;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display() {
        let trade = Trade::new(
            7,
            from_epoch_secs(1_700_000_000),
            TradeType::Sell,
            "BTC/USD".parse().unwrap(),
            dec!(412.50),
            dec!(1.5),
        );
        assert_eq!(trade.to_string(), "BTC/USD 7\tSell\t   1.500@412.5   \t!22:13:20");
    }

    #[test]
    fn test_display_rounds_price_to_six_digits() {
        let trade = Trade::new(
            8,
            from_epoch_secs(1_700_000_000),
            TradeType::Buy,
            "BTC/USD".parse().unwrap(),
            dec!(12345.678),
            dec!(0.25),
        );
        assert_eq!(trade.to_string(), "BTC/USD 8\tBuy\t   0.250@12345.7 \t!22:13:20");
    }

    #[test]
    fn test_notional() {
        let trade = Trade::new(
            1,
            from_epoch_secs(0),
            TradeType::Buy,
            "ETH/USD".parse().unwrap(),
            dec!(3000),
            dec!(0.5),
        );
        assert_eq!(trade.notional(), Some(dec!(1500)));
    }

    #[test]
    fn test_serde_roundtrip_from_wire_json() {
        let json = r#"{"id":9,"timestamp":1700000000,"type":"ask","pair":"ltc_btc","price":"0.0025","amount":"10"}"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.side, TradeType::Sell);
        assert_eq!(trade.pair.to_string(), "LTC/BTC");
        assert_eq!(trade.price, dec!(0.0025));
    }
}
