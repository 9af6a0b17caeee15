use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Trade side (Buy or Sell)
///
/// Wire tokens are `buy` / `sell`; decoding also accepts the order-book
/// synonyms `bid` / `ask`, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    /// Wire token for this side
    pub fn as_wire(&self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }

    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            TradeType::Buy => TradeType::Sell,
            TradeType::Sell => TradeType::Buy,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, TradeType::Buy)
    }
}

/// Human form, distinct from the wire token
impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => f.write_str("Buy"),
            TradeType::Sell => f.write_str("Sell"),
        }
    }
}

impl FromStr for TradeType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(TradeType::Buy),
            "sell" | "ask" => Ok(TradeType::Sell),
            _ => Err(CodecError::UnknownSide(s.to_string())),
        }
    }
}

impl Serialize for TradeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for TradeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_synonyms_any_case() {
        for token in ["BID", "bid", "Buy", "buy"] {
            assert_eq!(token.parse::<TradeType>().unwrap(), TradeType::Buy);
        }
        for token in ["ask", "ASK", "sell", "Sell"] {
            assert_eq!(token.parse::<TradeType>().unwrap(), TradeType::Sell);
        }
    }

    #[test]
    fn test_decode_unknown_carries_token() {
        assert_eq!(
            "long".parse::<TradeType>(),
            Err(CodecError::UnknownSide("long".to_string()))
        );
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        for side in [TradeType::Buy, TradeType::Sell] {
            assert_eq!(side.as_wire().parse::<TradeType>().unwrap(), side);
        }
    }

    #[test]
    fn test_display_is_human_form() {
        assert_eq!(TradeType::Buy.to_string(), "Buy");
        assert_eq!(TradeType::Sell.to_string(), "Sell");
        assert_eq!(TradeType::Buy.as_wire(), "buy");
    }

    #[test]
    fn test_serde_wire_tokens() {
        assert_eq!(serde_json::to_string(&TradeType::Sell).unwrap(), "\"sell\"");
        let side: TradeType = serde_json::from_str("\"bid\"").unwrap();
        assert_eq!(side, TradeType::Buy);
        assert!(serde_json::from_str::<TradeType>("\"short\"").is_err());
    }
}
