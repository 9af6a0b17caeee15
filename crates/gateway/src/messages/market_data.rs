//! Market data message types

use coincross_core::values::from_epoch_secs;
use coincross_core::{Pair, Price, Quantity, Trade, TradeId, TradeType};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Trade print as it appears on the wire
///
/// `price` and `amount` are written as strings and accepted as either
/// strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMessage {
    pub tid: TradeId,
    /// Epoch seconds
    pub date: i64,
    pub price: Price,
    pub amount: Quantity,
    #[serde(rename = "type")]
    pub side: TradeType,
    pub pair: Pair,
}

impl TradeMessage {
    pub fn into_trade(self) -> Trade {
        Trade::new(
            self.tid,
            from_epoch_secs(self.date),
            self.side,
            self.pair,
            self.price,
            self.amount,
        )
    }
}

impl From<&Trade> for TradeMessage {
    fn from(trade: &Trade) -> Self {
        Self {
            tid: trade.id,
            date: trade.timestamp.timestamp(),
            price: trade.price,
            amount: trade.amount,
            side: trade.side,
            pair: trade.pair.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TradeFrame {
    One(TradeMessage),
    Many(Vec<TradeMessage>),
}

/// Decode a frame holding one trade object or an array of them
pub fn decode_trades(frame: &str) -> Result<Vec<Trade>, TransportError> {
    let messages = match serde_json::from_str::<TradeFrame>(frame) {
        Ok(TradeFrame::One(message)) => vec![message],
        Ok(TradeFrame::Many(messages)) => messages,
        Err(_) => {
            return Err(TransportError::Decode(format!(
                "not a trade frame: {}",
                frame.chars().take(80).collect::<String>()
            )));
        }
    };
    Ok(messages.into_iter().map(TradeMessage::into_trade).collect())
}

pub fn encode_trade(trade: &Trade) -> Result<String, TransportError> {
    Ok(serde_json::to_string(&TradeMessage::from(trade))?)
}
