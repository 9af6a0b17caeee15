//! Simulated venue settings

use coincross_core::Pair;
use serde::Deserialize;

use crate::error::{ExchangeError, Result};

/// How `SimClient::stream` receives trades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Live frames from the exchange's channel transport, with history backfill
    #[default]
    Push,
    /// Periodic `history` reads
    Poll,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Listed markets, in wire form in JSON (`"btc_usd"`)
    pub pairs: Vec<Pair>,
    pub stream_mode: StreamMode,
    /// Ceiling for `transactions(limit)`
    pub max_transactions: usize,
    /// Trades returned by one `history` call
    pub history_page_size: usize,
    /// Trades retained per pair
    pub history_window: usize,
    /// Ceiling for `orderbook(depth)`
    pub max_depth: usize,
    /// Buffered frames per pair channel before a subscriber lags
    pub transport_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            stream_mode: StreamMode::Push,
            max_transactions: 1000,
            history_page_size: 500,
            history_window: 10_000,
            max_depth: 200,
            transport_capacity: 1024,
        }
    }
}

impl SimConfig {
    pub fn with_pairs(pairs: Vec<Pair>) -> Self {
        Self {
            pairs,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| ExchangeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pairs.is_empty() {
            return Err(ExchangeError::Config("no pairs listed".to_string()));
        }
        let limits = [
            ("max_transactions", self.max_transactions),
            ("history_page_size", self.history_page_size),
            ("history_window", self.history_window),
            ("max_depth", self.max_depth),
            ("transport_capacity", self.transport_capacity),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ExchangeError::Config(format!("{} must be positive", name)));
        }
        Ok(())
    }
}
