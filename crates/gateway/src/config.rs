//! Gateway configuration and loading

use coincross_ports::FeedConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::RetryConfig;

/// Settings shared by the stream drivers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub feed: FeedConfig,
    /// Pause between empty history polls
    pub poll_interval_ms: u64,
    pub reconnect_initial_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    pub reconnect_multiplier: f64,
    /// Consecutive failed reconnects before the feed gives up; `None` retries forever
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            poll_interval_ms: 1000,
            reconnect_initial_delay_ms: 100,
            reconnect_max_delay_ms: 30_000,
            reconnect_multiplier: 2.0,
            max_reconnect_attempts: None,
        }
    }
}

impl StreamConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub stream: StreamConfig,
    pub retry: RetryConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.feed.capacity == 0 {
            return Err(ConfigError::Invalid("feed capacity must be positive".into()));
        }
        if self.stream.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll interval must be positive".into()));
        }
        if self.stream.reconnect_multiplier < 1.0 || self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::Invalid("backoff multipliers must be >= 1".into()));
        }
        if self.stream.reconnect_initial_delay_ms > self.stream.reconnect_max_delay_ms {
            return Err(ConfigError::Invalid(
                "reconnect initial delay exceeds max delay".into(),
            ));
        }
        Ok(())
    }
}

/// Load gateway configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<GatewayConfig, ConfigError> {
    let default_config = include_str!("gateway_config.json");
    load_config_from_str(default_config)
}
