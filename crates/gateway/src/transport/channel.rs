//! Tokio channel-based transport for single-process mode
//!
//! One broadcast channel per pair subject, created on first subscription.
//! Frames are the same JSON text a remote venue would push.

use crate::error::TransportError;
use crate::transport::{Subjects, TradeSource};
use async_trait::async_trait;
use coincross_core::Pair;
use dashmap::DashMap;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::broadcast;

/// What travels on a pair channel
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Data(String),
    /// Server-side drop of every subscriber
    Disconnect,
}

/// In-process pub/sub hub keyed by pair subject
pub struct ChannelTransport {
    channels: DashMap<String, broadcast::Sender<Frame>>,
    capacity: usize,
}

impl ChannelTransport {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        })
    }

    fn sender(&self, subject: &str) -> broadcast::Sender<Frame> {
        self.channels
            .entry(subject.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publish one frame; returns how many subscribers received it
    pub fn publish(&self, pair: &Pair, payload: String) -> usize {
        match self.channels.get(&Subjects::trades(pair)) {
            Some(tx) => tx.send(Frame::Data(payload)).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop every live subscriber on every pair
    pub fn disconnect_all(&self) {
        let mut dropped = 0;
        for entry in self.channels.iter() {
            dropped += entry.value().send(Frame::Disconnect).unwrap_or(0);
        }
        info!("Channel transport disconnected {} subscribers", dropped);
    }

    pub fn subscriber_count(&self, pair: &Pair) -> usize {
        self.channels
            .get(&Subjects::trades(pair))
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// New unconnected source bound to this hub
    pub fn source(self: &Arc<Self>) -> ChannelTradeSource {
        ChannelTradeSource {
            hub: Arc::clone(self),
            rx: None,
        }
    }
}

/// Subscriber side of [`ChannelTransport`]
pub struct ChannelTradeSource {
    hub: Arc<ChannelTransport>,
    rx: Option<broadcast::Receiver<Frame>>,
}

impl ChannelTradeSource {
    pub fn is_connected(&self) -> bool {
        self.rx.is_some()
    }
}

#[async_trait]
impl TradeSource for ChannelTradeSource {
    async fn connect(&mut self, pair: &Pair) -> Result<(), TransportError> {
        let subject = Subjects::trades(pair);
        debug!("Subscribing to {}", subject);
        self.rx = Some(self.hub.sender(&subject).subscribe());
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<String, TransportError> {
        let rx = self
            .rx
            .as_mut()
            .ok_or_else(|| TransportError::Connection("not connected".to_string()))?;
        let received = rx.recv().await;
        match received {
            Ok(Frame::Data(payload)) => Ok(payload),
            Ok(Frame::Disconnect) => {
                self.rx = None;
                Err(TransportError::Disconnected)
            }
            Err(broadcast::error::RecvError::Lagged(lost)) => Err(TransportError::Lagged(lost)),
            Err(broadcast::error::RecvError::Closed) => {
                self.rx = None;
                Err(TransportError::ChannelClosed)
            }
        }
    }

    async fn close(&mut self) {
        self.rx = None;
    }
}
