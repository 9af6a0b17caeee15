//! Bounded, cancellable trade feed
//!
//! A feed is a pair of handles over one bounded channel: the producer side
//! ([`FeedSender`]) is handed to `Client::stream`, the consumer side
//! ([`TradeFeed`]) stays with the caller. The sender keeps the id of the last
//! delivered trade so a producer that reconnects can resume without gaps and
//! without repeating itself.

use coincross_core::Trade;
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::client::Cursor;
use crate::error::{ClientError, ClientResult};

/// One feed element: a trade, or the terminal error that ended the feed
pub type FeedItem = ClientResult<Trade>;

/// What a producer does when the consumer falls behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Suspend the producer until the consumer makes room
    #[default]
    Block,
    /// End the feed with `ClientError::Overflow`
    Fail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Buffered trades between producer and consumer
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            overflow: OverflowPolicy::Block,
        }
    }
}

/// Create a feed that will deliver trades with ids after `since`
pub fn trade_feed(since: Cursor, config: &FeedConfig) -> (FeedSender, TradeFeed) {
    let capacity = config.capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let sender = FeedSender {
        tx,
        watermark: Arc::new(AtomicI64::new(since.value())),
        cancel: cancel_rx,
        policy: config.overflow,
        capacity,
    };
    let feed = TradeFeed {
        rx,
        cancel: cancel_tx,
        task: None,
        finished: false,
    };
    (sender, feed)
}

/// Producer half of a trade feed
///
/// Clones share the watermark; only one clone should be delivering at a time.
#[derive(Debug, Clone)]
pub struct FeedSender {
    tx: mpsc::Sender<FeedItem>,
    watermark: Arc<AtomicI64>,
    cancel: watch::Receiver<bool>,
    policy: OverflowPolicy,
    capacity: usize,
}

impl FeedSender {
    /// Cursor just past the last delivered trade
    pub fn watermark(&self) -> Cursor {
        Cursor::after(self.watermark.load(Ordering::SeqCst))
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.tx.is_closed()
    }

    /// Completes once the consumer cancels, drops, or closes the feed
    pub async fn cancelled(&self) {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            _ = cancel.wait_for(|cancelled| *cancelled) => {}
            _ = self.tx.closed() => {}
        }
    }

    /// Push one trade to the consumer.
    ///
    /// Returns `Ok(false)` without sending when the trade is at or below the
    /// watermark. A full buffer either suspends the caller or fails with
    /// `Overflow`, depending on the policy.
    pub async fn deliver(&self, trade: Trade) -> ClientResult<bool> {
        let watermark = self.watermark.load(Ordering::SeqCst);
        if trade.id <= watermark {
            debug!("Feed skipping trade {} (watermark {})", trade.id, watermark);
            return Ok(false);
        }

        let id = trade.id;
        match self.policy {
            OverflowPolicy::Block => {
                tokio::select! {
                    sent = self.tx.send(Ok(trade)) => {
                        sent.map_err(|_| ClientError::Closed)?;
                    }
                    _ = self.cancelled() => return Err(ClientError::Closed),
                }
            }
            OverflowPolicy::Fail => match self.tx.try_send(Ok(trade)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("Feed buffer of {} trades is full", self.capacity);
                    return Err(ClientError::Overflow {
                        capacity: self.capacity,
                    });
                }
                Err(TrySendError::Closed(_)) => return Err(ClientError::Closed),
            },
        }

        self.watermark.store(id, Ordering::SeqCst);
        Ok(true)
    }

    /// Hand the consumer the error that ends the feed
    pub async fn fail(&self, err: ClientError) {
        debug!("Feed terminating with {}", err.kind());
        tokio::select! {
            _ = self.tx.send(Err(err)) => {}
            _ = self.cancelled() => {}
        }
    }
}

/// Consumer half of a trade feed
///
/// Dropping it signals cancellation to the producer; [`TradeFeed::cancel`]
/// additionally waits for the producer task to release its transport.
#[derive(Debug)]
pub struct TradeFeed {
    rx: mpsc::Receiver<FeedItem>,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    finished: bool,
}

impl TradeFeed {
    /// Bind the producer task so `cancel` can wait for it
    pub fn attach(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }

    /// Next trade, the terminal error, or `None` once the feed is over
    pub async fn next(&mut self) -> Option<FeedItem> {
        if self.finished {
            return None;
        }
        match self.rx.recv().await {
            Some(Ok(trade)) => Some(Ok(trade)),
            Some(Err(err)) => {
                self.finished = true;
                self.rx.close();
                Some(Err(err))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop the feed and wait for the producer to exit
    pub async fn cancel(mut self) {
        self.cancel.send_replace(true);
        self.rx.close();
        self.finished = true;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Feed producer ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TradeFeed {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}
