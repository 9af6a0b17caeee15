//! Drivers behind `Client::stream`
//!
//! Both drivers resume from the feed's watermark after a transient failure
//! and rely on [`FeedSender::deliver`] to drop anything already delivered.

pub mod backoff;
pub mod poll;
pub mod push;

pub use backoff::Backoff;
pub use poll::PollingStream;
pub use push::PushStream;

use coincross_core::{Pair, Trade};
use coincross_ports::{
    Client, ClientError, ClientResult, Cursor, FeedConfig, FeedSender, TradeFeed, trade_feed,
};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Run `client.stream` on its own task and return the consuming end
///
/// A fatal error from the adapter is handed to the feed as its terminal item.
pub fn spawn_stream<C>(client: Arc<C>, pair: Pair, since: Cursor, config: &FeedConfig) -> TradeFeed
where
    C: Client + ?Sized + 'static,
{
    let (sender, mut feed) = trade_feed(since, config);
    let task = tokio::spawn(async move {
        match client.stream(&pair, since, sender.clone()).await {
            Ok(()) => debug!("{} stream for {} stopped", client.name(), pair),
            Err(e) => {
                warn!("{} stream for {} failed: {}", client.name(), pair, e);
                sender.fail(e).await;
            }
        }
    });
    feed.attach(task);
    feed
}

/// Where a (re)subscription starts reading
pub(crate) fn resume_point(since: Cursor, destination: &FeedSender) -> Cursor {
    since.max(destination.watermark())
}

/// Deliver a batch; `Ok(false)` means the consumer is gone
pub(crate) async fn forward(
    destination: &FeedSender,
    since: Cursor,
    trades: Vec<Trade>,
) -> ClientResult<bool> {
    for trade in trades {
        if trade.id <= since.value() {
            continue;
        }
        match destination.deliver(trade).await {
            Ok(_) => {}
            Err(ClientError::Closed) => return Ok(false),
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Sleep unless cancelled first; returns `true` on cancellation
pub(crate) async fn pause(destination: &FeedSender, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = destination.cancelled() => true,
    }
}
