//! Feed driver for venues with a push trade channel

use coincross_core::Pair;
use coincross_ports::{Client, ClientResult, Cursor, FeedSender};
use log::{debug, info, warn};

use super::{Backoff, forward, pause, resume_point};
use crate::config::StreamConfig;
use crate::messages::decode_trades;
use crate::transport::TradeSource;

/// Live subscription with history backfill
///
/// Each session subscribes first and backfills second, so nothing printed
/// in between is missed; the overlap is removed by the feed watermark.
pub struct PushStream<S: TradeSource> {
    source: S,
    config: StreamConfig,
}

impl<S: TradeSource> PushStream<S> {
    pub fn new(source: S, config: StreamConfig) -> Self {
        Self { source, config }
    }

    /// Stream until the feed is cancelled or a non-retryable error occurs.
    /// The source is closed before this returns.
    pub async fn run<C>(
        &mut self,
        client: &C,
        pair: &Pair,
        since: Cursor,
        destination: &FeedSender,
    ) -> ClientResult<()>
    where
        C: Client + ?Sized,
    {
        let mut backoff = Backoff::new(&self.config);
        let result = loop {
            match self.session(client, pair, since, destination, &mut backoff).await {
                Ok(()) => break Ok(()),
                Err(e) if e.is_retryable() => {
                    self.source.close().await;
                    let Some(delay) = backoff.next_delay() else {
                        break Err(e);
                    };
                    warn!(
                        "{} {} stream dropped: {}; reconnect {} in {:?}",
                        client.name(),
                        pair,
                        e,
                        backoff.failures(),
                        delay
                    );
                    if pause(destination, delay).await {
                        break Ok(());
                    }
                }
                Err(e) => break Err(e),
            }
        };
        self.source.close().await;
        debug!("{} {} stream source closed", client.name(), pair);
        result
    }

    async fn session<C>(
        &mut self,
        client: &C,
        pair: &Pair,
        since: Cursor,
        destination: &FeedSender,
        backoff: &mut Backoff,
    ) -> ClientResult<()>
    where
        C: Client + ?Sized,
    {
        self.source.connect(pair).await?;

        let mut cursor = resume_point(since, destination);
        loop {
            let (trades, next) = client.history(pair, cursor).await?;
            if trades.is_empty() {
                break;
            }
            if !forward(destination, since, trades).await? {
                return Ok(());
            }
            cursor = next;
        }
        backoff.reset();
        info!(
            "{} {} stream live after {}",
            client.name(),
            pair,
            destination.watermark()
        );

        loop {
            let frame = tokio::select! {
                frame = self.source.next_frame() => frame?,
                _ = destination.cancelled() => return Ok(()),
            };
            let trades = decode_trades(&frame)?
                .into_iter()
                .filter(|trade| &trade.pair == pair)
                .collect();
            if !forward(destination, since, trades).await? {
                return Ok(());
            }
        }
    }
}
