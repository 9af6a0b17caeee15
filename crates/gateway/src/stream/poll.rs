//! Feed driver for venues without a push channel

use coincross_core::Pair;
use coincross_ports::{Client, ClientResult, Cursor, FeedSender};
use log::{info, warn};

use super::{Backoff, forward, pause, resume_point};
use crate::config::StreamConfig;

/// Repeatedly reads `history` from the watermark and forwards new trades
pub struct PollingStream {
    config: StreamConfig,
}

impl PollingStream {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Poll until the feed is cancelled or a non-retryable error occurs
    pub async fn run<C>(
        &self,
        client: &C,
        pair: &Pair,
        since: Cursor,
        destination: &FeedSender,
    ) -> ClientResult<()>
    where
        C: Client + ?Sized,
    {
        let mut cursor = resume_point(since, destination);
        let mut backoff = Backoff::new(&self.config);
        info!("Polling {} {} trades after {}", client.name(), pair, cursor);

        loop {
            if destination.is_cancelled() {
                return Ok(());
            }

            match client.history(pair, cursor).await {
                Ok((trades, next)) => {
                    backoff.reset();
                    let fetched = trades.len();
                    if !forward(destination, since, trades).await? {
                        return Ok(());
                    }
                    cursor = next;
                    // Keep paging while the venue still has a backlog
                    if fetched > 0 {
                        continue;
                    }
                }
                Err(e) if e.is_retryable() => {
                    let Some(delay) = backoff.next_delay() else {
                        return Err(e);
                    };
                    warn!(
                        "Poll of {} {} failed: {}; retry {} in {:?}",
                        client.name(),
                        pair,
                        e,
                        backoff.failures(),
                        delay
                    );
                    if pause(destination, delay).await {
                        return Ok(());
                    }
                    cursor = cursor.max(resume_point(since, destination));
                    continue;
                }
                Err(e) => return Err(e),
            }

            if pause(destination, self.config.poll_interval()).await {
                return Ok(());
            }
        }
    }
}
