//! `Client` adapter over the in-memory exchange

use async_trait::async_trait;
use coincross_core::{
    Order, OrderId, Orderbook, Pair, Price, Quantity, Ticker, Trade, TradeType, Transaction,
};
use coincross_gateway::{GatewayConfig, PollingStream, PushStream, retry_read};
use coincross_ports::{Balances, Client, ClientError, ClientResult, Cursor, FeedSender};
use log::info;
use std::sync::Arc;

use crate::config::StreamMode;
use crate::exchange::{Credentials, Exchange};

/// Session with a simulated exchange
///
/// Reads are retried on transient failures per `GatewayConfig::retry`;
/// `trade` and `cancel` are sent exactly once.
pub struct SimClient {
    name: String,
    exchange: Arc<Exchange>,
    credentials: Credentials,
    config: GatewayConfig,
}

impl SimClient {
    pub fn new(exchange: Arc<Exchange>, credentials: Credentials, config: GatewayConfig) -> Self {
        Self {
            name: format!("sim:{}", credentials.key()),
            exchange,
            credentials,
            config,
        }
    }

    pub fn exchange(&self) -> &Arc<Exchange> {
        &self.exchange
    }
}

#[async_trait]
impl Client for SimClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn balance(&self) -> ClientResult<Balances> {
        let (exchange, credentials) = (&*self.exchange, &self.credentials);
        retry_read(&self.config.retry, "balance", move || async move {
            exchange.balance(credentials).await.map_err(ClientError::from)
        })
        .await
    }

    async fn trade(
        &self,
        side: TradeType,
        pair: &Pair,
        price: Price,
        amount: Quantity,
    ) -> ClientResult<OrderId> {
        Ok(self
            .exchange
            .place(&self.credentials, side, pair, price, amount)
            .await?)
    }

    async fn cancel(&self, order_id: OrderId) -> ClientResult<bool> {
        Ok(self.exchange.cancel(&self.credentials, order_id).await?)
    }

    async fn orders(&self) -> ClientResult<Vec<Order>> {
        let (exchange, credentials) = (&*self.exchange, &self.credentials);
        retry_read(&self.config.retry, "orders", move || async move {
            exchange.open_orders(credentials).await.map_err(ClientError::from)
        })
        .await
    }

    async fn transactions(&self, limit: usize) -> ClientResult<Vec<Transaction>> {
        let (exchange, credentials) = (&*self.exchange, &self.credentials);
        retry_read(&self.config.retry, "transactions", move || async move {
            exchange.transactions(credentials, limit).await.map_err(ClientError::from)
        })
        .await
    }

    async fn history(&self, pair: &Pair, since: Cursor) -> ClientResult<(Vec<Trade>, Cursor)> {
        let (exchange, credentials) = (&*self.exchange, &self.credentials);
        let (trades, next) = retry_read(&self.config.retry, "history", move || async move {
            exchange
                .history(credentials, pair, since.value())
                .await
                .map_err(ClientError::from)
        })
        .await?;
        Ok((trades, Cursor::after(next)))
    }

    async fn orderbook(&self, pair: &Pair, depth: usize) -> ClientResult<Orderbook> {
        let (exchange, credentials) = (&*self.exchange, &self.credentials);
        retry_read(&self.config.retry, "orderbook", move || async move {
            exchange.orderbook(credentials, pair, depth).await.map_err(ClientError::from)
        })
        .await
    }

    async fn ticker(&self, pair: &Pair) -> ClientResult<Ticker> {
        let (exchange, credentials) = (&*self.exchange, &self.credentials);
        retry_read(&self.config.retry, "ticker", move || async move {
            exchange.ticker(credentials, pair).await.map_err(ClientError::from)
        })
        .await
    }

    async fn stream(
        &self,
        pair: &Pair,
        since: Cursor,
        destination: FeedSender,
    ) -> ClientResult<()> {
        if !self.exchange.config().pairs.contains(pair) {
            return Err(ClientError::InvalidArgument(format!("unknown pair {}", pair)));
        }
        let mode = self.exchange.config().stream_mode;
        info!("{} streaming {} ({:?}) after {}", self.name, pair, mode, since);
        match mode {
            StreamMode::Push => {
                PushStream::new(self.exchange.transport().source(), self.config.stream.clone())
                    .run(self, pair, since, &destination)
                    .await
            }
            StreamMode::Poll => {
                PollingStream::new(self.config.stream.clone())
                    .run(self, pair, since, &destination)
                    .await
            }
        }
    }
}
