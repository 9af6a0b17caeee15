use async_trait::async_trait;
use coincross_core::{
    Order, OrderId, Orderbook, Pair, Price, Quantity, Symbol, Ticker, Trade, TradeId, TradeType,
    Transaction,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

use crate::error::ClientResult;
use crate::feed::FeedSender;

/// Available quantity per currency
pub type Balances = HashMap<Symbol, Decimal>;

/// Watermark for incremental history reads and feed subscriptions
///
/// Opaque to callers: pass back whatever `Client::history` returned.
/// Adapters must also accept a cursor built with [`Cursor::after`] from the
/// id of the last trade a caller has seen, which is how feeds resume after
/// a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(i64);

impl Cursor {
    /// Start of the exchange's retained window
    pub const BEGINNING: Cursor = Cursor(-1);

    /// Everything strictly after the given trade
    pub fn after(trade_id: TradeId) -> Self {
        Cursor(trade_id)
    }

    /// Raw adapter-defined value
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_beginning(&self) -> bool {
        self.0 < 0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::BEGINNING
    }
}

impl From<i64> for Cursor {
    fn from(raw: i64) -> Self {
        Cursor(raw)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port for an exchange adapter
///
/// One implementation per exchange, each holding its own session
/// (credentials, connections) created explicitly by the caller. Every
/// operation is a single request/response; callers sharing one adapter
/// across tasks should serialize calls unless the adapter documents
/// otherwise.
#[async_trait]
pub trait Client: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &str;

    /// Available (unlocked) quantity per currency
    async fn balance(&self) -> ClientResult<Balances>;

    /// Place a limit order and return its id.
    ///
    /// A buy locks `amount * price` of the base currency, a sell locks
    /// `amount` of the target currency; the next `balance()` reflects it.
    async fn trade(
        &self,
        side: TradeType,
        pair: &Pair,
        price: Price,
        amount: Quantity,
    ) -> ClientResult<OrderId>;

    /// Cancel an order.
    ///
    /// Returns `false` when the order was already filled or cancelled and
    /// fails with `NotFound` only when the id is unknown.
    async fn cancel(&self, order_id: OrderId) -> ClientResult<bool>;

    /// All open orders across all pairs
    async fn orders(&self) -> ClientResult<Vec<Order>>;

    /// Most recent ledger entries, newest first.
    ///
    /// `limit` must be positive; values above the adapter ceiling are
    /// clamped rather than rejected.
    async fn transactions(&self, limit: usize) -> ClientResult<Vec<Transaction>>;

    /// Trades after `since`, oldest first, plus the cursor for the next call.
    ///
    /// `Cursor::BEGINNING` reads from the oldest retained trade. Any other
    /// cursor older than the retained window fails with `HistoryGap`.
    async fn history(&self, pair: &Pair, since: Cursor) -> ClientResult<(Vec<Trade>, Cursor)>;

    /// Snapshot with at most `depth` levels per side
    async fn orderbook(&self, pair: &Pair, depth: usize) -> ClientResult<Orderbook>;

    async fn ticker(&self, pair: &Pair) -> ClientResult<Ticker>;

    /// Deliver every trade of `pair` after `since` onto `destination`, in
    /// increasing id order, exactly once each.
    ///
    /// Runs until the feed is cancelled (returns `Ok`) or a fatal error
    /// occurs (returns it). Transient transport failures are retried from
    /// the last delivered trade.
    async fn stream(&self, pair: &Pair, since: Cursor, destination: FeedSender)
    -> ClientResult<()>;
}
