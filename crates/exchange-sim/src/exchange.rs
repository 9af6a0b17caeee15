use chrono::Duration;
use coincross_clock::SystemClock;
use coincross_core::values::truncate_to_secs;
use coincross_core::{
    Order, OrderId, Orderbook, Pair, Price, Quantity, Symbol, Ticker, Timestamp, Trade, TradeId,
    TradeType, Transaction, TransactionId,
};
use coincross_gateway::{ChannelTransport, encode_trade};
use coincross_ports::Clock;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::RwLock;

use crate::account::{Account, AssetBalance};
use crate::book::{Fill, OrderBook};
use crate::config::SimConfig;
use crate::error::{ExchangeError, Result};

/// API key and secret identifying an account
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    revoked: HashSet<String>,
    books: HashMap<Pair, OrderBook>,
    /// Retained trade log per pair, oldest first
    trades: HashMap<Pair, VecDeque<Trade>>,
    /// Id of the newest trade dropped from each pair's log
    evicted: HashMap<Pair, TradeId>,
    /// Open order id -> (owner, pair)
    open: HashMap<OrderId, (String, Pair)>,
    /// Filled or cancelled order id -> owner
    closed: HashMap<OrderId, String>,
    next_order_id: OrderId,
    next_trade_id: TradeId,
    next_transaction_id: TransactionId,
}

impl State {
    fn authenticate(&self, credentials: &Credentials) -> Result<()> {
        if self.revoked.contains(&credentials.key) {
            return Err(ExchangeError::Auth(format!("key {} revoked", credentials.key)));
        }
        match self.accounts.get(&credentials.key) {
            Some(account) if account.secret_matches(&credentials.secret) => Ok(()),
            _ => Err(ExchangeError::Auth("invalid API key or secret".to_string())),
        }
    }

    fn account(&self, credentials: &Credentials) -> Result<&Account> {
        self.authenticate(credentials)?;
        self.accounts
            .get(&credentials.key)
            .ok_or_else(|| ExchangeError::Auth("invalid API key or secret".to_string()))
    }

    fn account_mut(&mut self, credentials: &Credentials) -> Result<&mut Account> {
        self.authenticate(credentials)?;
        self.accounts
            .get_mut(&credentials.key)
            .ok_or_else(|| ExchangeError::Auth("invalid API key or secret".to_string()))
    }

    fn book(&self, pair: &Pair) -> Result<&OrderBook> {
        self.books
            .get(pair)
            .ok_or_else(|| ExchangeError::UnknownPair(pair.clone()))
    }

    fn next_transaction(&mut self, timestamp: Timestamp, description: String) -> Transaction {
        self.next_transaction_id += 1;
        Transaction::new(self.next_transaction_id, timestamp, description)
    }
}

/// In-memory venue
///
/// All state sits behind one lock, so every request observes a consistent
/// venue and trades are printed in id order. Several clients may share one
/// exchange through an `Arc`.
pub struct Exchange {
    config: SimConfig,
    clock: Arc<dyn Clock>,
    transport: Arc<ChannelTransport>,
    state: RwLock<State>,
    /// Requests still to fail with an injected outage
    failures: AtomicU32,
}

impl Exchange {
    /// Create an exchange listing `config.pairs`
    pub fn new(config: SimConfig, clock: Arc<dyn Clock>) -> Result<Arc<Self>> {
        config.validate()?;

        let mut state = State::default();
        for pair in &config.pairs {
            state.books.insert(pair.clone(), OrderBook::new(pair.clone()));
            state.trades.insert(pair.clone(), VecDeque::new());
        }
        info!(
            "Exchange listing {} pairs with {} clock",
            config.pairs.len(),
            clock.name()
        );

        Ok(Arc::new(Self {
            transport: ChannelTransport::new(config.transport_capacity),
            config,
            clock,
            state: RwLock::new(state),
            failures: AtomicU32::new(0),
        }))
    }

    pub fn with_system_clock(config: SimConfig) -> Result<Arc<Self>> {
        Self::new(config, Arc::new(SystemClock::new()))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Push channel carrying every printed trade as a JSON frame
    pub fn transport(&self) -> &Arc<ChannelTransport> {
        &self.transport
    }

    fn now(&self) -> Timestamp {
        truncate_to_secs(self.clock.now())
    }

    fn check_available(&self, what: &str) -> Result<()> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            warn!("Injected outage on {}", what);
            return Err(ExchangeError::Unavailable(format!("{} temporarily unavailable", what)));
        }
        Ok(())
    }

    // ============ Accounts ============

    /// Register an account and return its credentials
    pub async fn open_account(&self, key: &str, secret: &str) -> Credentials {
        let mut state = self.state.write().await;
        state.revoked.remove(key);
        state
            .accounts
            .entry(key.to_string())
            .or_insert_with(|| Account::new(secret, self.config.max_transactions));
        info!("Opened account: key={}", key);
        Credentials::new(key, secret)
    }

    /// Credit an account; recorded in its ledger
    pub async fn deposit(
        &self,
        credentials: &Credentials,
        asset: &Symbol,
        amount: Decimal,
    ) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidArgument(format!(
                "deposit must be positive, got {}",
                amount
            )));
        }
        let now = self.now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if !state.account(credentials)?.can_credit(asset, amount) {
            return Err(ExchangeError::InvalidArgument(format!(
                "deposit of {} {} overflows the balance",
                amount, asset
            )));
        }
        let transaction = state
            .next_transaction(now, format!("Deposit {} {}", amount, asset))
            .with_amount(asset.clone(), amount);
        let account = state.account_mut(credentials)?;
        account.deposit(asset, amount);
        account.record(transaction);
        debug!("Deposit: key={}, asset={}, amount={}", credentials.key, asset, amount);
        Ok(())
    }

    pub async fn balance(&self, credentials: &Credentials) -> Result<HashMap<Symbol, Decimal>> {
        self.check_available("balance")?;
        let state = self.state.read().await;
        Ok(state.account(credentials)?.available())
    }

    /// Available and locked quantity of one asset
    pub async fn asset_balance(
        &self,
        credentials: &Credentials,
        asset: &Symbol,
    ) -> Result<AssetBalance> {
        let state = self.state.read().await;
        Ok(state.account(credentials)?.balance(asset))
    }

    // ============ Orders ============

    /// Place a limit order, matching it against the book first
    pub async fn place(
        &self,
        credentials: &Credentials,
        side: TradeType,
        pair: &Pair,
        price: Price,
        amount: Quantity,
    ) -> Result<OrderId> {
        self.check_available("trade")?;
        if price <= Decimal::ZERO {
            return Err(ExchangeError::InvalidPrice(format!(
                "price must be positive, got {}",
                price
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidPrice(format!(
                "amount must be positive, got {}",
                amount
            )));
        }

        let now = self.now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.authenticate(credentials)?;
        state.book(pair)?;

        // Every later fill is bounded by this notional
        let notional = amount.checked_mul(price).ok_or_else(|| {
            ExchangeError::InvalidPrice(format!(
                "notional of {} @ {} is out of range",
                amount, price
            ))
        })?;
        let (asset, required) = match side {
            TradeType::Buy => (pair.base(), notional),
            TradeType::Sell => (pair.target(), amount),
        };
        state.account_mut(credentials)?.lock(asset, required)?;

        state.next_order_id += 1;
        let id = state.next_order_id;
        let mut order = Order::new(id, now, side, pair.clone(), price, amount);
        info!(
            "Placing order: id={}, key={}, side={}, pair={}, price={}, amount={}",
            id, credentials.key, side, pair, price, amount
        );

        let fills = match state.books.get_mut(pair) {
            Some(book) => book.match_order(&mut order),
            None => Vec::new(),
        };
        for fill in &fills {
            self.settle(state, &credentials.key, &order, fill, now);
        }

        if order.is_filled() {
            state.closed.insert(id, credentials.key.clone());
        } else {
            state.open.insert(id, (credentials.key.clone(), pair.clone()));
            if let Some(book) = state.books.get_mut(pair) {
                book.add(order, credentials.key.clone());
            }
        }
        Ok(id)
    }

    /// Move funds for one fill, print the trade, and write both ledgers
    fn settle(&self, state: &mut State, taker: &str, order: &Order, fill: &Fill, now: Timestamp) {
        let pair = &order.pair;
        let target = pair.target();
        let base = pair.base();
        // Fits: both sides checked amount * price at placement
        let notional = fill.amount * fill.price;
        let (buyer, seller) = match order.side {
            TradeType::Buy => (taker, fill.maker_owner.as_str()),
            TradeType::Sell => (fill.maker_owner.as_str(), taker),
        };

        let bought = state
            .next_transaction(now, format!("Buy {} {} @ {}", fill.amount, pair, fill.price))
            .with_amount(target.clone(), fill.amount)
            .with_amount(base.clone(), -notional);
        if let Some(account) = state.accounts.get_mut(buyer) {
            account.spend_locked(base, notional);
            // A taker buy locked at its own limit; release the price improvement
            if order.side.is_buy() {
                account.unlock(base, (order.price - fill.price) * fill.amount);
            }
            account.deposit(target, fill.amount);
            account.record(bought);
        }

        let sold = state
            .next_transaction(now, format!("Sell {} {} @ {}", fill.amount, pair, fill.price))
            .with_amount(target.clone(), -fill.amount)
            .with_amount(base.clone(), notional);
        if let Some(account) = state.accounts.get_mut(seller) {
            account.spend_locked(target, fill.amount);
            account.deposit(base, notional);
            account.record(sold);
        }

        if fill.maker_done {
            state.open.remove(&fill.maker_id);
            state.closed.insert(fill.maker_id, fill.maker_owner.clone());
        }

        state.next_trade_id += 1;
        let trade = Trade::new(
            state.next_trade_id,
            now,
            order.side,
            pair.clone(),
            fill.price,
            fill.amount,
        );
        self.record_trade(state, trade);
    }

    /// Append to the retained log and push to live subscribers
    fn record_trade(&self, state: &mut State, trade: Trade) {
        debug!(
            "Trade executed: id={}, pair={}, side={}, price={}, amount={}",
            trade.id, trade.pair, trade.side, trade.price, trade.amount
        );
        match encode_trade(&trade) {
            Ok(frame) => {
                self.transport.publish(&trade.pair, frame);
            }
            Err(e) => warn!("Failed to encode trade {}: {}", trade.id, e),
        }
        let pair = trade.pair.clone();
        let log = state.trades.entry(pair.clone()).or_default();
        log.push_back(trade);
        let mut dropped = None;
        while log.len() > self.config.history_window {
            dropped = log.pop_front().map(|t| t.id).or(dropped);
        }
        if let Some(id) = dropped {
            state.evicted.insert(pair, id);
        }
    }

    /// Cancel an open order, releasing what it still holds locked
    pub async fn cancel(&self, credentials: &Credentials, order_id: OrderId) -> Result<bool> {
        self.check_available("cancel")?;
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.authenticate(credentials)?;

        let owned_and_open = matches!(
            state.open.get(&order_id),
            Some((owner, _)) if *owner == credentials.key
        );
        if !owned_and_open {
            return match state.closed.get(&order_id) {
                Some(owner) if *owner == credentials.key => {
                    debug!("Cancel of closed order {} is a no-op", order_id);
                    Ok(false)
                }
                _ => Err(ExchangeError::OrderNotFound(order_id)),
            };
        }

        let resting = state
            .open
            .remove(&order_id)
            .and_then(|(_, pair)| state.books.get_mut(&pair))
            .and_then(|book| book.remove(order_id));
        if let Some(resting) = resting {
            let order = resting.order;
            let (asset, held) = match order.side {
                // Bounded by the notional checked at placement
                TradeType::Buy => (
                    order.pair.base(),
                    order.remaining_notional().unwrap_or_default(),
                ),
                TradeType::Sell => (order.pair.target(), order.remain),
            };
            state.account_mut(credentials)?.unlock(asset, held);
        }
        state.closed.insert(order_id, credentials.key.clone());
        info!("Cancelled order: id={}, key={}", order_id, credentials.key);
        Ok(true)
    }

    /// Open orders of the account, oldest first
    pub async fn open_orders(&self, credentials: &Credentials) -> Result<Vec<Order>> {
        self.check_available("orders")?;
        let state = self.state.read().await;
        state.authenticate(credentials)?;
        let mut orders: Vec<Order> = state
            .books
            .values()
            .flat_map(|book| book.orders_of(&credentials.key))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    /// Newest ledger entries first; `limit` is clamped to `max_transactions`
    pub async fn transactions(
        &self,
        credentials: &Credentials,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        self.check_available("transactions")?;
        if limit == 0 {
            return Err(ExchangeError::InvalidArgument(
                "limit must be positive".to_string(),
            ));
        }
        let state = self.state.read().await;
        Ok(state
            .account(credentials)?
            .recent(limit.min(self.config.max_transactions)))
    }

    // ============ Market data ============

    /// One page of retained trades with id above `since`, oldest first.
    /// Returns the page and the id to pass as the next `since`.
    pub async fn history(
        &self,
        credentials: &Credentials,
        pair: &Pair,
        since: TradeId,
    ) -> Result<(Vec<Trade>, TradeId)> {
        self.check_available("history")?;
        let state = self.state.read().await;
        state.authenticate(credentials)?;
        let log = state
            .trades
            .get(pair)
            .ok_or_else(|| ExchangeError::UnknownPair(pair.clone()))?;

        if let Some(&evicted) = state.evicted.get(pair) {
            if since >= 0 && since < evicted {
                warn!(
                    "History for {} after {} requested, trades up to {} evicted",
                    pair, since, evicted
                );
                return Err(ExchangeError::HistoryGap {
                    pair: pair.clone(),
                    since,
                    evicted,
                });
            }
        }
        let start = log.partition_point(|t| t.id <= since);
        let page: Vec<Trade> = log
            .range(start..)
            .take(self.config.history_page_size)
            .cloned()
            .collect();
        let next = page.last().map(|t| t.id).unwrap_or(since);
        Ok((page, next))
    }

    pub async fn orderbook(
        &self,
        credentials: &Credentials,
        pair: &Pair,
        depth: usize,
    ) -> Result<Orderbook> {
        self.check_available("orderbook")?;
        if depth == 0 {
            return Err(ExchangeError::InvalidArgument(
                "depth must be positive".to_string(),
            ));
        }
        let state = self.state.read().await;
        state.authenticate(credentials)?;
        Ok(state.book(pair)?.snapshot(depth.min(self.config.max_depth)))
    }

    /// Last price, top of book, and 24h range and volume
    pub async fn ticker(&self, credentials: &Credentials, pair: &Pair) -> Result<Ticker> {
        self.check_available("ticker")?;
        let state = self.state.read().await;
        state.authenticate(credentials)?;
        let book = state.book(pair)?;

        let mut ticker = Ticker::empty(pair.clone());
        ticker.bid = book.best_bid();
        ticker.ask = book.best_ask();
        if let Some(log) = state.trades.get(pair) {
            ticker.last = log.back().map(|t| t.price);
            let window_start = self.now() - Duration::hours(24);
            for trade in log.iter().filter(|t| t.timestamp >= window_start) {
                ticker.high = Some(ticker.high.map_or(trade.price, |h| h.max(trade.price)));
                ticker.low = Some(ticker.low.map_or(trade.price, |l| l.min(trade.price)));
                ticker.volume += trade.amount;
            }
        }
        Ok(ticker)
    }

    /// Print a trade from flow outside the simulated accounts
    pub async fn print_trade(
        &self,
        side: TradeType,
        pair: &Pair,
        price: Price,
        amount: Quantity,
    ) -> Result<Trade> {
        if price <= Decimal::ZERO || amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidPrice(format!(
                "printed trade needs positive price and amount, got {} @ {}",
                amount, price
            )));
        }
        let now = self.now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.book(pair)?;
        state.next_trade_id += 1;
        let trade = Trade::new(state.next_trade_id, now, side, pair.clone(), price, amount);
        self.record_trade(state, trade.clone());
        Ok(trade)
    }

    // ============ Fault injection ============

    /// Fail the next `count` client requests with a transient outage
    pub fn fail_next_requests(&self, count: u32) {
        warn!("Injecting outage for the next {} requests", count);
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Drop every live trade subscription
    pub fn disconnect_streams(&self) {
        warn!("Disconnecting all trade streams");
        self.transport.disconnect_all();
    }

    /// Reject the key from now on
    pub async fn revoke(&self, key: &str) {
        warn!("Revoking key {}", key);
        self.state.write().await.revoked.insert(key.to_string());
    }
}
