//! Integration test: the Client contract over the simulated exchange
//!
//! Covers order placement side effects, cancel semantics, paging, book
//! snapshots and the trade feed in both push and poll mode.

use coincross_core::{Pair, Symbol, TradeId, TradeType};
use coincross_gateway::{GatewayConfig, RetryConfig, StreamConfig, spawn_stream};
use coincross_ports::{Client, ClientError, Cursor, FeedConfig, OverflowPolicy, TradeFeed};
use exchange_sim::{Exchange, SimClient, SimConfig, StreamMode};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn btc_usd() -> Pair {
    Pair::from_symbols("BTC", "USD").unwrap()
}

fn sym(s: &str) -> Symbol {
    Symbol::new(s).unwrap()
}

fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        stream: StreamConfig {
            poll_interval_ms: 10,
            reconnect_initial_delay_ms: 10,
            reconnect_max_delay_ms: 50,
            ..StreamConfig::default()
        },
        retry: RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_factor: 2.0,
        },
    }
}

struct Venue {
    exchange: Arc<Exchange>,
    alice: Arc<SimClient>,
    bob: Arc<SimClient>,
}

async fn venue_with(config: SimConfig) -> Venue {
    let _ = env_logger::try_init();
    let exchange = Exchange::with_system_clock(config).unwrap();

    let alice = exchange.open_account("alice", "alice-secret").await;
    exchange.deposit(&alice, &sym("USD"), dec!(100000)).await.unwrap();
    let bob = exchange.open_account("bob", "bob-secret").await;
    exchange.deposit(&bob, &sym("BTC"), dec!(100)).await.unwrap();

    Venue {
        alice: Arc::new(SimClient::new(exchange.clone(), alice, gateway_config())),
        bob: Arc::new(SimClient::new(exchange.clone(), bob, gateway_config())),
        exchange,
    }
}

async fn venue(mode: StreamMode) -> Venue {
    venue_with(SimConfig {
        stream_mode: mode,
        ..SimConfig::with_pairs(vec![btc_usd()])
    })
    .await
}

async fn take(feed: &mut TradeFeed, n: usize) -> Vec<TradeId> {
    let mut ids = Vec::new();
    while ids.len() < n {
        let item = tokio::time::timeout(Duration::from_secs(5), feed.next())
            .await
            .expect("feed stalled")
            .expect("feed ended early");
        ids.push(item.expect("feed failed").id);
    }
    ids
}

async fn wait_for_subscriber(exchange: &Exchange) {
    for _ in 0..200 {
        if exchange.transport().subscriber_count(&btc_usd()) > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("stream never subscribed");
}

async fn print(exchange: &Exchange, count: usize) {
    for _ in 0..count {
        exchange
            .print_trade(TradeType::Sell, &btc_usd(), dec!(50000), dec!(0.1))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_orders_lock_balances() {
    let venue = venue(StreamMode::Push).await;

    venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(40000), dec!(0.5))
        .await
        .unwrap();
    let balance = venue.alice.balance().await.unwrap();
    assert_eq!(balance[&sym("USD")], dec!(80000));

    venue
        .bob
        .trade(TradeType::Sell, &btc_usd(), dec!(60000), dec!(3))
        .await
        .unwrap();
    let balance = venue.bob.balance().await.unwrap();
    assert_eq!(balance[&sym("BTC")], dec!(97));
}

#[tokio::test]
async fn test_rejected_orders() {
    let venue = venue(StreamMode::Push).await;

    let err = venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(50000), dec!(3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::InsufficientFunds { ref currency, .. } if currency == "USD"
    ));

    let err = venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(0), dec!(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidPriceError");

    let eth_usd = Pair::from_symbols("ETH", "USD").unwrap();
    let err = venue
        .alice
        .trade(TradeType::Buy, &eth_usd, dec!(1), dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidArgument(_)));
    assert!(venue.alice.orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_distinguishes_unknown_from_closed() {
    let venue = venue(StreamMode::Push).await;

    venue
        .bob
        .trade(TradeType::Sell, &btc_usd(), dec!(50000), dec!(1))
        .await
        .unwrap();
    let filled = venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(50000), dec!(1))
        .await
        .unwrap();
    assert_eq!(venue.alice.cancel(filled).await, Ok(false));

    let open = venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(10000), dec!(1))
        .await
        .unwrap();
    assert_eq!(venue.alice.cancel(open).await, Ok(true));
    assert_eq!(venue.alice.cancel(open).await, Ok(false));

    assert!(matches!(
        venue.alice.cancel(999_999).await,
        Err(ClientError::NotFound(_))
    ));
    assert_eq!(venue.alice.balance().await.unwrap()[&sym("USD")], dec!(50000));
}

#[tokio::test]
async fn test_open_orders_never_exceed_amount() {
    let venue = venue(StreamMode::Push).await;

    let resting = venue
        .bob
        .trade(TradeType::Sell, &btc_usd(), dec!(50000), dec!(5))
        .await
        .unwrap();
    venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(50000), dec!(2))
        .await
        .unwrap();
    venue
        .bob
        .trade(TradeType::Sell, &btc_usd(), dec!(52000), dec!(1))
        .await
        .unwrap();

    let orders = venue.bob.orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.remain <= o.amount));
    let partial = orders.iter().find(|o| o.id == resting).unwrap();
    assert_eq!(partial.remain, dec!(3));
    assert_eq!(partial.amount, dec!(5));
    assert!(venue.alice.orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transactions_newest_first_and_clamped() {
    let venue = venue_with(SimConfig {
        max_transactions: 2,
        ..SimConfig::with_pairs(vec![btc_usd()])
    })
    .await;

    venue
        .bob
        .trade(TradeType::Sell, &btc_usd(), dec!(50000), dec!(2))
        .await
        .unwrap();
    for _ in 0..2 {
        venue
            .alice
            .trade(TradeType::Buy, &btc_usd(), dec!(50000), dec!(1))
            .await
            .unwrap();
    }

    let ledger = venue.alice.transactions(50).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger[0].id > ledger[1].id);
    assert_eq!(ledger[0].amount(&sym("BTC")), dec!(1));

    assert!(matches!(
        venue.alice.transactions(0).await,
        Err(ClientError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_history_pages_without_gap_or_overlap() {
    let venue = venue_with(SimConfig {
        history_page_size: 3,
        ..SimConfig::with_pairs(vec![btc_usd()])
    })
    .await;
    print(&venue.exchange, 10).await;

    let mut seen = Vec::new();
    let mut cursor = Cursor::BEGINNING;
    loop {
        let (page, next) = venue.alice.history(&btc_usd(), cursor).await.unwrap();
        assert!(page.len() <= 3);
        if page.is_empty() {
            assert_eq!(next, cursor);
            break;
        }
        seen.extend(page.iter().map(|t| t.id));
        cursor = next;
    }
    assert_eq!(seen, (1..=10).collect::<Vec<TradeId>>());
}

#[tokio::test]
async fn test_cursor_behind_retained_window_reports_gap() {
    let venue = venue_with(SimConfig {
        history_window: 3,
        ..SimConfig::with_pairs(vec![btc_usd()])
    })
    .await;
    print(&venue.exchange, 5).await;

    assert_eq!(
        venue.alice.history(&btc_usd(), Cursor::after(1)).await,
        Err(ClientError::HistoryGap { since: 1, evicted: 2 })
    );
    let (trades, _) = venue.alice.history(&btc_usd(), Cursor::after(2)).await.unwrap();
    assert_eq!(trades.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 4, 5]);
    let (trades, _) = venue.alice.history(&btc_usd(), Cursor::BEGINNING).await.unwrap();
    assert_eq!(trades.len(), 3);
}

#[tokio::test]
async fn test_huge_order_is_rejected_not_panicking() {
    let venue = venue(StreamMode::Push).await;
    let err = venue
        .alice
        .trade(
            TradeType::Buy,
            &btc_usd(),
            dec!(10000000000000000000),
            dec!(100000000000000),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidPriceError");
    assert!(venue.alice.orders().await.unwrap().is_empty());
    assert_eq!(venue.alice.balance().await.unwrap()[&sym("USD")], dec!(100000));
}

#[tokio::test]
async fn test_orderbook_sides_are_ordered() {
    let venue = venue(StreamMode::Push).await;
    for price in [dec!(99), dec!(98), dec!(99), dec!(97)] {
        venue
            .alice
            .trade(TradeType::Buy, &btc_usd(), price, dec!(1))
            .await
            .unwrap();
    }
    for price in [dec!(101), dec!(103), dec!(101)] {
        venue
            .bob
            .trade(TradeType::Sell, &btc_usd(), price, dec!(1))
            .await
            .unwrap();
    }

    let book = venue.alice.orderbook(&btc_usd(), 10).await.unwrap();
    assert!(book.is_well_formed());
    let bids: Vec<_> = book.bids.iter().map(|l| (l.price, l.amount)).collect();
    assert_eq!(bids, vec![(dec!(99), dec!(2)), (dec!(98), dec!(1)), (dec!(97), dec!(1))]);
    let asks: Vec<_> = book.asks.iter().map(|l| l.price).collect();
    assert_eq!(asks, vec![dec!(101), dec!(103)]);

    let shallow = venue.alice.orderbook(&btc_usd(), 1).await.unwrap();
    assert_eq!(shallow.bids.len(), 1);
    assert_eq!(shallow.asks.len(), 1);
    assert!(matches!(
        venue.alice.orderbook(&btc_usd(), 0).await,
        Err(ClientError::InvalidArgument(_))
    ));

    let ticker = venue.alice.ticker(&btc_usd()).await.unwrap();
    assert_eq!(ticker.bid, Some(dec!(99)));
    assert_eq!(ticker.ask, Some(dec!(101)));
    assert_eq!(ticker.last, None);
}

#[tokio::test]
async fn test_reads_retry_but_trades_do_not() {
    let venue = venue(StreamMode::Push).await;

    venue.exchange.fail_next_requests(2);
    assert!(venue.alice.balance().await.is_ok());

    venue.exchange.fail_next_requests(1);
    let err = venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(100), dec!(1))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(venue.alice.orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_push_feed_exactly_once_across_disconnect() {
    let venue = venue(StreamMode::Push).await;
    print(&venue.exchange, 3).await;

    let mut feed = spawn_stream(
        venue.alice.clone(),
        btc_usd(),
        Cursor::BEGINNING,
        &FeedConfig::default(),
    );
    assert_eq!(take(&mut feed, 3).await, vec![1, 2, 3]);

    wait_for_subscriber(&venue.exchange).await;
    print(&venue.exchange, 1).await;
    venue.exchange.disconnect_streams();
    print(&venue.exchange, 2).await;
    assert_eq!(take(&mut feed, 3).await, vec![4, 5, 6]);

    wait_for_subscriber(&venue.exchange).await;
    venue
        .bob
        .trade(TradeType::Sell, &btc_usd(), dec!(50000), dec!(1))
        .await
        .unwrap();
    venue
        .alice
        .trade(TradeType::Buy, &btc_usd(), dec!(50000), dec!(1))
        .await
        .unwrap();
    assert_eq!(take(&mut feed, 1).await, vec![7]);

    feed.cancel().await;
    assert_eq!(venue.exchange.transport().subscriber_count(&btc_usd()), 0);
}

#[tokio::test]
async fn test_poll_feed_resumes_from_watermark() {
    let venue = venue(StreamMode::Poll).await;
    print(&venue.exchange, 5).await;

    let mut feed = spawn_stream(
        venue.alice.clone(),
        btc_usd(),
        Cursor::after(2),
        &FeedConfig::default(),
    );
    assert_eq!(take(&mut feed, 3).await, vec![3, 4, 5]);

    venue.exchange.fail_next_requests(6);
    print(&venue.exchange, 2).await;
    assert_eq!(take(&mut feed, 2).await, vec![6, 7]);
    feed.cancel().await;
}

#[tokio::test]
async fn test_revoked_key_ends_feed() {
    let venue = venue(StreamMode::Push).await;
    print(&venue.exchange, 1).await;

    let mut feed = spawn_stream(
        venue.alice.clone(),
        btc_usd(),
        Cursor::BEGINNING,
        &FeedConfig::default(),
    );
    assert_eq!(take(&mut feed, 1).await, vec![1]);
    wait_for_subscriber(&venue.exchange).await;

    venue.exchange.revoke("alice").await;
    venue.exchange.disconnect_streams();

    let terminal = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .unwrap();
    assert!(matches!(terminal, Some(Err(ClientError::Auth(_)))));
    assert!(feed.next().await.is_none());
}

#[tokio::test]
async fn test_slow_consumer_overflows_with_fail_policy() {
    let venue = venue(StreamMode::Push).await;
    print(&venue.exchange, 5).await;

    let mut feed = spawn_stream(
        venue.alice.clone(),
        btc_usd(),
        Cursor::BEGINNING,
        &FeedConfig {
            capacity: 2,
            overflow: OverflowPolicy::Fail,
        },
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(take(&mut feed, 2).await, vec![1, 2]);
    let terminal = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .unwrap();
    assert_eq!(terminal, Some(Err(ClientError::Overflow { capacity: 2 })));
    assert!(feed.next().await.is_none());
}

async fn expect_gap(mut feed: TradeFeed, delivered: Vec<TradeId>) {
    assert_eq!(take(&mut feed, delivered.len()).await, delivered);
    let terminal = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .unwrap();
    assert!(matches!(terminal, Some(Err(ClientError::HistoryGap { .. }))));
    assert!(feed.next().await.is_none());
}

#[tokio::test]
async fn test_poll_feed_behind_window_ends_with_gap() {
    let venue = venue_with(SimConfig {
        stream_mode: StreamMode::Poll,
        history_window: 3,
        ..SimConfig::with_pairs(vec![btc_usd()])
    })
    .await;
    print(&venue.exchange, 5).await;

    let feed = spawn_stream(
        venue.alice.clone(),
        btc_usd(),
        Cursor::after(1),
        &FeedConfig::default(),
    );
    expect_gap(feed, vec![]).await;
}

#[tokio::test]
async fn test_push_feed_reconnecting_behind_window_ends_with_gap() {
    let venue = venue_with(SimConfig {
        history_window: 3,
        ..SimConfig::with_pairs(vec![btc_usd()])
    })
    .await;
    print(&venue.exchange, 1).await;

    // Block the reconnect until the log has moved past the watermark
    let config = GatewayConfig {
        stream: StreamConfig {
            reconnect_initial_delay_ms: 300,
            reconnect_max_delay_ms: 300,
            ..gateway_config().stream
        },
        ..gateway_config()
    };
    let credentials = venue.exchange.open_account("carol", "carol-secret").await;
    let carol = Arc::new(SimClient::new(venue.exchange.clone(), credentials, config));

    let mut feed = spawn_stream(carol, btc_usd(), Cursor::BEGINNING, &FeedConfig::default());
    assert_eq!(take(&mut feed, 1).await, vec![1]);
    wait_for_subscriber(&venue.exchange).await;

    venue.exchange.disconnect_streams();
    print(&venue.exchange, 5).await;
    expect_gap(feed, vec![]).await;
}
