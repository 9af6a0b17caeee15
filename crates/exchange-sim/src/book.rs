//! Limit order book for one pair, price-time priority

use coincross_core::{BookLevel, Order, OrderId, Orderbook, Pair, Price, Quantity, TradeType};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Price key for BTreeMap ordering
/// For bids: reversed so the best (highest) price comes first
/// For asks: natural order (ascending)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PriceKey {
    price: Price,
    is_bid: bool,
}

impl PriceKey {
    fn new(side: TradeType, price: Price) -> Self {
        PriceKey {
            price,
            is_bid: side.is_buy(),
        }
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.is_bid {
            other.price.cmp(&self.price)
        } else {
            self.price.cmp(&other.price)
        }
    }
}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Order resting in the book with the account that owns it
#[derive(Debug, Clone)]
pub struct Resting {
    pub order: Order,
    pub owner: String,
}

/// One execution against a resting order, at the maker's price
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub maker_id: OrderId,
    pub maker_owner: String,
    pub price: Price,
    pub amount: Quantity,
    /// Maker has nothing left and has left the book
    pub maker_done: bool,
}

#[derive(Debug)]
pub struct OrderBook {
    pair: Pair,
    bids: BTreeMap<PriceKey, VecDeque<Resting>>,
    asks: BTreeMap<PriceKey, VecDeque<Resting>>,
    /// Quick lookup for orders by ID
    index: HashMap<OrderId, (TradeType, Price)>,
}

impl OrderBook {
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }

    fn side_mut(&mut self, side: TradeType) -> &mut BTreeMap<PriceKey, VecDeque<Resting>> {
        match side {
            TradeType::Buy => &mut self.bids,
            TradeType::Sell => &mut self.asks,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first_key_value().map(|(k, _)| k.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(k, _)| k.price)
    }

    /// Rest an order that did not fully match
    pub fn add(&mut self, order: Order, owner: String) {
        let key = PriceKey::new(order.side, order.price);
        self.index.insert(order.id, (order.side, order.price));
        self.side_mut(order.side)
            .entry(key)
            .or_default()
            .push_back(Resting { order, owner });
    }

    pub fn remove(&mut self, order_id: OrderId) -> Option<Resting> {
        let (side, price) = self.index.remove(&order_id)?;
        let key = PriceKey::new(side, price);
        let levels = self.side_mut(side);
        let queue = levels.get_mut(&key)?;
        let pos = queue.iter().position(|r| r.order.id == order_id)?;
        let resting = queue.remove(pos);
        if queue.is_empty() {
            levels.remove(&key);
        }
        resting
    }

    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let (side, price) = self.index.get(&order_id)?;
        let levels = match side {
            TradeType::Buy => &self.bids,
            TradeType::Sell => &self.asks,
        };
        levels
            .get(&PriceKey::new(*side, *price))?
            .iter()
            .map(|r| &r.order)
            .find(|o| o.id == order_id)
    }

    /// Match an incoming order against the opposite side.
    /// The taker's `remain` is reduced by everything filled.
    pub fn match_order(&mut self, taker: &mut Order) -> Vec<Fill> {
        let mut fills = Vec::new();
        let limit = taker.price;
        let side = taker.side;

        while !taker.is_filled() {
            let opposite = self.side_mut(side.opposite());
            let Some(mut entry) = opposite.first_entry() else {
                break;
            };
            let level_price = entry.key().price;
            let crosses = match side {
                TradeType::Buy => level_price <= limit,
                TradeType::Sell => level_price >= limit,
            };
            if !crosses {
                break;
            }

            let queue = entry.get_mut();
            let mut done = Vec::new();
            while let Some(maker) = queue.front_mut() {
                let amount = taker.fill(maker.order.remain);
                maker.order.fill(amount);
                let maker_done = maker.order.is_filled();
                fills.push(Fill {
                    maker_id: maker.order.id,
                    maker_owner: maker.owner.clone(),
                    price: level_price,
                    amount,
                    maker_done,
                });
                if maker_done {
                    done.push(maker.order.id);
                    queue.pop_front();
                }
                if taker.is_filled() {
                    break;
                }
            }
            if queue.is_empty() {
                entry.remove();
            }
            for id in done {
                self.index.remove(&id);
            }
        }
        fills
    }

    /// Aggregated snapshot with at most `depth` levels per side
    pub fn snapshot(&self, depth: usize) -> Orderbook {
        fn levels<'a>(
            side: impl Iterator<Item = (&'a PriceKey, &'a VecDeque<Resting>)>,
            depth: usize,
        ) -> Vec<BookLevel> {
            side.take(depth)
                .map(|(key, queue)| {
                    BookLevel::new(key.price, queue.iter().map(|r| r.order.remain).sum())
                })
                .collect()
        }
        Orderbook::from_levels(levels(self.asks.iter(), depth), levels(self.bids.iter(), depth), depth)
    }

    /// Open orders owned by `owner`
    pub fn orders_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        self.bids
            .values()
            .chain(self.asks.values())
            .flatten()
            .filter(move |r| r.owner == owner)
            .map(|r| &r.order)
    }

    pub fn order_count(&self) -> usize {
        self.index.len()
    }
}
