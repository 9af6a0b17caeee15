mod order;
mod orderbook;
mod pair;
mod symbol;
mod ticker;
mod trade;
mod trade_type;
mod transaction;

pub use order::Order;
pub use orderbook::{BookLevel, Orderbook};
pub use pair::Pair;
pub use symbol::Symbol;
pub use ticker::Ticker;
pub use trade::Trade;
pub use trade_type::TradeType;
pub use transaction::Transaction;

/// Render format shared by orders and ledger entries
pub(crate) const DATE_TIME_FORMAT: &str = "%Y%m%d %H:%M:%S";

/// Render format for trade prints
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S";
