use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Quantity value - uses Decimal for precision
pub type Quantity = Decimal;

/// Timestamp in UTC, one-second resolution on the wire
pub type Timestamp = DateTime<Utc>;

/// Exchange-assigned order identifier
pub type OrderId = i64;

/// Exchange-assigned trade identifier, increasing per exchange
pub type TradeId = i64;

/// Exchange-assigned ledger entry identifier
pub type TransactionId = i64;

/// Build a timestamp from epoch seconds.
/// Out-of-range values collapse to the Unix epoch.
pub fn from_epoch_secs(secs: i64) -> Timestamp {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Drop sub-second precision, matching what the wire can carry
pub fn truncate_to_secs(ts: Timestamp) -> Timestamp {
    from_epoch_secs(ts.timestamp())
}

/// Render like C's `%.{digits}g`: round to `digits` significant digits,
/// drop trailing zeros, and switch to exponent form when the decimal
/// exponent is below -4 or at least `digits`.
pub fn format_significant(value: Decimal, digits: u32) -> String {
    if value.is_zero() {
        return "0".to_string();
    }
    let rounded = value.round_sf(digits).unwrap_or(value).normalize();
    let mantissa = rounded.mantissa().unsigned_abs();
    let exponent = mantissa.ilog10() as i64 - rounded.scale() as i64;

    if exponent < -4 || exponent >= digits as i64 {
        let all = mantissa.to_string();
        let significant = all.trim_end_matches('0');
        let (lead, rest) = significant.split_at(1);
        let sign = if rounded.is_sign_negative() { "-" } else { "" };
        let fraction = if rest.is_empty() {
            String::new()
        } else {
            format!(".{}", rest)
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{}{}{}e{}{:02}", sign, lead, fraction, exp_sign, exponent.abs())
    } else {
        rounded.to_string()
    }
}
