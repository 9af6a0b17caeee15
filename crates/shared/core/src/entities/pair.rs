use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::Symbol;
use crate::error::{CodecError, CodecResult};

/// Display separator: `BTC/USD`
const DISPLAY_SEPARATOR: char = '/';

/// Wire separator: `btc_usd`
const WIRE_SEPARATOR: char = '_';

/// A market: `target` priced in `base` (BTC priced in USD is BTC/USD)
///
/// Two textual projections exist and both are exact exchange conventions:
/// - display form `TARGET/BASE`, used for command arguments and human output
/// - wire form `target_base`, lowercase, used in exchange requests
///
/// On the wire a pair serializes as its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    target: Symbol,
    base: Symbol,
}

impl Pair {
    pub fn new(target: Symbol, base: Symbol) -> Self {
        Self { target, base }
    }

    /// Build from two symbol strings, validating both
    pub fn from_symbols(target: &str, base: &str) -> CodecResult<Self> {
        Ok(Self::new(Symbol::new(target)?, Symbol::new(base)?))
    }

    /// The currency being bought or sold
    pub fn target(&self) -> &Symbol {
        &self.target
    }

    /// The currency the target is priced in
    pub fn base(&self) -> &Symbol {
        &self.base
    }

    /// Wire notation: lowercase `target_base`
    pub fn to_wire(&self) -> String {
        format!("{}{}{}", self.target, WIRE_SEPARATOR, self.base).to_ascii_lowercase()
    }

    /// Decode wire notation (`btc_usd`)
    pub fn from_wire(text: &str) -> CodecResult<Self> {
        let (target, base) = split_once_exact(text, WIRE_SEPARATOR)?;
        Self::from_symbols(target, base)
    }
}

/// Split on a separator that must occur exactly once
fn split_once_exact(text: &str, separator: char) -> CodecResult<(&str, &str)> {
    let mut parts = text.split(separator);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), None) => Ok((first, second)),
        _ => Err(CodecError::Format(format!(
            "expected exactly one '{}' in pair {:?}",
            separator, text
        ))),
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.target, DISPLAY_SEPARATOR, self.base)
    }
}

/// Parse display notation (`BTC/USD`, any case)
impl FromStr for Pair {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, base) = split_once_exact(s, DISPLAY_SEPARATOR)?;
        Self::from_symbols(target, base)
    }
}

impl Serialize for Pair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Pair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Pair::from_wire(&text).map_err(de::Error::custom)
    }
}
