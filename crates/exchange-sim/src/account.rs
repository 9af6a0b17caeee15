//! Per-account balances with order locks

use coincross_core::{Symbol, Transaction};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

use crate::error::{ExchangeError, Result};

/// Balance of one currency
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssetBalance {
    /// Free to trade or withdraw
    pub available: Decimal,
    /// Reserved by open orders
    pub locked: Decimal,
}

impl AssetBalance {
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    secret: String,
    balances: HashMap<Symbol, AssetBalance>,
    /// Oldest first, at most `ledger_capacity` entries
    ledger: VecDeque<Transaction>,
    ledger_capacity: usize,
}

impl Account {
    pub fn new(secret: impl Into<String>, ledger_capacity: usize) -> Self {
        Self {
            secret: secret.into(),
            balances: HashMap::new(),
            ledger: VecDeque::new(),
            ledger_capacity: ledger_capacity.max(1),
        }
    }

    pub fn secret_matches(&self, secret: &str) -> bool {
        self.secret == secret
    }

    pub fn balance(&self, asset: &Symbol) -> AssetBalance {
        self.balances.get(asset).copied().unwrap_or_default()
    }

    pub fn available(&self) -> HashMap<Symbol, Decimal> {
        self.balances
            .iter()
            .map(|(asset, balance)| (asset.clone(), balance.available))
            .collect()
    }

    /// Room left before the asset's total balance leaves `Decimal` range
    pub fn can_credit(&self, asset: &Symbol, amount: Decimal) -> bool {
        self.balance(asset).total().checked_add(amount).is_some()
    }

    pub fn deposit(&mut self, asset: &Symbol, amount: Decimal) {
        self.balances.entry(asset.clone()).or_default().available += amount;
    }

    /// Reserve funds for an order
    pub fn lock(&mut self, asset: &Symbol, amount: Decimal) -> Result<()> {
        let balance = self.balances.entry(asset.clone()).or_default();
        if balance.available < amount {
            return Err(ExchangeError::InsufficientFunds {
                currency: asset.to_string(),
                required: amount,
                available: balance.available,
            });
        }
        balance.available -= amount;
        balance.locked += amount;
        Ok(())
    }

    /// Release reserved funds (cancel or price improvement)
    pub fn unlock(&mut self, asset: &Symbol, amount: Decimal) {
        if let Some(balance) = self.balances.get_mut(asset) {
            let released = amount.min(balance.locked);
            balance.locked -= released;
            balance.available += released;
        }
    }

    /// Pay out of reserved funds on a fill
    pub fn spend_locked(&mut self, asset: &Symbol, amount: Decimal) {
        if let Some(balance) = self.balances.get_mut(asset) {
            balance.locked -= amount.min(balance.locked);
        }
    }

    pub fn record(&mut self, transaction: Transaction) {
        self.ledger.push_back(transaction);
        while self.ledger.len() > self.ledger_capacity {
            self.ledger.pop_front();
        }
    }

    /// Latest `limit` ledger entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<Transaction> {
        self.ledger.iter().rev().take(limit).cloned().collect()
    }
}
