//! Economy ledger: two account balances plus an append-only transaction log.
//!
//! Balances are only ever mutated through [`Ledger::deposit`],
//! [`Ledger::withdraw`] and [`Ledger::transfer`]. Every successful mutation
//! writes exactly one [`LedgerEntry`]; every rejected one writes nothing.
//! The log is bounded and kept most-recent-first; the oldest entries fall off.
//!
//! Invariants:
//! 1. `balance(account) >= 0` for both accounts at all times
//! 2. A transfer either moves exactly `amount` or changes nothing

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{Account, Cents};
use crate::time::{Millis, Window};

/// Default number of entries retained in the log.
pub const DEFAULT_LEDGER_CAPACITY: usize = 300;

/// Spending/earning category recorded on each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryCategory {
    Income,
    Rent,
    Food,
    Home,
    Fun,
    Fees,
    Transfer,
    Other,
}

/// Immutable record of one balance change. Positive amounts are credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: u64,
    pub timestamp: Millis,
    pub description: String,
    pub amount_cents: Cents,
    pub account: Account,
    pub category: EntryCategory,
}

impl LedgerEntry {
    pub fn is_credit(&self) -> bool {
        self.amount_cents > 0
    }
}

/// Why a ledger operation was refused. A refused operation never mutates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Cents),
    #[error("cannot transfer from an account to itself")]
    SameAccount,
    #[error("insufficient funds in {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: Account,
        balance: Cents,
        requested: Cents,
    },
    #[error("could not read an amount from {0:?}")]
    UnparsableAmount(String),
}

/// Snapshot of both balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub checking_cents: Cents,
    pub savings_cents: Cents,
}

impl Balances {
    pub fn new(checking_cents: Cents, savings_cents: Cents) -> Self {
        Self {
            checking_cents,
            savings_cents,
        }
    }

    pub fn get(&self, account: Account) -> Cents {
        match account {
            Account::Checking => self.checking_cents,
            Account::Savings => self.savings_cents,
        }
    }

    fn get_mut(&mut self, account: Account) -> &mut Cents {
        match account {
            Account::Checking => &mut self.checking_cents,
            Account::Savings => &mut self.savings_cents,
        }
    }

    /// Saturates: each account may individually hold up to `Cents::MAX`.
    pub fn total(&self) -> Cents {
        self.checking_cents.saturating_add(self.savings_cents)
    }
}

/// The household ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    balances: Balances,
    /// Most recent first.
    entries: VecDeque<LedgerEntry>,
    capacity: usize,
    next_id: u64,
}

impl Ledger {
    /// Open a ledger with starting balances. Negative openings are clamped to zero.
    pub fn new(checking_cents: Cents, savings_cents: Cents, capacity: usize) -> Self {
        Self {
            balances: Balances::new(checking_cents.max(0), savings_cents.max(0)),
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    pub fn balance(&self, account: Account) -> Cents {
        self.balances.get(account)
    }

    pub fn balances(&self) -> Balances {
        self.balances
    }

    /// Combined funds across both accounts.
    pub fn total(&self) -> Cents {
        self.balances.total()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All retained entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `n` most recent entries.
    pub fn recent(&self, n: usize) -> Vec<LedgerEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    /// Credit `account`. Non-positive amounts are silently ignored.
    /// Returns whether an entry was written.
    pub fn deposit(
        &mut self,
        account: Account,
        amount: Cents,
        description: impl Into<String>,
        category: EntryCategory,
        at: Millis,
    ) -> bool {
        if amount <= 0 {
            return false;
        }
        let slot = self.balances.get_mut(account);
        let Some(updated) = slot.checked_add(amount) else {
            return false;
        };
        *slot = updated;
        self.record(account, amount, description.into(), category, at);
        true
    }

    /// Debit `account`. Fails without side effects when the amount is not
    /// positive or exceeds the balance.
    pub fn withdraw(
        &mut self,
        account: Account,
        amount: Cents,
        description: impl Into<String>,
        category: EntryCategory,
        at: Millis,
    ) -> Result<(), LedgerError> {
        self.check_withdrawal(account, amount)?;
        *self.balances.get_mut(account) -= amount;
        self.record(account, -amount, description.into(), category, at);
        Ok(())
    }

    /// Move `amount` from one account to the other as a withdraw/deposit
    /// pair tagged [`EntryCategory::Transfer`]. All checks run before
    /// anything is written, so a failure leaves both balances untouched.
    pub fn transfer(
        &mut self,
        from: Account,
        to: Account,
        amount: Cents,
        at: Millis,
    ) -> Result<(), LedgerError> {
        if from == to {
            return Err(LedgerError::SameAccount);
        }
        self.check_withdrawal(from, amount)?;
        if self.balance(to).checked_add(amount).is_none() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.withdraw(
            from,
            amount,
            format!("Transfer to {}", to),
            EntryCategory::Transfer,
            at,
        )?;
        self.deposit(
            to,
            amount,
            format!("Transfer from {}", from),
            EntryCategory::Transfer,
            at,
        );
        Ok(())
    }

    /// Sum of entry amounts whose timestamp falls in `window` (inclusive).
    pub fn net_within(&self, window: Window) -> Cents {
        self.entries
            .iter()
            .filter(|e| window.contains(e.timestamp))
            .fold(0, |net: Cents, e| net.saturating_add(e.amount_cents))
    }

    fn check_withdrawal(&self, account: Account, amount: Cents) -> Result<(), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let balance = self.balance(account);
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account,
                balance,
                requested: amount,
            });
        }
        Ok(())
    }

    fn record(
        &mut self,
        account: Account,
        amount_cents: Cents,
        description: String,
        category: EntryCategory,
        timestamp: Millis,
    ) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(LedgerEntry {
            id,
            timestamp,
            description,
            amount_cents,
            account,
            category,
        });
        self.entries.truncate(self.capacity);
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(0, 0, DEFAULT_LEDGER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starter() -> Ledger {
        Ledger::new(5000, 2000, DEFAULT_LEDGER_CAPACITY)
    }

    #[test]
    fn test_deposit_credits_and_logs() {
        let mut ledger = starter();
        assert!(ledger.deposit(Account::Checking, 125, "Collected coins", EntryCategory::Income, 10));
        assert_eq!(ledger.balance(Account::Checking), 5125);
        let entry = ledger.entries().next().unwrap();
        assert_eq!(entry.amount_cents, 125);
        assert_eq!(entry.category, EntryCategory::Income);
        assert!(entry.is_credit());
    }

    #[test]
    fn test_total_saturates_on_huge_balances() {
        let mut ledger = Ledger::new(5000, 2000, 10);
        assert!(ledger.deposit(Account::Savings, Cents::MAX - 2000, "Jackpot", EntryCategory::Income, 1));
        assert_eq!(ledger.balance(Account::Savings), Cents::MAX);
        assert_eq!(ledger.total(), Cents::MAX);
        assert_eq!(ledger.balances().total(), Cents::MAX);
        assert!(ledger.deposit(Account::Checking, Cents::MAX - 5000, "Jackpot", EntryCategory::Income, 2));
        assert_eq!(ledger.net_within(Window::new(0, 10)), Cents::MAX);
    }

    #[test]
    fn test_deposit_ignores_non_positive() {
        let mut ledger = starter();
        assert!(!ledger.deposit(Account::Savings, 0, "nothing", EntryCategory::Income, 0));
        assert!(!ledger.deposit(Account::Savings, -50, "negative", EntryCategory::Income, 0));
        assert_eq!(ledger.balance(Account::Savings), 2000);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_withdraw_overdraft_refused() {
        let mut ledger = starter();
        let err = ledger
            .withdraw(Account::Checking, 6000, "TV", EntryCategory::Fun, 0)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account: Account::Checking,
                balance: 5000,
                requested: 6000
            }
        );
        assert_eq!(ledger.balance(Account::Checking), 5000);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_withdraw_exact_balance() {
        let mut ledger = starter();
        ledger
            .withdraw(Account::Savings, 2000, "Bike", EntryCategory::Other, 0)
            .unwrap();
        assert_eq!(ledger.balance(Account::Savings), 0);
        assert_eq!(ledger.entries().next().unwrap().amount_cents, -2000);
    }

    #[test]
    fn test_transfer_moves_exact_amount() {
        let mut ledger = starter();
        ledger.transfer(Account::Savings, Account::Checking, 1000, 5).unwrap();
        assert_eq!(ledger.balance(Account::Savings), 1000);
        assert_eq!(ledger.balance(Account::Checking), 6000);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.entries().all(|e| e.category == EntryCategory::Transfer));
        let descriptions: Vec<_> = ledger.entries().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Transfer from savings", "Transfer to checking"]);
    }

    #[test]
    fn test_transfer_same_account_rejected() {
        let mut ledger = starter();
        assert_eq!(
            ledger.transfer(Account::Checking, Account::Checking, 10, 0),
            Err(LedgerError::SameAccount)
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_transfer_insufficient_leaves_both_untouched() {
        let mut ledger = starter();
        assert!(ledger.transfer(Account::Savings, Account::Checking, 2001, 0).is_err());
        assert_eq!(ledger.balances(), Balances::new(5000, 2000));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_log_is_bounded_most_recent_first() {
        let mut ledger = Ledger::new(0, 0, 3);
        for i in 1..=5 {
            ledger.deposit(Account::Checking, i, format!("coin {}", i), EntryCategory::Income, i);
        }
        let amounts: Vec<_> = ledger.entries().map(|e| e.amount_cents).collect();
        assert_eq!(amounts, vec![5, 4, 3]);
        // Evicted entries do not change the balance
        assert_eq!(ledger.balance(Account::Checking), 15);
    }

    #[test]
    fn test_net_within_window() {
        let mut ledger = starter();
        ledger.deposit(Account::Checking, 100, "early", EntryCategory::Income, 5);
        ledger.deposit(Account::Checking, 200, "inside", EntryCategory::Income, 15);
        ledger
            .withdraw(Account::Checking, 50, "inside", EntryCategory::Food, 20)
            .unwrap();
        ledger.deposit(Account::Checking, 400, "late", EntryCategory::Income, 31);
        assert_eq!(ledger.net_within(Window::new(10, 30)), 150);
    }
}
