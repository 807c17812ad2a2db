//! value-transfer collaborator
//!
//! the pool never holds balances itself. deposits, refunds and payouts go
//! through a [`Ledger`] bound either to the native currency or to a single
//! fungible token. every failure is surfaced to the pool, which treats it as
//! fatal for the whole mix.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::Address;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// moves external value between callers and the pool
pub trait Ledger {
    /// take `amount` from `from` into pool custody
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), TransferError>;

    /// send `amount` from pool custody to `to`
    fn push(&mut self, to: &Address, amount: u128) -> Result<(), TransferError>;
}

impl<L: Ledger + ?Sized> Ledger for &mut L {
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), TransferError> {
        (**self).pull(from, amount)
    }

    fn push(&mut self, to: &Address, amount: u128) -> Result<(), TransferError> {
        (**self).push(to, amount)
    }
}

/// in-memory ledger for tests and simulations
///
/// tracks account balances plus the pool's own custody balance.
/// accounts can be frozen so transfers to or from them fail.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Address, u128>,
    custody: u128,
    frozen: HashSet<Address>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// set an account balance
    pub fn fund(&mut self, account: Address, amount: u128) {
        self.balances.insert(account, amount);
    }

    /// credit pool custody directly (attached native value)
    pub fn credit_custody(&mut self, amount: u128) {
        self.custody = self.custody.saturating_add(amount);
    }

    /// make every transfer touching `account` fail
    pub fn freeze(&mut self, account: Address) {
        self.frozen.insert(account);
    }

    pub fn unfreeze(&mut self, account: &Address) {
        self.frozen.remove(account);
    }

    pub fn balance(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// value currently held by the pool
    pub fn custody(&self) -> u128 {
        self.custody
    }

    fn check_frozen(&self, account: &Address) -> Result<(), TransferError> {
        if self.frozen.contains(account) {
            return Err(TransferError::Rejected(format!("account {account:?} is frozen")));
        }
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), TransferError> {
        self.check_frozen(from)?;
        let have = self.balance(from);
        let remaining = have
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientBalance { have, need: amount })?;
        self.balances.insert(*from, remaining);
        self.custody += amount;
        Ok(())
    }

    fn push(&mut self, to: &Address, amount: u128) -> Result<(), TransferError> {
        self.check_frozen(to)?;
        self.custody = self
            .custody
            .checked_sub(amount)
            .ok_or(TransferError::InsufficientBalance { have: self.custody, need: amount })?;
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(seed: u8) -> Address {
        Address::repeat_byte(seed)
    }

    #[test]
    fn test_pull_and_push() {
        let mut ledger = InMemoryLedger::new();
        ledger.fund(account(1), 500);

        ledger.pull(&account(1), 200).unwrap();
        assert_eq!(ledger.balance(&account(1)), 300);
        assert_eq!(ledger.custody(), 200);

        ledger.push(&account(2), 150).unwrap();
        assert_eq!(ledger.balance(&account(2)), 150);
        assert_eq!(ledger.custody(), 50);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.fund(account(1), 10);

        let err = ledger.pull(&account(1), 11).unwrap_err();
        assert_eq!(err, TransferError::InsufficientBalance { have: 10, need: 11 });

        // custody is empty, nothing to pay out
        assert!(ledger.push(&account(1), 1).is_err());
        assert_eq!(ledger.balance(&account(1)), 10);
    }

    #[test]
    fn test_frozen_account() {
        let mut ledger = InMemoryLedger::new();
        ledger.credit_custody(100);
        ledger.freeze(account(3));

        assert!(matches!(
            ledger.push(&account(3), 10),
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(ledger.custody(), 100);

        ledger.unfreeze(&account(3));
        ledger.push(&account(3), 10).unwrap();
        assert_eq!(ledger.balance(&account(3)), 10);
    }
}
