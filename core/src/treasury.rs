//! Native value transfers out of the ledger
//!
//! The ledger never moves value itself. Refunds, deposit withdrawals and fee
//! withdrawals go through an injected [`ValueTransfer`], after the ledger has already
//! updated its own books. A failed transfer makes the ledger roll those updates back.

use std::collections::{HashMap, HashSet};
use ethers::types::Address;
use log::debug;

use crate::error::{LedgerError, Result};

/// Sends native value to an account
#[cfg_attr(test, mockall::automock)]
pub trait ValueTransfer {
    /// Transfer `amount` wei to `to`
    ///
    /// An error means nothing was transferred.
    fn transfer(&mut self, to: Address, amount: u128) -> Result<()>;
}

/// In-memory transfer backend that records credited balances
#[derive(Debug, Clone, Default)]
pub struct InMemoryTreasury {
    credited: HashMap<Address, u128>,
    rejected: HashSet<Address>,
}

impl InMemoryTreasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every future transfer to `account`, like a contract without a payable fallback
    pub fn reject(&mut self, account: Address) {
        self.rejected.insert(account);
    }

    /// Accept transfers to `account` again
    pub fn accept(&mut self, account: Address) {
        self.rejected.remove(&account);
    }

    /// Total value credited to `account`
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.credited.get(account).copied().unwrap_or(0)
    }
}

impl ValueTransfer for InMemoryTreasury {
    fn transfer(&mut self, to: Address, amount: u128) -> Result<()> {
        if self.rejected.contains(&to) {
            return Err(LedgerError::TransferFailed(format!("recipient {:?} rejected the transfer", to)));
        }

        let balance = self.credited.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(LedgerError::ArithmeticOverflow)?;

        debug!("Transferred {} wei to {:?}", amount, to);
        Ok(())
    }
}
