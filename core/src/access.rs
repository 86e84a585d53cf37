//! Access and pause control
//!
//! The owner is a permanent pauser and the only account that manages the pauser set.
//! Any pauser can move the ledger between `Active` and `Paused`.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use ethers::types::Address;

use crate::error::{LedgerError, Result};

/// Operating state of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseState {
    /// Mutating entry points accepted
    Active,

    /// Mutating entry points rejected; refunds and withdrawals still work
    Paused,
}

/// Owner, pauser set, pause state and testing flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    pausers: BTreeSet<Address>,
    state: PauseState,
    testing_mode: bool,
}

impl AccessControl {
    /// Create access control with `owner` as the only pauser
    pub fn new(owner: Address, testing_mode: bool) -> Self {
        AccessControl {
            owner,
            pausers: BTreeSet::from([owner]),
            state: PauseState::Active,
            testing_mode,
        }
    }

    /// Ledger owner
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Current pause state
    pub fn state(&self) -> PauseState {
        self.state
    }

    /// Whether the ledger is paused
    pub fn is_paused(&self) -> bool {
        self.state == PauseState::Paused
    }

    /// Whether `account` is a pauser
    pub fn is_pauser(&self, account: &Address) -> bool {
        self.pausers.contains(account)
    }

    /// Whether debug-only entry points are enabled
    pub fn testing_mode(&self) -> bool {
        self.testing_mode
    }

    /// Reject callers other than the owner
    pub fn require_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(LedgerError::NotOwner(caller));
        }
        Ok(())
    }

    /// Reject callers outside the pauser set
    pub fn require_pauser(&self, caller: Address) -> Result<()> {
        if !self.is_pauser(&caller) {
            return Err(LedgerError::NotPauser(caller));
        }
        Ok(())
    }

    /// Reject calls while paused
    pub fn require_not_paused(&self) -> Result<()> {
        if self.is_paused() {
            return Err(LedgerError::Paused);
        }
        Ok(())
    }

    /// Reject calls outside testing mode
    pub fn require_testing(&self) -> Result<()> {
        if !self.testing_mode {
            return Err(LedgerError::TestingModeDisabled);
        }
        Ok(())
    }

    /// Active -> Paused
    pub fn pause(&mut self, caller: Address) -> Result<()> {
        self.require_pauser(caller)?;
        if self.is_paused() {
            return Err(LedgerError::AlreadyPaused);
        }
        self.state = PauseState::Paused;
        Ok(())
    }

    /// Paused -> Active
    pub fn unpause(&mut self, caller: Address) -> Result<()> {
        self.require_pauser(caller)?;
        if !self.is_paused() {
            return Err(LedgerError::NotPaused);
        }
        self.state = PauseState::Active;
        Ok(())
    }

    /// Add a pauser (owner only)
    pub fn add_pauser(&mut self, caller: Address, account: Address) -> Result<()> {
        self.require_owner(caller)?;
        if account.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        if !self.pausers.insert(account) {
            return Err(LedgerError::AlreadyPauser(account));
        }
        Ok(())
    }

    /// Remove a pauser (owner only); the owner itself can never be removed
    pub fn remove_pauser(&mut self, caller: Address, account: Address) -> Result<()> {
        if account == self.owner {
            return Err(LedgerError::CannotRemoveOwner);
        }
        self.require_owner(caller)?;
        if !self.pausers.remove(&account) {
            return Err(LedgerError::NotAPauser(account));
        }
        Ok(())
    }

    /// Toggle testing mode (owner only)
    pub fn set_testing(&mut self, caller: Address, enabled: bool) -> Result<()> {
        self.require_owner(caller)?;
        self.testing_mode = enabled;
        Ok(())
    }
}
