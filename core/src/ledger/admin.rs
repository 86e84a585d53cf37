//! Owner and pauser administration

use ethers::types::Address;
use log::{info, warn};

use crate::error::Result;
use crate::fhe::{DecryptionOracle, FheEngine};
use crate::models::LedgerEvent;
use crate::treasury::ValueTransfer;
use super::{CallContext, Ledger};

impl<E, O, V> Ledger<E, O, V>
where
    E: FheEngine,
    O: DecryptionOracle,
    V: ValueTransfer,
{
    /// Stop all gated entry points (pausers only)
    pub fn pause(&mut self, ctx: &CallContext) -> Result<()> {
        ctx.require_no_value()?;
        self.state.access.pause(ctx.caller)?;

        warn!("Ledger paused by {:?}", ctx.caller);
        self.emit(ctx.timestamp, LedgerEvent::Paused { by: ctx.caller });
        Ok(())
    }

    /// Resume gated entry points (pausers only)
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<()> {
        ctx.require_no_value()?;
        self.state.access.unpause(ctx.caller)?;

        info!("Ledger unpaused by {:?}", ctx.caller);
        self.emit(ctx.timestamp, LedgerEvent::Unpaused { by: ctx.caller });
        Ok(())
    }

    /// Grant pause rights (owner only)
    pub fn add_pauser(&mut self, ctx: &CallContext, account: Address) -> Result<()> {
        ctx.require_no_value()?;
        self.state.access.add_pauser(ctx.caller, account)?;

        info!("Pauser {:?} added", account);
        self.emit(ctx.timestamp, LedgerEvent::PauserAdded { account });
        Ok(())
    }

    /// Revoke pause rights (owner only); the owner keeps them permanently
    pub fn remove_pauser(&mut self, ctx: &CallContext, account: Address) -> Result<()> {
        ctx.require_no_value()?;
        self.state.access.remove_pauser(ctx.caller, account)?;

        info!("Pauser {:?} removed", account);
        self.emit(ctx.timestamp, LedgerEvent::PauserRemoved { account });
        Ok(())
    }

    /// Enable or disable debug-only entry points (owner only)
    pub fn set_testing(&mut self, ctx: &CallContext, enabled: bool) -> Result<()> {
        ctx.require_no_value()?;
        self.state.access.set_testing(ctx.caller, enabled)?;

        info!("Testing mode set to {}", enabled);
        self.emit(ctx.timestamp, LedgerEvent::TestingModeChanged { enabled });
        Ok(())
    }
}
