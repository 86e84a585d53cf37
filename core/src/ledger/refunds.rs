//! Claim-based refunds and withdrawals
//!
//! None of these entry points is gated by pause. Each one updates the books before the
//! transfer, runs under the reentrancy lock and restores the books if the transfer fails.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::error::{LedgerError, Result};
use crate::fhe::{DecryptionOracle, FheEngine};
use crate::models::LedgerEvent;
use crate::treasury::ValueTransfer;
use crate::utils::format_wei;
use super::{CallContext, Ledger};

impl<E, O, V> Ledger<E, O, V>
where
    E: FheEngine,
    O: DecryptionOracle,
    V: ValueTransfer,
{
    /// Refund an unmatched request to its passenger once the request timeout elapsed
    pub fn claim_ride_request_timeout(&mut self, ctx: &CallContext, ride_id: u64) -> Result<()> {
        self.non_reentrant(|ledger| {
            ctx.require_no_value()?;

            let ride = ledger.state.registry.ride_details(ride_id);
            if ride.passenger != ctx.caller || ride.id == 0 {
                return Err(LedgerError::NotPassenger { ride_id, caller: ctx.caller });
            }
            if ride.matched {
                return Err(LedgerError::RideAlreadyMatched(ride_id));
            }
            if !ride.active {
                return Err(LedgerError::RideNotActive(ride_id));
            }
            require_elapsed(ride_id, ledger.request_deadline(&ride), ctx.timestamp)?;

            let refund = ride.deposit;
            if let Some(record) = ledger.state.registry.ride_mut(ride_id) {
                record.active = false;
                record.deposit = 0;
            }
            ledger.state.registry.close_request(ride_id);

            if let Err(e) = ledger.pay(ride.passenger, refund) {
                if let Some(record) = ledger.state.registry.ride_mut(ride_id) {
                    record.active = true;
                    record.deposit = refund;
                }
                ledger.state.registry.reopen_request(ride_id);
                return Err(e);
            }

            info!("Ride {} timed out, refunded {} to {:?}", ride_id, format_wei(refund), ride.passenger);
            ledger.emit(
                ctx.timestamp,
                LedgerEvent::RideRequestTimedOut { ride_id, passenger: ride.passenger, refund },
            );

            Ok(())
        })
    }

    /// Refund the passenger's deposit when the oracle did not answer in time
    pub fn claim_decryption_timeout_refund(&mut self, ctx: &CallContext, ride_id: u64) -> Result<()> {
        self.non_reentrant(|ledger| {
            ctx.require_no_value()?;

            let ride = ledger.state.registry.ride_details(ride_id);
            if ride.id == 0 || !ride.is_party(ctx.caller) {
                return Err(LedgerError::NotRideParticipant { ride_id, caller: ctx.caller });
            }
            if !ride.decryption_pending {
                return Err(LedgerError::NoDecryptionPending(ride_id));
            }
            require_elapsed(ride_id, ledger.decryption_deadline(&ride), ctx.timestamp)?;
            if ledger.state.registry.completed_ride_info(ride_id).refund_processed {
                return Err(LedgerError::RefundAlreadyProcessed(ride_id));
            }

            let refund = ride.deposit;
            ledger.set_refund_effects(ride_id, true, 0);

            if refund > 0 {
                if let Err(e) = ledger.pay(ride.passenger, refund) {
                    ledger.set_refund_effects(ride_id, false, refund);
                    return Err(e);
                }
            }

            info!(
                "Decryption of ride {} timed out, refunded {} to {:?}",
                ride_id, format_wei(refund), ride.passenger
            );
            ledger.emit(
                ctx.timestamp,
                LedgerEvent::DecryptionTimeoutRefunded { ride_id, passenger: ride.passenger, refund },
            );

            Ok(())
        })
    }

    /// Withdraw the caller's registration deposit after at least one completed ride
    pub fn withdraw_driver_deposit(&mut self, ctx: &CallContext) -> Result<u128> {
        self.non_reentrant(|ledger| {
            let driver = ctx.caller;
            ctx.require_no_value()?;

            let record = ledger.state.registry.driver_info(&driver);
            if !record.can_withdraw_deposit() {
                return Err(if record.deposit == 0 {
                    LedgerError::NoDepositToWithdraw(driver)
                } else {
                    LedgerError::NoCompletedRides(driver)
                });
            }

            let amount = record.deposit;
            if let Some(record) = ledger.state.registry.driver_mut(&driver) {
                record.deposit = 0;
            }

            if let Err(e) = ledger.pay(driver, amount) {
                if let Some(record) = ledger.state.registry.driver_mut(&driver) {
                    record.deposit = amount;
                }
                return Err(e);
            }

            info!("Driver {:?} withdrew {} deposit", driver, format_wei(amount));
            ledger.emit(ctx.timestamp, LedgerEvent::DriverDepositWithdrawn { driver, amount });

            Ok(amount)
        })
    }

    /// Withdraw accrued platform fees to the owner
    pub fn withdraw_platform_fees(&mut self, ctx: &CallContext, amount: u128) -> Result<()> {
        self.non_reentrant(|ledger| {
            ledger.state.access.require_owner(ctx.caller)?;
            ctx.require_no_value()?;

            let available = ledger.state.platform_fees;
            if amount == 0 || amount > available {
                return Err(LedgerError::InsufficientFees { requested: amount, available });
            }

            ledger.state.platform_fees = available - amount;
            if let Err(e) = ledger.pay(ctx.caller, amount) {
                ledger.state.platform_fees = available;
                return Err(e);
            }

            info!("Withdrew {} of platform fees to {:?}", format_wei(amount), ctx.caller);
            ledger.emit(ctx.timestamp, LedgerEvent::PlatformFeesWithdrawn { to: ctx.caller, amount });

            Ok(())
        })
    }

    fn set_refund_effects(&mut self, ride_id: u64, refunded: bool, deposit: u128) {
        if let Some(completed) = self.state.registry.completed_mut(ride_id) {
            completed.refund_processed = refunded;
        }
        if let Some(ride) = self.state.registry.ride_mut(ride_id) {
            ride.decryption_pending = !refunded;
            ride.deposit = deposit;
        }
    }
}

fn require_elapsed(ride_id: u64, deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<()> {
    let claimable_at = deadline.unwrap_or(DateTime::<Utc>::MAX_UTC);
    if now < claimable_at {
        debug!("Claim on ride {} before {}", ride_id, claimable_at);
        return Err(LedgerError::TimeoutNotReached { ride_id, claimable_at });
    }
    Ok(())
}
