//! Ride matching
//!
//! A driver accepts an open request. Both the passenger's maximum fare and the
//! driver's minimum fare are scaled by the same pseudo-random multiplier before the
//! encrypted comparison, so repeated comparisons do not leak the raw fares. The
//! comparison result is kept on the ride for later decryption but does not decide
//! whether the match happens.

use log::{debug, info};

use crate::crypto::{self, domains};
use crate::error::{LedgerError, Result};
use crate::fhe::{DecryptionOracle, Ebool, Euint32, FheEngine};
use crate::models::LedgerEvent;
use crate::treasury::ValueTransfer;
use super::{CallContext, Ledger};

impl<E, O, V> Ledger<E, O, V>
where
    E: FheEngine,
    O: DecryptionOracle,
    V: ValueTransfer,
{
    /// Accept an open ride request as the calling driver
    pub fn accept_ride(&mut self, ctx: &CallContext, ride_id: u64) -> Result<()> {
        let driver = ctx.caller;

        self.state.access.require_not_paused()?;
        ctx.require_no_value()?;

        let driver_record = self
            .state
            .registry
            .driver(&driver)
            .ok_or(LedgerError::UnregisteredDriver(driver))?;
        let min_fare = driver_record.min_fare;
        let driver_available = driver_record.available;

        let ride = match self.state.registry.ride(ride_id) {
            Some(ride) if ride.active => ride,
            _ => return Err(LedgerError::RideNotActive(ride_id)),
        };
        if ride.matched {
            return Err(LedgerError::AlreadyMatched(ride_id));
        }
        if !driver_available {
            return Err(LedgerError::DriverUnavailable(driver));
        }
        let passenger = ride.passenger;
        let max_fare = ride.max_fare;

        let compatibility = self.compare_fares(ctx, ride_id, max_fare, min_fare)?;

        if let Some(ride) = self.state.registry.ride_mut(ride_id) {
            ride.matched = true;
            ride.matched_driver = driver;
            ride.matched_at = ctx.timestamp;
            ride.fare_compatibility = compatibility;
        }
        if let Some(record) = self.state.registry.driver_mut(&driver) {
            record.available = false;
        }
        self.state.registry.record_driver_ride(driver, ride_id);
        self.state.registry.close_request(ride_id);
        self.state.registry.delist_available(&driver);

        info!("Ride {} matched: passenger {:?}, driver {:?}", ride_id, passenger, driver);
        self.emit(ctx.timestamp, LedgerEvent::RideMatched { ride_id, passenger, driver });

        Ok(())
    }

    /// Encrypted `max_fare * m >= min_fare * m` for a multiplier `m` derived from the call
    fn compare_fares(
        &mut self,
        ctx: &CallContext,
        ride_id: u64,
        max_fare: Euint32,
        min_fare: Euint32,
    ) -> Result<Ebool> {
        let multiplier = crypto::obfuscation_multiplier(
            domains::MATCH_MULTIPLIER,
            ctx.timestamp.timestamp(),
            ride_id,
            u64::from(self.config.privacy_multiplier_range),
        );
        let multiplier = u32::try_from(multiplier).map_err(|_| LedgerError::ArithmeticOverflow)?;

        let scaled_max = self.engine.mul_u32_scalar(max_fare, multiplier)?;
        let scaled_min = self.engine.mul_u32_scalar(min_fare, multiplier)?;
        let compatibility = self.engine.ge_u32(scaled_max, scaled_min)?;
        self.engine.allow(compatibility.handle(), self.state.ledger_address)?;

        debug!("Ride {} fare compatibility stored as {}", ride_id, compatibility.handle());
        Ok(compatibility)
    }
}
