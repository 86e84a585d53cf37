//! Driver registration and profile entry points

use ethers::types::Address;
use log::{debug, info};

use crate::error::{LedgerError, Result};
use crate::fhe::{DecryptionOracle, Euint32, ExternalEuint32, FheEngine, InputProof};
use crate::models::{Driver, EncryptedLocation, LedgerEvent};
use crate::treasury::ValueTransfer;
use crate::utils::format_wei;
use super::{CallContext, Ledger};

impl<E, O, V> Ledger<E, O, V>
where
    E: FheEngine,
    O: DecryptionOracle,
    V: ValueTransfer,
{
    /// Register the caller as a driver
    ///
    /// The attached value is the deposit and must reach the configured minimum. The
    /// driver starts available and unverified.
    pub fn register_driver(
        &mut self,
        ctx: &CallContext,
        latitude: ExternalEuint32,
        longitude: ExternalEuint32,
        min_fare: ExternalEuint32,
        proof: &InputProof,
    ) -> Result<()> {
        let driver = ctx.caller;

        self.state.access.require_not_paused()?;
        if self.state.registry.is_driver(&driver) {
            return Err(LedgerError::AlreadyRegistered(driver));
        }
        self.require_min_deposit(ctx.value)?;

        let location = self.ingest_location(ctx, latitude, longitude, proof)?;
        let min_fare = self.ingest_private(ctx, min_fare, proof)?;

        let balance = self
            .state
            .balance
            .checked_add(ctx.value)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.state
            .registry
            .insert_driver(driver, Driver::new(location, min_fare, ctx.value, ctx.timestamp))?;
        self.state.balance = balance;

        info!("Driver {:?} registered with {} deposit", driver, format_wei(ctx.value));
        self.emit(ctx.timestamp, LedgerEvent::DriverRegistered { driver, deposit: ctx.value });

        Ok(())
    }

    /// Replace the caller's encrypted position
    pub fn update_driver_location(
        &mut self,
        ctx: &CallContext,
        latitude: ExternalEuint32,
        longitude: ExternalEuint32,
        proof: &InputProof,
    ) -> Result<()> {
        let driver = ctx.caller;

        self.state.access.require_not_paused()?;
        ctx.require_no_value()?;
        self.require_registered_driver(driver)?;

        let location = self.ingest_location(ctx, latitude, longitude, proof)?;
        if let Some(record) = self.state.registry.driver_mut(&driver) {
            record.location = location;
        }

        debug!("Driver {:?} moved to ({}, {})", driver, location.latitude.handle(), location.longitude.handle());
        self.emit(ctx.timestamp, LedgerEvent::DriverLocationUpdated { driver });

        Ok(())
    }

    /// Toggle whether the caller takes new rides
    pub fn set_driver_availability(&mut self, ctx: &CallContext, available: bool) -> Result<()> {
        let driver = ctx.caller;

        self.state.access.require_not_paused()?;
        ctx.require_no_value()?;
        self.require_registered_driver(driver)?;

        if let Some(record) = self.state.registry.driver_mut(&driver) {
            record.available = available;
        }
        if available {
            self.state.registry.list_available(driver);
        } else {
            self.state.registry.delist_available(&driver);
        }

        debug!("Driver {:?} availability set to {}", driver, available);
        self.emit(ctx.timestamp, LedgerEvent::DriverAvailabilityChanged { driver, available });

        Ok(())
    }

    /// Mark a driver as verified (owner only)
    pub fn verify_driver(&mut self, ctx: &CallContext, driver: Address) -> Result<()> {
        self.state.access.require_owner(ctx.caller)?;
        ctx.require_no_value()?;
        self.require_registered_driver(driver)?;

        if let Some(record) = self.state.registry.driver_mut(&driver) {
            record.verified = true;
        }

        info!("Driver {:?} verified", driver);
        self.emit(ctx.timestamp, LedgerEvent::DriverVerified { driver });

        Ok(())
    }

    /// Validate an encrypted input and let the caller use it
    pub(super) fn ingest_private(
        &mut self,
        ctx: &CallContext,
        input: ExternalEuint32,
        proof: &InputProof,
    ) -> Result<Euint32> {
        let value = self.engine.ingest_u32(input, proof, self.state.ledger_address, ctx.caller)?;
        self.engine.allow(value.handle(), self.state.ledger_address)?;
        self.engine.allow(value.handle(), ctx.caller)?;
        Ok(value)
    }

    pub(super) fn ingest_location(
        &mut self,
        ctx: &CallContext,
        latitude: ExternalEuint32,
        longitude: ExternalEuint32,
        proof: &InputProof,
    ) -> Result<EncryptedLocation> {
        let latitude = self.ingest_private(ctx, latitude, proof)?;
        let longitude = self.ingest_private(ctx, longitude, proof)?;
        Ok(EncryptedLocation::new(latitude, longitude))
    }
}
