//! Ride completion and fare settlement
//!
//! The driver submits the encrypted final fare at completion. Either party can then
//! ask the oracle to decrypt it; the oracle answers through
//! [`Ledger::fare_decryption_callback`], which records the fare and accrues the
//! platform fee. Fee accrual is bookkeeping only and does not touch escrowed deposits.

use log::{debug, info, warn};

use crate::crypto::{self, domains};
use crate::error::{LedgerError, Result};
use crate::fhe::{
    decode_cleartext_u64, DecryptionOracle, EngineError, ExternalEuint32, FheEngine, InputProof, RequestId,
};
use crate::models::{CompletedRide, LedgerEvent};
use crate::treasury::ValueTransfer;
use super::{CallContext, Ledger};

impl<E, O, V> Ledger<E, O, V>
where
    E: FheEngine,
    O: DecryptionOracle,
    V: ValueTransfer,
{
    /// Complete a matched ride as its driver, submitting the encrypted final fare
    pub fn complete_ride(
        &mut self,
        ctx: &CallContext,
        ride_id: u64,
        final_fare: ExternalEuint32,
        proof: &InputProof,
    ) -> Result<()> {
        let driver = ctx.caller;
        let ledger = self.state.ledger_address;

        self.state.access.require_not_paused()?;
        ctx.require_no_value()?;
        self.require_registered_driver(driver)?;

        let ride = match self.state.registry.ride(ride_id) {
            Some(ride) if ride.matched && ride.matched_driver == driver => ride,
            _ => return Err(LedgerError::NotMatchedDriver { ride_id, driver }),
        };
        if !ride.active {
            return Err(LedgerError::RideNotActive(ride_id));
        }
        let passenger = ride.passenger;
        let started_at = ride.matched_at;

        let total_rides = self
            .state
            .registry
            .driver(&driver)
            .map_or(0, |d| d.total_rides)
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        // Widen before scaling: the decoy can exceed 32 bits
        let fare = self.engine.ingest_u32(final_fare, proof, ledger, driver)?;
        let fare = self.engine.cast_u32_to_u64(fare)?;
        let multiplier = crypto::obfuscation_multiplier(
            domains::FARE_OBFUSCATION,
            ctx.timestamp.timestamp(),
            ride_id,
            self.config.fare_obfuscation_range,
        );
        let obfuscated = self.engine.mul_u64_scalar(fare, multiplier)?;

        self.engine.allow(fare.handle(), ledger)?;
        self.engine.allow(fare.handle(), passenger)?;
        self.engine.allow(fare.handle(), driver)?;
        self.engine.allow(obfuscated.handle(), ledger)?;

        self.state.registry.insert_completed(CompletedRide {
            ride_id,
            passenger,
            driver,
            final_fare: fare,
            obfuscated_fare: obfuscated,
            started_at,
            ended_at: ctx.timestamp,
            completed: true,
            ..Default::default()
        });
        if let Some(ride) = self.state.registry.ride_mut(ride_id) {
            ride.active = false;
        }
        if let Some(record) = self.state.registry.driver_mut(&driver) {
            record.available = true;
            record.total_rides = total_rides;
        }
        self.state.registry.list_available(driver);

        info!("Ride {} completed by {:?} ({} ride(s) total)", ride_id, driver, total_rides);
        self.emit(ctx.timestamp, LedgerEvent::RideCompleted { ride_id, passenger, driver });

        Ok(())
    }

    /// Ask the oracle to decrypt the final fare of a completed ride
    ///
    /// Returns the oracle request id. The fare arrives later through the callback.
    pub fn request_fare_decryption(&mut self, ctx: &CallContext, ride_id: u64) -> Result<RequestId> {
        self.state.access.require_not_paused()?;
        ctx.require_no_value()?;

        let completed = self.completed_ride(ride_id)?;
        if ctx.caller != completed.passenger && ctx.caller != completed.driver {
            return Err(LedgerError::NotRideParticipant { ride_id, caller: ctx.caller });
        }
        if completed.decryption_request_id != 0 {
            return Err(LedgerError::DecryptionAlreadyRequested(ride_id));
        }
        if completed.is_settled() {
            return Err(settled_error(completed));
        }
        let fare = completed.final_fare;

        let request_id = self
            .oracle
            .request_decryption(&[fare.handle()], self.state.ledger_address)?;
        if request_id == 0 || self.state.pending_decryptions.contains_key(&request_id) {
            return Err(EngineError::RequestRejected(format!("oracle returned unusable request id {}", request_id)).into());
        }

        if let Some(completed) = self.state.registry.completed_mut(ride_id) {
            completed.decryption_request_id = request_id;
        }
        if let Some(ride) = self.state.registry.ride_mut(ride_id) {
            ride.decryption_pending = true;
            ride.decryption_requested_at = ctx.timestamp;
            ride.decryption_request_id = request_id;
        }
        self.state.pending_decryptions.insert(request_id, ride_id);

        info!("Fare decryption for ride {} requested as {}", ride_id, request_id);
        self.emit(ctx.timestamp, LedgerEvent::FareDecryptionRequested { ride_id, request_id });

        Ok(request_id)
    }

    /// Oracle answer to [`Ledger::request_fare_decryption`]
    ///
    /// `cleartexts` is one 32-byte big-endian word holding the fare; `signatures` must
    /// verify with the engine. Any failure leaves the decryption pending.
    pub fn fare_decryption_callback(
        &mut self,
        ctx: &CallContext,
        request_id: RequestId,
        cleartexts: &[u8],
        signatures: &[u8],
    ) -> Result<()> {
        self.state.access.require_not_paused()?;
        ctx.require_no_value()?;

        let ride_id = *self
            .state
            .pending_decryptions
            .get(&request_id)
            .ok_or(LedgerError::UnknownDecryptionRequest(request_id))?;

        if !self.engine.check_signatures(request_id, cleartexts, signatures) {
            warn!("Rejected decryption callback {} for ride {}: bad signatures", request_id, ride_id);
            return Err(LedgerError::InvalidDecryptionProof(request_id));
        }

        let fare = decode_cleartext_u64(cleartexts).ok_or_else(|| {
            warn!("Rejected decryption callback {} for ride {}: malformed payload", request_id, ride_id);
            LedgerError::InvalidPlaintext(format!(
                "expected one 32-byte word holding a 64-bit value, got {} bytes",
                cleartexts.len()
            ))
        })?;

        let completed = self.completed_ride(ride_id)?;
        if completed.is_settled() {
            return Err(settled_error(completed));
        }

        self.reveal_fare(ctx, ride_id, fare)?;
        self.state.pending_decryptions.remove(&request_id);

        Ok(())
    }

    /// Flag the fare of a completed ride as disputed
    pub fn dispute_fare(&mut self, ctx: &CallContext, ride_id: u64) -> Result<()> {
        self.state.access.require_not_paused()?;
        ctx.require_no_value()?;

        let completed = self.completed_ride(ride_id)?;
        if ctx.caller != completed.passenger && ctx.caller != completed.driver {
            return Err(LedgerError::NotRideParticipant { ride_id, caller: ctx.caller });
        }
        if completed.disputed {
            return Err(LedgerError::AlreadyDisputed(ride_id));
        }

        if let Some(completed) = self.state.registry.completed_mut(ride_id) {
            completed.disputed = true;
        }

        info!("Fare of ride {} disputed by {:?}", ride_id, ctx.caller);
        self.emit(ctx.timestamp, LedgerEvent::FareDisputed { ride_id, by: ctx.caller });

        Ok(())
    }

    /// Reveal a fare without the oracle (owner only, testing mode only)
    pub fn debug_reveal_fare(&mut self, ctx: &CallContext, ride_id: u64, fare: u64) -> Result<()> {
        self.state.access.require_owner(ctx.caller)?;
        self.state.access.require_testing()?;
        ctx.require_no_value()?;

        let completed = self.completed_ride(ride_id)?;
        if completed.is_settled() {
            return Err(settled_error(completed));
        }
        let request_id = completed.decryption_request_id;

        warn!("Revealing fare of ride {} without the oracle", ride_id);
        self.reveal_fare(ctx, ride_id, fare)?;
        if request_id != 0 {
            self.state.pending_decryptions.remove(&request_id);
        }

        Ok(())
    }

    fn completed_ride(&self, ride_id: u64) -> Result<&CompletedRide> {
        self.state
            .registry
            .completed(ride_id)
            .filter(|completed| completed.completed)
            .ok_or(LedgerError::RideNotCompleted(ride_id))
    }

    /// Record a plaintext fare and accrue the platform fee on it
    fn reveal_fare(&mut self, ctx: &CallContext, ride_id: u64, fare: u64) -> Result<u128> {
        let platform_fee = u128::from(fare)
            .checked_mul(u128::from(self.config.platform_fee_percent))
            .ok_or(LedgerError::ArithmeticOverflow)?
            / 100;
        let platform_fees = self
            .state
            .platform_fees
            .checked_add(platform_fee)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if let Some(completed) = self.state.registry.completed_mut(ride_id) {
            completed.revealed_fare = fare;
            completed.fare_revealed = true;
        }
        if let Some(ride) = self.state.registry.ride_mut(ride_id) {
            ride.decryption_pending = false;
        }
        self.state.platform_fees = platform_fees;

        info!("Fare of ride {} revealed: {} (platform fee {})", ride_id, fare, platform_fee);
        debug!("Platform fee pool now {} wei", platform_fees);
        self.emit(ctx.timestamp, LedgerEvent::FareRevealed { ride_id, fare, platform_fee });

        Ok(platform_fee)
    }
}

/// Error for a ride whose fare was already revealed or refunded
fn settled_error(completed: &CompletedRide) -> LedgerError {
    if completed.refund_processed {
        LedgerError::RefundAlreadyProcessed(completed.ride_id)
    } else {
        LedgerError::FareAlreadyRevealed(completed.ride_id)
    }
}
