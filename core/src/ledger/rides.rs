//! Passenger ride requests

use log::info;

use crate::error::{LedgerError, Result};
use crate::fhe::{DecryptionOracle, ExternalEuint32, FheEngine, InputProof};
use crate::models::{LedgerEvent, RideRequest};
use crate::treasury::ValueTransfer;
use crate::utils::format_wei;
use super::{CallContext, Ledger};

impl<E, O, V> Ledger<E, O, V>
where
    E: FheEngine,
    O: DecryptionOracle,
    V: ValueTransfer,
{
    /// Request a ride and escrow the attached deposit
    ///
    /// A passenger may hold any number of open requests. Returns the new ride id.
    #[allow(clippy::too_many_arguments)]
    pub fn request_ride(
        &mut self,
        ctx: &CallContext,
        pickup_latitude: ExternalEuint32,
        pickup_longitude: ExternalEuint32,
        destination_latitude: ExternalEuint32,
        destination_longitude: ExternalEuint32,
        max_fare: ExternalEuint32,
        proof: &InputProof,
    ) -> Result<u64> {
        let passenger = ctx.caller;

        self.state.access.require_not_paused()?;
        self.require_min_deposit(ctx.value)?;
        self.state.registry.next_ride_id()?;

        let pickup = self.ingest_location(ctx, pickup_latitude, pickup_longitude, proof)?;
        let destination = self.ingest_location(ctx, destination_latitude, destination_longitude, proof)?;
        let max_fare = self.ingest_private(ctx, max_fare, proof)?;

        let balance = self
            .state
            .balance
            .checked_add(ctx.value)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        let ride_id = self.state.registry.insert_ride(RideRequest {
            passenger,
            pickup,
            destination,
            max_fare,
            requested_at: ctx.timestamp,
            active: true,
            deposit: ctx.value,
            ..Default::default()
        })?;
        self.state.balance = balance;

        info!("Ride {} requested by {:?} with {} deposit", ride_id, passenger, format_wei(ctx.value));
        self.emit(
            ctx.timestamp,
            LedgerEvent::RideRequested { ride_id, passenger, deposit: ctx.value },
        );

        Ok(ride_id)
    }
}
