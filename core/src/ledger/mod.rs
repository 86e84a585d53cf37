//! The ride ledger aggregate
//!
//! [`Ledger`] owns the whole ledger state and the three injected collaborators.
//! Entry points are grouped by role in the submodules; every one of them takes a
//! [`CallContext`] and either applies all of its effects and appends one event, or
//! returns an error and leaves the state untouched.

mod admin;
mod drivers;
mod matching;
mod refunds;
mod rides;
mod settlement;


use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use ethers::types::Address;
use log::{info, warn};

use crate::access::AccessControl;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::fhe::{DecryptionOracle, FheEngine, RequestId};
use crate::models::{CompletedRide, Driver, EventRecord, LedgerEvent, RideRequest};
use crate::registry::Registry;
use crate::utils;
use crate::treasury::ValueTransfer;

/// Authenticated caller, attached value and processing time of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Sender of the call
    pub caller: Address,

    /// Native value attached to the call, in wei
    pub value: u128,

    /// Processing timestamp
    pub timestamp: DateTime<Utc>,
}

impl CallContext {
    /// Call without attached value
    pub fn new(caller: Address, timestamp: DateTime<Utc>) -> Self {
        CallContext { caller, value: 0, timestamp }
    }

    /// Attach native value to the call
    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }

    fn require_no_value(&self) -> Result<()> {
        if self.value != 0 {
            return Err(LedgerError::NonPayable(self.value));
        }
        Ok(())
    }
}

/// Fare decryption progress of a ride
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionStatus {
    /// Waiting for the oracle
    pub pending: bool,

    /// Oracle request id, zero if never requested
    pub request_id: RequestId,

    /// When the decryption was requested
    pub requested_at: DateTime<Utc>,

    /// Revealed plaintext fare, zero until revealed
    pub revealed_fare: u64,

    /// Whether the fare was revealed
    pub fare_revealed: bool,

    /// Whether the decryption-timeout refund was paid
    pub refund_processed: bool,

    /// Whether the decryption timeout has elapsed for a pending request
    pub timeout_elapsed: bool,
}

/// Serializable ledger state, everything except the collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Address the ledger uses as its own identity towards the engine and oracle
    pub ledger_address: Address,

    /// Entities and indices
    pub registry: Registry,

    /// Owner, pausers, pause state and testing flag
    pub access: AccessControl,

    /// Accrued platform fees, in wei
    pub platform_fees: u128,

    /// Native value held by the ledger, in wei
    pub balance: u128,

    /// Oracle request id -> ride id
    pub pending_decryptions: HashMap<RequestId, u64>,

    /// Append-only audit log
    pub events: Vec<EventRecord>,
}

impl LedgerState {
    /// Empty state owned by `owner`
    pub fn new(owner: Address, ledger_address: Address, testing_mode: bool) -> Self {
        LedgerState {
            ledger_address,
            registry: Registry::new(),
            access: AccessControl::new(owner, testing_mode),
            platform_fees: 0,
            balance: 0,
            pending_decryptions: HashMap::new(),
            events: Vec::new(),
        }
    }
}

/// Privacy-preserving ride ledger
///
/// Generic over the ciphertext engine `E`, the decryption oracle `O` and the value
/// transfer backend `V`.
#[derive(Debug)]
pub struct Ledger<E, O, V> {
    /// Economic and timing parameters
    config: LedgerConfig,

    /// Ledger state
    state: LedgerState,

    /// Homomorphic engine
    engine: E,

    /// Decryption oracle client
    oracle: O,

    /// Native value transfers
    vault: V,

    /// Set while a value-moving entry point runs
    locked: bool,
}

impl<E, O, V> Ledger<E, O, V>
where
    E: FheEngine,
    O: DecryptionOracle,
    V: ValueTransfer,
{
    /// Create an empty ledger owned by `owner`
    pub fn new(
        owner: Address,
        ledger_address: Address,
        config: LedgerConfig,
        engine: E,
        oracle: O,
        vault: V,
    ) -> Result<Self> {
        if owner.is_zero() || ledger_address.is_zero() {
            return Err(LedgerError::InvalidAddress);
        }
        config.validate()?;
        utils::init_logging(&config.log_level);

        info!(
            "Ledger {:?} created for owner {:?} (fee {}%, testing mode {})",
            ledger_address, owner, config.platform_fee_percent, config.testing_mode
        );

        let state = LedgerState::new(owner, ledger_address, config.testing_mode);
        Self::from_state(state, config, engine, oracle, vault)
    }

    /// Restore a ledger around previously saved state
    pub fn from_state(
        state: LedgerState,
        config: LedgerConfig,
        engine: E,
        oracle: O,
        vault: V,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Ledger {
            config,
            state,
            engine,
            oracle,
            vault,
            locked: false,
        })
    }

    // ---- collaborators ----

    /// Ciphertext engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Ciphertext engine, mutable
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Decryption oracle client
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Decryption oracle client, mutable
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Value transfer backend
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Value transfer backend, mutable
    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    /// Configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Ledger state, for inspection and snapshots
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Give up the collaborators and keep the state
    pub fn into_state(self) -> LedgerState {
        self.state
    }

    // ---- queries ----

    /// Address of the ledger itself
    pub fn address(&self) -> Address {
        self.state.ledger_address
    }

    /// Ledger owner
    pub fn owner(&self) -> Address {
        self.state.access.owner()
    }

    /// Whether the ledger is paused
    pub fn is_paused(&self) -> bool {
        self.state.access.is_paused()
    }

    /// Whether `account` is a pauser
    pub fn is_pauser(&self, account: &Address) -> bool {
        self.state.access.is_pauser(account)
    }

    /// Whether debug-only entry points are enabled
    pub fn is_testing(&self) -> bool {
        self.state.access.testing_mode()
    }

    /// Driver record, zero-valued for unknown addresses
    pub fn get_driver_info(&self, driver: &Address) -> Driver {
        self.state.registry.driver_info(driver)
    }

    /// Ride request, zero-valued for unknown ids
    pub fn get_ride_details(&self, ride_id: u64) -> RideRequest {
        self.state.registry.ride_details(ride_id)
    }

    /// Completed ride, zero-valued for unknown ids
    pub fn get_completed_ride_info(&self, ride_id: u64) -> CompletedRide {
        self.state.registry.completed_ride_info(ride_id)
    }

    /// Number of open ride requests
    pub fn get_active_ride_requests_count(&self) -> usize {
        self.state.registry.active_request_count()
    }

    /// Number of available drivers
    pub fn get_available_drivers_count(&self) -> usize {
        self.state.registry.available_driver_count()
    }

    /// Rides requested by `passenger`
    pub fn get_passenger_history(&self, passenger: &Address) -> Vec<u64> {
        self.state.registry.passenger_history(passenger)
    }

    /// Rides accepted by `driver`
    pub fn get_driver_history(&self, driver: &Address) -> Vec<u64> {
        self.state.registry.driver_history(driver)
    }

    /// Accrued platform fees, in wei
    pub fn get_platform_fees(&self) -> u128 {
        self.state.platform_fees
    }

    /// Native value held by the ledger, in wei
    pub fn balance(&self) -> u128 {
        self.state.balance
    }

    /// Number of ride requests ever created
    pub fn ride_counter(&self) -> u64 {
        self.state.registry.ride_counter()
    }

    /// Number of drivers ever registered
    pub fn driver_counter(&self) -> u64 {
        self.state.registry.driver_counter()
    }

    /// Decryption progress of a ride as seen at `now`
    pub fn get_decryption_status(&self, ride_id: u64, now: DateTime<Utc>) -> DecryptionStatus {
        let ride = self.state.registry.ride_details(ride_id);
        let completed = self.state.registry.completed_ride_info(ride_id);

        let timeout_elapsed = ride.decryption_pending
            && self
                .decryption_deadline(&ride)
                .map_or(false, |deadline| now >= deadline);

        DecryptionStatus {
            pending: ride.decryption_pending,
            request_id: completed.decryption_request_id,
            requested_at: ride.decryption_requested_at,
            revealed_fare: completed.revealed_fare,
            fare_revealed: completed.fare_revealed,
            refund_processed: completed.refund_processed,
            timeout_elapsed,
        }
    }

    /// The audit log
    pub fn events(&self) -> &[EventRecord] {
        &self.state.events
    }

    /// Events with a sequence number greater than `sequence`
    pub fn events_since(&self, sequence: u64) -> &[EventRecord] {
        let start = self.state.events.partition_point(|record| record.sequence <= sequence);
        &self.state.events[start..]
    }

    // ---- internals ----

    fn emit(&mut self, timestamp: DateTime<Utc>, event: LedgerEvent) {
        let sequence = self.state.events.last().map_or(1, |record| record.sequence + 1);
        self.state.events.push(EventRecord { sequence, timestamp, event });
    }

    /// Run a value-moving entry point under the reentrancy lock
    fn non_reentrant<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.locked {
            return Err(LedgerError::ReentrantCall);
        }

        self.locked = true;
        let result = f(self);
        self.locked = false;

        result
    }

    /// Pay `amount` out of the ledger balance
    ///
    /// On error nothing left the ledger and the balance is unchanged; the caller
    /// rolls back its own effects.
    fn pay(&mut self, to: Address, amount: u128) -> Result<()> {
        let held = self.state.balance;
        if amount > held {
            warn!("Payout of {} wei to {:?} exceeds ledger balance {} wei", amount, to, held);
            return Err(LedgerError::InsufficientLedgerBalance { requested: amount, held });
        }

        if let Err(e) = self.vault.transfer(to, amount) {
            warn!("Transfer of {} wei to {:?} failed: {}", amount, to, e);
            return Err(e);
        }

        self.state.balance = held - amount;
        Ok(())
    }

    fn request_deadline(&self, ride: &RideRequest) -> Option<DateTime<Utc>> {
        ride.requested_at.checked_add_signed(self.config.request_timeout_delta())
    }

    fn decryption_deadline(&self, ride: &RideRequest) -> Option<DateTime<Utc>> {
        ride.decryption_requested_at
            .checked_add_signed(self.config.decryption_timeout_delta())
    }

    fn require_registered_driver(&self, driver: Address) -> Result<()> {
        if !self.state.registry.is_driver(&driver) {
            return Err(LedgerError::UnregisteredDriver(driver));
        }
        Ok(())
    }

    fn require_min_deposit(&self, provided: u128) -> Result<()> {
        let required = self.config.min_deposit;
        if provided < required {
            return Err(LedgerError::InsufficientDeposit { required, provided });
        }
        Ok(())
    }
}
