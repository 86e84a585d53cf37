//! Audit log events
//!
//! Each successful state transition appends exactly one event.

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use ethers::types::Address;

use crate::fhe::RequestId;

/// A ledger event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum LedgerEvent {
    /// Driver registered with a deposit
    DriverRegistered { driver: Address, deposit: u128 },

    /// Driver replaced its encrypted position
    DriverLocationUpdated { driver: Address },

    /// Driver toggled availability
    DriverAvailabilityChanged { driver: Address, available: bool },

    /// Owner verified a driver
    DriverVerified { driver: Address },

    /// Passenger requested a ride
    RideRequested { ride_id: u64, passenger: Address, deposit: u128 },

    /// Driver accepted a ride
    RideMatched { ride_id: u64, passenger: Address, driver: Address },

    /// Driver completed a ride
    RideCompleted { ride_id: u64, passenger: Address, driver: Address },

    /// Passenger or driver asked the oracle for the fare
    FareDecryptionRequested { ride_id: u64, request_id: RequestId },

    /// Oracle revealed the fare and the platform fee was accrued
    FareRevealed { ride_id: u64, fare: u64, platform_fee: u128 },

    /// Passenger or driver flagged the fare
    FareDisputed { ride_id: u64, by: Address },

    /// Unmatched request expired and the deposit went back to the passenger
    RideRequestTimedOut { ride_id: u64, passenger: Address, refund: u128 },

    /// Stalled decryption expired and the deposit went back to the passenger
    DecryptionTimeoutRefunded { ride_id: u64, passenger: Address, refund: u128 },

    /// Driver withdrew the registration deposit
    DriverDepositWithdrawn { driver: Address, amount: u128 },

    /// Owner withdrew platform fees
    PlatformFeesWithdrawn { to: Address, amount: u128 },

    /// Ledger paused
    Paused { by: Address },

    /// Ledger unpaused
    Unpaused { by: Address },

    /// Pauser added
    PauserAdded { account: Address },

    /// Pauser removed
    PauserRemoved { account: Address },

    /// Testing flag changed
    TestingModeChanged { enabled: bool },
}

/// An event with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 1
    pub sequence: u64,

    /// Processing time of the call that emitted it
    pub timestamp: DateTime<Utc>,

    /// The event
    pub event: LedgerEvent,
}
