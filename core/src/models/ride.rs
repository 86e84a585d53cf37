//! Ride request record

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use ethers::types::Address;

use crate::fhe::{Ebool, Euint32, RequestId};
use super::EncryptedLocation;

/// A passenger's ride request
///
/// `active` moves from true to false once and never back. `matched` implies a non-zero
/// `matched_driver`. The record is kept after the ride ends; only index entries go away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideRequest {
    /// Ride id, starting at 1; zero for the default record
    pub id: u64,

    /// Requesting passenger
    pub passenger: Address,

    /// Encrypted pickup location
    pub pickup: EncryptedLocation,

    /// Encrypted destination
    pub destination: EncryptedLocation,

    /// Encrypted maximum fare the passenger accepts
    pub max_fare: Euint32,

    /// Submission time
    pub requested_at: DateTime<Utc>,

    /// Open for matching or in progress
    pub active: bool,

    /// Accepted by a driver
    pub matched: bool,

    /// Accepting driver, zero until matched
    pub matched_driver: Address,

    /// Match time, the start of the ride
    pub matched_at: DateTime<Utc>,

    /// Encrypted result of the obfuscated `max_fare >= min_fare` check
    pub fare_compatibility: Ebool,

    /// Escrowed deposit in wei; drained to zero at most once
    pub deposit: u128,

    /// A fare decryption is in flight
    pub decryption_pending: bool,

    /// Time of the fare decryption request
    pub decryption_requested_at: DateTime<Utc>,

    /// Oracle request id, zero when none
    pub decryption_request_id: RequestId,
}

impl RideRequest {
    /// Whether the request can still be accepted by a driver
    pub fn is_open(&self) -> bool {
        self.active && !self.matched
    }

    /// Whether `account` is the passenger or the matched driver
    pub fn is_party(&self, account: Address) -> bool {
        account == self.passenger || (self.matched && account == self.matched_driver)
    }
}
