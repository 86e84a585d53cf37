//! Driver record

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use crate::fhe::Euint32;
use super::EncryptedLocation;

/// A registered driver
///
/// The default value is the record returned for addresses that never registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Live position, replaceable by the driver
    pub location: EncryptedLocation,

    /// Encrypted minimum acceptable fare
    pub min_fare: Euint32,

    /// Whether the driver can accept a ride
    pub available: bool,

    /// Set by the owner after off-ledger checks
    pub verified: bool,

    /// Completed rides; never decreases
    pub total_rides: u64,

    /// Registration time
    pub registered_at: DateTime<Utc>,

    /// Escrowed registration deposit in wei
    pub deposit: u128,

    /// Whether this record belongs to a registered driver
    pub is_registered: bool,
}

impl Driver {
    /// Create a freshly registered, available and unverified driver
    pub fn new(location: EncryptedLocation, min_fare: Euint32, deposit: u128, registered_at: DateTime<Utc>) -> Self {
        Driver {
            location,
            min_fare,
            available: true,
            verified: false,
            total_rides: 0,
            registered_at,
            deposit,
            is_registered: true,
        }
    }

    /// Whether the deposit can be withdrawn now
    pub fn can_withdraw_deposit(&self) -> bool {
        self.deposit > 0 && self.total_rides > 0
    }
}
