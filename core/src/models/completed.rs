//! Completed ride record

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use ethers::types::Address;

use crate::fhe::{Euint64, RequestId};

/// A finished ride, keyed by the id of its ride request
///
/// After completion exactly one of two things may happen to it: the oracle reveals the
/// fare, or the decryption times out and the passenger is refunded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedRide {
    /// Ride id
    pub ride_id: u64,

    /// Passenger
    pub passenger: Address,

    /// Driver
    pub driver: Address,

    /// Encrypted final fare, widened to 64 bits
    pub final_fare: Euint64,

    /// Final fare times a decoy multiplier; stored, never decrypted
    pub obfuscated_fare: Euint64,

    /// Match time
    pub started_at: DateTime<Utc>,

    /// Completion time
    pub ended_at: DateTime<Utc>,

    /// Set on creation
    pub completed: bool,

    /// Flagged by passenger or driver
    pub disputed: bool,

    /// Plaintext fare, zero until the oracle answers
    pub revealed_fare: u64,

    /// Set when the oracle (or the testing-mode reveal) delivered the fare
    pub fare_revealed: bool,

    /// Oracle request id, zero when none
    pub decryption_request_id: RequestId,

    /// Decryption-timeout refund paid
    pub refund_processed: bool,
}

impl CompletedRide {
    /// Whether the ride was settled by either a reveal or a refund
    pub fn is_settled(&self) -> bool {
        self.fare_revealed || self.refund_processed
    }
}
