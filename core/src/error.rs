//! Error types for the core crate
//!
//! Every rejected entry point returns a [`LedgerError`]. Errors never carry partial
//! effects: an entry point either applies all of its effects or none of them.

use thiserror::Error;
use std::io;

use crate::fhe::EngineError;

/// Failure category, used by integrations to decide whether a retry can help
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong role, owner, pauser or ride party
    Authorization,

    /// Wrong lifecycle state (already matched, not timed out, paused, ...)
    State,

    /// Deposits, fees or balances do not cover the operation, or a transfer failed
    Resource,

    /// Decryption result or proof rejected
    Oracle,

    /// Engine, configuration, serialization or I/O failure
    Infrastructure,
}

/// Core error type
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Caller is not the ledger owner
    #[error("Caller {0:?} is not the owner")]
    NotOwner(ethers::types::Address),

    /// Caller is not in the pauser set
    #[error("Caller {0:?} is not a pauser")]
    NotPauser(ethers::types::Address),

    /// Account is already a pauser
    #[error("Account {0:?} is already a pauser")]
    AlreadyPauser(ethers::types::Address),

    /// Account is not a pauser
    #[error("Account {0:?} is not a pauser")]
    NotAPauser(ethers::types::Address),

    /// The owner is a permanent pauser
    #[error("The owner cannot be removed from the pauser set")]
    CannotRemoveOwner,

    /// Zero address supplied where an account is required
    #[error("Invalid address: the zero address is not allowed")]
    InvalidAddress,

    /// Mutating entry point called while paused
    #[error("Ledger is paused")]
    Paused,

    /// Pause requested while already paused
    #[error("Ledger is already paused")]
    AlreadyPaused,

    /// Unpause requested while not paused
    #[error("Ledger is not paused")]
    NotPaused,

    /// Debug-only entry point called outside testing mode
    #[error("Testing mode is disabled")]
    TestingModeDisabled,

    /// Address already registered as a driver
    #[error("Driver {0:?} is already registered")]
    AlreadyRegistered(ethers::types::Address),

    /// Caller is not a registered driver
    #[error("Driver {0:?} is not registered")]
    UnregisteredDriver(ethers::types::Address),

    /// Attached deposit is below the configured minimum
    #[error("Insufficient deposit: required {required} wei, got {provided} wei")]
    InsufficientDeposit {
        /// Minimum deposit in wei
        required: u128,
        /// Deposit attached to the call in wei
        provided: u128,
    },

    /// Value attached to an entry point that does not accept value
    #[error("Entry point does not accept value, got {0} wei")]
    NonPayable(u128),

    /// Ride does not exist or is no longer active
    #[error("Ride {0} is not active")]
    RideNotActive(u64),

    /// Ride was already accepted by a driver
    #[error("Ride {0} is already matched")]
    AlreadyMatched(u64),

    /// Timeout claim on a ride that was matched
    #[error("Ride {0} was already matched and cannot time out")]
    RideAlreadyMatched(u64),

    /// Driver is not available for a new ride
    #[error("Driver {0:?} is not available")]
    DriverUnavailable(ethers::types::Address),

    /// Driver is not the matched driver of the ride
    #[error("Driver {driver:?} is not the matched driver of ride {ride_id}")]
    NotMatchedDriver {
        /// Ride id
        ride_id: u64,
        /// Calling driver
        driver: ethers::types::Address,
    },

    /// Caller is not the passenger of the ride
    #[error("Caller {caller:?} is not the passenger of ride {ride_id}")]
    NotPassenger {
        /// Ride id
        ride_id: u64,
        /// Calling account
        caller: ethers::types::Address,
    },

    /// Caller is neither passenger nor matched driver of the ride
    #[error("Caller {caller:?} is not a party of ride {ride_id}")]
    NotRideParticipant {
        /// Ride id
        ride_id: u64,
        /// Calling account
        caller: ethers::types::Address,
    },

    /// Ride has not been completed
    #[error("Ride {0} is not completed")]
    RideNotCompleted(u64),

    /// Fare already flagged as disputed
    #[error("Fare of ride {0} is already disputed")]
    AlreadyDisputed(u64),

    /// Decryption already requested for the ride
    #[error("Fare decryption already requested for ride {0}")]
    DecryptionAlreadyRequested(u64),

    /// Ride has no pending decryption
    #[error("No fare decryption pending for ride {0}")]
    NoDecryptionPending(u64),

    /// Callback for a request id the ledger does not know
    #[error("Unknown decryption request {0}")]
    UnknownDecryptionRequest(u64),

    /// Oracle signatures did not verify
    #[error("Invalid decryption proof for request {0}")]
    InvalidDecryptionProof(u64),

    /// Decrypted payload is malformed
    #[error("Invalid plaintext payload: {0}")]
    InvalidPlaintext(String),

    /// Timeout has not elapsed yet
    #[error("Timeout not reached for ride {ride_id}: claimable at {claimable_at}")]
    TimeoutNotReached {
        /// Ride id
        ride_id: u64,
        /// Earliest time the claim succeeds
        claimable_at: chrono::DateTime<chrono::Utc>,
    },

    /// Fare already revealed for the ride
    #[error("Fare of ride {0} is already revealed")]
    FareAlreadyRevealed(u64),

    /// Decryption-timeout refund already paid
    #[error("Refund already processed for ride {0}")]
    RefundAlreadyProcessed(u64),

    /// Driver has no deposit left
    #[error("No deposit to withdraw for {0:?}")]
    NoDepositToWithdraw(ethers::types::Address),

    /// Driver must complete a ride before withdrawing
    #[error("Driver {0:?} has not completed any ride")]
    NoCompletedRides(ethers::types::Address),

    /// Fee withdrawal exceeds the fee pool
    #[error("Insufficient platform fees: requested {requested} wei, available {available} wei")]
    InsufficientFees {
        /// Requested amount in wei
        requested: u128,
        /// Fee pool in wei
        available: u128,
    },

    /// Payout exceeds the native balance held by the ledger
    #[error("Insufficient ledger balance: requested {requested} wei, held {held} wei")]
    InsufficientLedgerBalance {
        /// Requested amount in wei
        requested: u128,
        /// Balance held in wei
        held: u128,
    },

    /// Value transfer rejected by the recipient or the transfer backend
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Value-moving entry point entered while another one is running
    #[error("Reentrant call rejected")]
    ReentrantCall,

    /// Arithmetic overflow occurred
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// Ciphertext engine or decryption oracle failure
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bincode error
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl LedgerError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;

        match self {
            NotOwner(_)
            | NotPauser(_)
            | NotMatchedDriver { .. }
            | NotPassenger { .. }
            | NotRideParticipant { .. }
            | UnregisteredDriver(_) => ErrorKind::Authorization,

            AlreadyPauser(_)
            | NotAPauser(_)
            | CannotRemoveOwner
            | InvalidAddress
            | Paused
            | AlreadyPaused
            | NotPaused
            | TestingModeDisabled
            | AlreadyRegistered(_)
            | RideNotActive(_)
            | AlreadyMatched(_)
            | RideAlreadyMatched(_)
            | DriverUnavailable(_)
            | RideNotCompleted(_)
            | AlreadyDisputed(_)
            | DecryptionAlreadyRequested(_)
            | NoDecryptionPending(_)
            | TimeoutNotReached { .. }
            | FareAlreadyRevealed(_)
            | RefundAlreadyProcessed(_)
            | NoCompletedRides(_)
            | ReentrantCall => ErrorKind::State,

            InsufficientDeposit { .. }
            | NonPayable(_)
            | NoDepositToWithdraw(_)
            | InsufficientFees { .. }
            | InsufficientLedgerBalance { .. }
            | TransferFailed(_)
            | ArithmeticOverflow => ErrorKind::Resource,

            UnknownDecryptionRequest(_) | InvalidDecryptionProof(_) | InvalidPlaintext(_) => {
                ErrorKind::Oracle
            }

            Engine(_) | Config(_) | Io(_) | Json(_) | Bincode(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Convert a string error to a ConfigError
pub fn to_config_error<E: std::fmt::Display>(err: E) -> LedgerError {
    LedgerError::Config(err.to_string())
}
