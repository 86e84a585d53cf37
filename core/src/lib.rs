//! # Private Ride Core
//!
//! Ride/driver state machine for the Private Ride Ledger.
//!
//! Drivers and passengers submit locations and fares as ciphertext handles. The ledger
//! matches them with homomorphic comparisons, settles fares through an asynchronous
//! decrypt-and-callback protocol, and keeps deposits and platform fees consistent under
//! partial failure. The homomorphic engine, the decryption oracle and native value
//! transfers are collaborators injected into [`Ledger`] through the traits in [`fhe`]
//! and [`treasury`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod access;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fhe;
pub mod ledger;
pub mod models;
pub mod registry;
pub mod storage;
pub mod treasury;
pub mod utils;

/// Re-export common types for ease of use
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, Result};
pub use fhe::{DecryptionOracle, Ebool, Euint32, Euint64, ExternalEuint32, FheEngine, Handle, InputProof, RequestId};
pub use ledger::{CallContext, DecryptionStatus, Ledger, LedgerState};
pub use models::{CompletedRide, Driver, EncryptedLocation, EventRecord, LedgerEvent, RideRequest};
pub use treasury::{InMemoryTreasury, ValueTransfer};

/// Ethereum-style account address used for every participant
pub use ethers::types::Address;

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One ether expressed in wei
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;
