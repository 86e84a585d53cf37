//! Private Ride Ledger - privacy-preserving ride matching over encrypted fares and locations
//!
//! This is the root crate that provides workspace-level documentation.
//! The implementation lives in the `private-ride-core` subcrate and is re-exported here.

pub use private_ride_core::*;

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
