//! Data models for the Private Ride Ledger
//!
//! This module provides the entities stored by the registry (drivers, ride requests,
//! completed rides) and the events appended to the audit log.

mod location;
mod driver;
mod ride;
mod completed;
mod event;

pub use location::EncryptedLocation;
pub use driver::Driver;
pub use ride::RideRequest;
pub use completed::CompletedRide;
pub use event::{EventRecord, LedgerEvent};
