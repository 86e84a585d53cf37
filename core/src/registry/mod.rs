//! Registry of drivers, ride requests and completed rides
//!
//! Single source of truth for entities and the indices used for matching and queries.
//! Records are never deleted; indices only drop references to them. Lookups of unknown
//! ids or addresses return the zero-valued default record rather than failing.

pub mod index;

use std::collections::{BTreeMap, HashMap};
use serde::{Serialize, Deserialize};
use ethers::types::Address;
use log::debug;

use crate::error::{LedgerError, Result};
use crate::models::{CompletedRide, Driver, RideRequest};
pub use index::SwapIndex;

/// Entity tables, indices and id counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    drivers: HashMap<Address, Driver>,
    rides: BTreeMap<u64, RideRequest>,
    completed: BTreeMap<u64, CompletedRide>,
    active_requests: SwapIndex<u64>,
    available_drivers: SwapIndex<Address>,
    passenger_history: HashMap<Address, Vec<u64>>,
    driver_history: HashMap<Address, Vec<u64>>,
    ride_counter: u64,
    driver_counter: u64,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ---- drivers ----

    /// Whether the address registered as a driver
    pub fn is_driver(&self, address: &Address) -> bool {
        self.drivers.contains_key(address)
    }

    /// Registered driver
    pub fn driver(&self, address: &Address) -> Option<&Driver> {
        self.drivers.get(address)
    }

    /// Registered driver, mutable
    pub fn driver_mut(&mut self, address: &Address) -> Option<&mut Driver> {
        self.drivers.get_mut(address)
    }

    /// Store a new driver and list it as available
    pub fn insert_driver(&mut self, address: Address, driver: Driver) -> Result<()> {
        if self.drivers.contains_key(&address) {
            return Err(LedgerError::AlreadyRegistered(address));
        }

        self.driver_counter = self
            .driver_counter
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if driver.available {
            self.available_drivers.insert(address);
        }
        self.drivers.insert(address, driver);

        debug!("Driver {:?} stored, {} driver(s) registered", address, self.driver_counter);
        Ok(())
    }

    /// List a driver in the available index
    pub fn list_available(&mut self, address: Address) {
        self.available_drivers.insert(address);
    }

    /// Drop a driver from the available index
    pub fn delist_available(&mut self, address: &Address) {
        self.available_drivers.remove(address);
    }

    /// Append a ride to a driver's history
    pub fn record_driver_ride(&mut self, driver: Address, ride_id: u64) {
        self.driver_history.entry(driver).or_default().push(ride_id);
    }

    // ---- ride requests ----

    /// Id the next ride request will receive
    pub fn next_ride_id(&self) -> Result<u64> {
        self.ride_counter.checked_add(1).ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Ride request by id
    pub fn ride(&self, ride_id: u64) -> Option<&RideRequest> {
        self.rides.get(&ride_id)
    }

    /// Ride request by id, mutable
    pub fn ride_mut(&mut self, ride_id: u64) -> Option<&mut RideRequest> {
        self.rides.get_mut(&ride_id)
    }

    /// Store a new ride request under [`Registry::next_ride_id`] and open it for matching
    pub fn insert_ride(&mut self, mut ride: RideRequest) -> Result<u64> {
        let ride_id = self.next_ride_id()?;
        ride.id = ride_id;

        self.active_requests.insert(ride_id);
        self.passenger_history.entry(ride.passenger).or_default().push(ride_id);
        self.rides.insert(ride_id, ride);
        self.ride_counter = ride_id;

        Ok(ride_id)
    }

    /// Put a request back in the active index
    pub fn reopen_request(&mut self, ride_id: u64) {
        self.active_requests.insert(ride_id);
    }

    /// Drop a request from the active index; the record stays
    pub fn close_request(&mut self, ride_id: u64) {
        self.active_requests.remove(&ride_id);
    }

    // ---- completed rides ----

    /// Completed ride by id
    pub fn completed(&self, ride_id: u64) -> Option<&CompletedRide> {
        self.completed.get(&ride_id)
    }

    /// Completed ride by id, mutable
    pub fn completed_mut(&mut self, ride_id: u64) -> Option<&mut CompletedRide> {
        self.completed.get_mut(&ride_id)
    }

    /// Store a completed ride
    pub fn insert_completed(&mut self, ride: CompletedRide) {
        self.completed.insert(ride.ride_id, ride);
    }

    // ---- queries ----

    /// Driver record, or the default record for unknown addresses
    pub fn driver_info(&self, address: &Address) -> Driver {
        self.drivers.get(address).cloned().unwrap_or_default()
    }

    /// Ride request, or the default record for unknown ids
    pub fn ride_details(&self, ride_id: u64) -> RideRequest {
        self.rides.get(&ride_id).cloned().unwrap_or_default()
    }

    /// Completed ride, or the default record for unknown ids
    pub fn completed_ride_info(&self, ride_id: u64) -> CompletedRide {
        self.completed.get(&ride_id).cloned().unwrap_or_default()
    }

    /// Number of open ride requests
    pub fn active_request_count(&self) -> usize {
        self.active_requests.len()
    }

    /// Number of available drivers
    pub fn available_driver_count(&self) -> usize {
        self.available_drivers.len()
    }

    /// Whether the driver is listed as available
    pub fn is_listed_available(&self, address: &Address) -> bool {
        self.available_drivers.contains(address)
    }

    /// Whether the request is in the active index
    pub fn is_request_open(&self, ride_id: u64) -> bool {
        self.active_requests.contains(&ride_id)
    }

    /// Rides requested by a passenger, oldest first
    pub fn passenger_history(&self, passenger: &Address) -> Vec<u64> {
        self.passenger_history.get(passenger).cloned().unwrap_or_default()
    }

    /// Rides accepted by a driver, oldest first
    pub fn driver_history(&self, driver: &Address) -> Vec<u64> {
        self.driver_history.get(driver).cloned().unwrap_or_default()
    }

    /// Number of ride requests ever created
    pub fn ride_counter(&self) -> u64 {
        self.ride_counter
    }

    /// Number of drivers ever registered
    pub fn driver_counter(&self) -> u64 {
        self.driver_counter
    }

    /// All ride requests, by id
    pub fn rides(&self) -> impl Iterator<Item = &RideRequest> {
        self.rides.values()
    }
}
