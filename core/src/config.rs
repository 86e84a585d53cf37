//! Configuration for the core crate
//!
//! This module provides the economic and timing parameters of the ledger:
//! deposits, timeouts, fee rate and obfuscation ranges.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::error::{LedgerError, Result};

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Minimum deposit (in wei) for driver registration and ride requests
    pub min_deposit: u128,

    /// Time after which an unmatched ride request can be refunded
    pub request_timeout: Duration,

    /// Time after which a pending fare decryption can be refunded
    pub decryption_timeout: Duration,

    /// Platform fee taken from revealed fares, in percent
    pub platform_fee_percent: u8,

    /// Upper bound of the multiplier applied to both sides of the fare comparison
    pub privacy_multiplier_range: u32,

    /// Upper bound of the decoy multiplier applied to stored final fares
    pub fare_obfuscation_range: u64,

    /// Initial value of the testing flag
    pub testing_mode: bool,

    /// Log level
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            min_deposit: 1_000_000_000_000_000, // 0.001 ETH
            request_timeout: Duration::from_secs(60 * 60),
            decryption_timeout: Duration::from_secs(30 * 60),
            platform_fee_percent: 5,
            privacy_multiplier_range: 1000,
            fare_obfuscation_range: 100,
            testing_mode: false,
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: LedgerConfig = serde_json::from_reader(file)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;

        Ok(())
    }

    /// Check that the parameters describe a usable ledger
    pub fn validate(&self) -> Result<()> {
        if self.min_deposit == 0 {
            return Err(LedgerError::Config("min_deposit must be greater than zero".into()));
        }
        if self.platform_fee_percent > 100 {
            return Err(LedgerError::Config(format!(
                "platform_fee_percent must be at most 100, got {}",
                self.platform_fee_percent
            )));
        }
        if self.privacy_multiplier_range == 0 || self.fare_obfuscation_range == 0 {
            return Err(LedgerError::Config("obfuscation ranges must be at least 1".into()));
        }
        if self.request_timeout.is_zero() || self.decryption_timeout.is_zero() {
            return Err(LedgerError::Config("timeouts must be greater than zero".into()));
        }

        Ok(())
    }

    /// Request timeout as a chrono duration
    pub fn request_timeout_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.request_timeout).unwrap_or(chrono::Duration::MAX)
    }

    /// Decryption timeout as a chrono duration
    pub fn decryption_timeout_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.decryption_timeout).unwrap_or(chrono::Duration::MAX)
    }

    /// Create a development configuration
    pub fn development() -> Self {
        let mut config = Self::default();
        config.testing_mode = true;
        config.log_level = "debug".to_string();
        config
    }

    /// Create a production configuration
    pub fn production() -> Self {
        let mut config = Self::default();
        config.testing_mode = false;
        config.log_level = "info".to_string();
        config
    }

    /// Create a testing configuration
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.testing_mode = true;
        config.log_level = "debug".to_string();
        config
    }
}
