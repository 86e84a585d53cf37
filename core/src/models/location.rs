//! Encrypted coordinates

use serde::{Serialize, Deserialize};

use crate::fhe::Euint32;

/// A pair of encrypted coordinates
///
/// Coordinates are opaque to the ledger; they are stored and re-shared, never compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedLocation {
    /// Encrypted latitude
    pub latitude: Euint32,

    /// Encrypted longitude
    pub longitude: Euint32,

    /// Whether the location was assigned
    pub is_set: bool,
}

impl EncryptedLocation {
    /// Create a set location
    pub fn new(latitude: Euint32, longitude: Euint32) -> Self {
        EncryptedLocation {
            latitude,
            longitude,
            is_set: true,
        }
    }
}
