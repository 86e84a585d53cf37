//! Ciphertext handles and the homomorphic collaborators of the ledger
//!
//! The ledger never sees plaintext fares or coordinates. It holds opaque 32-byte
//! handles and asks an injected [`FheEngine`] to combine them, and an injected
//! [`DecryptionOracle`] to decrypt them out of band. The oracle answers later through
//! [`crate::Ledger::fare_decryption_callback`].

pub mod clear;

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use ethers::types::Address;

pub use clear::{ClearEngine, ClearOracle, DecryptionResponse};

/// Identifier of a decryption request; zero means "none requested"
pub type RequestId = u64;

/// Opaque reference to a ciphertext held by the engine
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub [u8; 32]);

impl Handle {
    /// The unset handle
    pub const ZERO: Handle = Handle([0u8; 32]);

    /// Whether the handle is unset
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Raw bytes of the handle
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Handle({})", self)
    }
}

impl Display for Handle {
    // Shortened: handles show up in every log line
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "0x{}", hex::encode(&self.0[..6]))
    }
}

macro_rules! ciphertext_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Handle);

        impl $name {
            /// Underlying handle
            pub fn handle(&self) -> Handle {
                self.0
            }

            /// Whether the ciphertext is unset
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }
        }
    };
}

ciphertext_type!(
    /// Encrypted 32-bit unsigned integer
    Euint32
);
ciphertext_type!(
    /// Encrypted 64-bit unsigned integer
    Euint64
);
ciphertext_type!(
    /// Encrypted boolean
    Ebool
);
ciphertext_type!(
    /// Encrypted 32-bit input submitted by a user, not yet validated
    ExternalEuint32
);

/// Zero-knowledge proof accompanying a batch of encrypted inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(pub Vec<u8>);

impl InputProof {
    /// Proof bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Errors raised by the ciphertext engine or the decryption oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Input proof does not bind the ciphertext to the ledger and the sender
    #[error("Invalid input proof for {0}")]
    InvalidInputProof(Handle),

    /// Handle is not known to the engine
    #[error("Unknown ciphertext {0}")]
    UnknownCiphertext(Handle),

    /// Account is not allowed to use the ciphertext
    #[error("Account {account:?} is not allowed to use {handle}")]
    AccessDenied {
        /// Ciphertext handle
        handle: Handle,
        /// Account that attempted the access
        account: Address,
    },

    /// Oracle refused or failed to queue the request
    #[error("Decryption request rejected: {0}")]
    RequestRejected(String),
}

/// Homomorphic arithmetic, comparison and access-control engine
///
/// All operations return fresh handles; inputs are never mutated. `allow` grants an
/// account the right to use (and request decryption of) a ciphertext.
#[cfg_attr(test, mockall::automock)]
pub trait FheEngine {
    /// Validate an encrypted input against its proof for `(ledger, sender)`
    fn ingest_u32(
        &mut self,
        input: ExternalEuint32,
        proof: &InputProof,
        ledger: Address,
        sender: Address,
    ) -> Result<Euint32, EngineError>;

    /// Encrypted addition
    fn add_u64(&mut self, lhs: Euint64, rhs: Euint64) -> Result<Euint64, EngineError>;

    /// Multiply an encrypted 32-bit value by a plaintext scalar
    fn mul_u32_scalar(&mut self, value: Euint32, scalar: u32) -> Result<Euint32, EngineError>;

    /// Multiply an encrypted 64-bit value by a plaintext scalar
    fn mul_u64_scalar(&mut self, value: Euint64, scalar: u64) -> Result<Euint64, EngineError>;

    /// Encrypted `lhs >= rhs`
    fn ge_u32(&mut self, lhs: Euint32, rhs: Euint32) -> Result<Ebool, EngineError>;

    /// Widen a 32-bit ciphertext to 64 bits
    fn cast_u32_to_u64(&mut self, value: Euint32) -> Result<Euint64, EngineError>;

    /// Grant `account` the right to use the ciphertext
    fn allow(&mut self, handle: Handle, account: Address) -> Result<(), EngineError>;

    /// Check the oracle signatures over a decryption result
    fn check_signatures(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> bool;
}

/// Client side of the asynchronous decryption oracle
#[cfg_attr(test, mockall::automock)]
pub trait DecryptionOracle {
    /// Queue decryption of `handles` on behalf of `requester` and return the request id
    ///
    /// The answer arrives later as a separate callback carrying the same id.
    fn request_decryption(
        &mut self,
        handles: &[Handle],
        requester: Address,
    ) -> Result<RequestId, EngineError>;
}

/// Encode a plaintext as one 32-byte big-endian word, the callback payload format
pub fn encode_cleartext_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decode a single 64-bit plaintext word
///
/// The payload must be exactly one word with its upper 24 bytes zero.
pub fn decode_cleartext_u64(payload: &[u8]) -> Option<u64> {
    if payload.len() != 32 || payload[..24].iter().any(|&b| b != 0) {
        return None;
    }

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&payload[24..]);
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_zero_handle() {
        assert!(Handle::ZERO.is_zero());
        assert!(Euint32::default().is_zero());
        assert!(!Handle([1; 32]).is_zero());
    }

    #[test]
    fn test_handle_display_is_short() {
        let handle = Handle([0xab; 32]);
        assert_eq!(handle.to_string(), "0xabababababab");
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(4_294_967_296)]
    #[case(u64::MAX)]
    fn test_cleartext_word(#[case] value: u64) {
        let word = encode_cleartext_u64(value);
        assert_eq!(decode_cleartext_u64(&word), Some(value));
    }

    #[test]
    fn test_malformed_cleartext() {
        assert_eq!(decode_cleartext_u64(&[0u8; 31]), None);
        assert_eq!(decode_cleartext_u64(&[0u8; 64]), None);

        let mut word = encode_cleartext_u64(10);
        word[0] = 1;
        assert_eq!(decode_cleartext_u64(&word), None);
    }
}
