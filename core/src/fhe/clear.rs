//! Plaintext-simulating engine and oracle
//!
//! [`ClearEngine`] keeps every value in the clear behind an opaque handle and enforces
//! the same contract as a real FHE coprocessor: input proofs bind ciphertexts to the
//! ledger and the sender, arithmetic wraps at the integer width, only allowed accounts
//! can get a ciphertext decrypted, and decryption results carry signatures the engine
//! can check. [`ClearOracle`] queues requests and answers them on demand, which lets
//! tests and testing-mode deployments drive the asynchronous callback path by hand.

use std::collections::{BTreeMap, HashMap, HashSet};
use ethers::types::Address;
use log::debug;

use crate::crypto::{self, domains};
use super::{
    encode_cleartext_u64, DecryptionOracle, Ebool, EngineError, Euint32, Euint64, ExternalEuint32,
    FheEngine, Handle, InputProof, RequestId,
};

/// Plaintext-backed implementation of [`FheEngine`]
#[derive(Debug, Clone)]
pub struct ClearEngine {
    values: HashMap<Handle, u64>,
    acl: HashSet<(Handle, Address)>,
    input_batches: HashMap<Handle, Vec<Handle>>,
    gateway_key: [u8; 32],
    nonce: u64,
}

impl ClearEngine {
    /// Create an engine whose decryption results are signed with `gateway_key`
    pub fn new(gateway_key: [u8; 32]) -> Self {
        ClearEngine {
            values: HashMap::new(),
            acl: HashSet::new(),
            input_batches: HashMap::new(),
            gateway_key,
            nonce: 0,
        }
    }

    fn fresh_handle(&mut self) -> Handle {
        self.nonce += 1;
        Handle(crypto::keccak_multiple(
            domains::HANDLE,
            &[&self.gateway_key, &self.nonce.to_be_bytes()],
        ))
    }

    fn store(&mut self, value: u64) -> Handle {
        let handle = self.fresh_handle();
        self.values.insert(handle, value);
        handle
    }

    fn value(&self, handle: Handle) -> Result<u64, EngineError> {
        self.values
            .get(&handle)
            .copied()
            .ok_or(EngineError::UnknownCiphertext(handle))
    }

    fn batch_proof(ledger: Address, sender: Address, handles: &[Handle]) -> [u8; 32] {
        let mut parts: Vec<&[u8]> = vec![ledger.as_bytes(), sender.as_bytes()];
        parts.extend(handles.iter().map(|h| h.as_bytes().as_slice()));
        crypto::keccak_multiple(domains::INPUT_PROOF, &parts)
    }

    /// Encrypt a batch of 32-bit inputs for `sender` calling `ledger`
    ///
    /// Returns the external ciphertexts and one proof covering the whole batch.
    pub fn encrypt_inputs(
        &mut self,
        values: &[u32],
        ledger: Address,
        sender: Address,
    ) -> (Vec<ExternalEuint32>, InputProof) {
        let handles: Vec<Handle> = values.iter().map(|&v| self.store(v as u64)).collect();
        let proof = Self::batch_proof(ledger, sender, &handles);

        for handle in &handles {
            self.input_batches.insert(*handle, handles.clone());
        }

        (
            handles.into_iter().map(ExternalEuint32).collect(),
            InputProof(proof.to_vec()),
        )
    }

    /// Sign a decryption result the way the oracle's signers would
    pub fn sign_decryption(&self, request_id: RequestId, cleartexts: &[u8]) -> [u8; 32] {
        crypto::keccak_multiple(
            domains::DECRYPTION,
            &[&self.gateway_key, &request_id.to_be_bytes(), cleartexts],
        )
    }

    /// Plaintext behind a handle
    pub fn plaintext(&self, handle: Handle) -> Option<u64> {
        self.values.get(&handle).copied()
    }

    /// Whether `account` may use the ciphertext
    pub fn is_allowed(&self, handle: Handle, account: Address) -> bool {
        self.acl.contains(&(handle, account))
    }
}

impl FheEngine for ClearEngine {
    fn ingest_u32(
        &mut self,
        input: ExternalEuint32,
        proof: &InputProof,
        ledger: Address,
        sender: Address,
    ) -> Result<Euint32, EngineError> {
        let handle = input.handle();
        let batch = self
            .input_batches
            .get(&handle)
            .ok_or(EngineError::UnknownCiphertext(handle))?;

        let expected = Self::batch_proof(ledger, sender, batch);
        if !crypto::verify_digest(&expected, proof.as_bytes()) {
            return Err(EngineError::InvalidInputProof(handle));
        }

        self.acl.insert((handle, ledger));
        Ok(Euint32(handle))
    }

    fn add_u64(&mut self, lhs: Euint64, rhs: Euint64) -> Result<Euint64, EngineError> {
        let sum = self.value(lhs.handle())?.wrapping_add(self.value(rhs.handle())?);
        Ok(Euint64(self.store(sum)))
    }

    fn mul_u32_scalar(&mut self, value: Euint32, scalar: u32) -> Result<Euint32, EngineError> {
        let product = (self.value(value.handle())? as u32).wrapping_mul(scalar);
        Ok(Euint32(self.store(product as u64)))
    }

    fn mul_u64_scalar(&mut self, value: Euint64, scalar: u64) -> Result<Euint64, EngineError> {
        let product = self.value(value.handle())?.wrapping_mul(scalar);
        Ok(Euint64(self.store(product)))
    }

    fn ge_u32(&mut self, lhs: Euint32, rhs: Euint32) -> Result<Ebool, EngineError> {
        let result = self.value(lhs.handle())? >= self.value(rhs.handle())?;
        Ok(Ebool(self.store(result as u64)))
    }

    fn cast_u32_to_u64(&mut self, value: Euint32) -> Result<Euint64, EngineError> {
        let widened = self.value(value.handle())?;
        Ok(Euint64(self.store(widened)))
    }

    fn allow(&mut self, handle: Handle, account: Address) -> Result<(), EngineError> {
        if !self.values.contains_key(&handle) {
            return Err(EngineError::UnknownCiphertext(handle));
        }
        self.acl.insert((handle, account));
        Ok(())
    }

    fn check_signatures(&self, request_id: RequestId, cleartexts: &[u8], proof: &[u8]) -> bool {
        let expected = self.sign_decryption(request_id, cleartexts);
        crypto::verify_digest(&expected, proof)
    }
}

/// Answer to a decryption request, as delivered to the ledger's callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionResponse {
    /// Request being answered
    pub request_id: RequestId,

    /// One 32-byte word per requested handle
    pub cleartexts: Vec<u8>,

    /// Signatures over `(request_id, cleartexts)`
    pub signatures: Vec<u8>,
}

#[derive(Debug, Clone)]
struct PendingDecryption {
    handles: Vec<Handle>,
    requester: Address,
}

/// In-process decryption oracle that answers only when asked to
#[derive(Debug, Clone)]
pub struct ClearOracle {
    next_request_id: RequestId,
    pending: BTreeMap<RequestId, PendingDecryption>,
}

impl Default for ClearOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ClearOracle {
    /// Create an oracle with no queued requests; ids start at 1
    pub fn new() -> Self {
        ClearOracle {
            next_request_id: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Ids of the requests still waiting for an answer
    pub fn pending_requests(&self) -> Vec<RequestId> {
        self.pending.keys().copied().collect()
    }

    /// Decrypt a queued request and produce the signed callback payload
    ///
    /// Returns `None` for unknown requests and for requests whose requester is not
    /// allowed to decrypt every handle. The request is consumed either way.
    pub fn fulfill(&mut self, request_id: RequestId, engine: &ClearEngine) -> Option<DecryptionResponse> {
        let request = self.pending.remove(&request_id)?;

        let mut cleartexts = Vec::with_capacity(request.handles.len() * 32);
        for handle in &request.handles {
            if !engine.is_allowed(*handle, request.requester) {
                debug!("Oracle refused request {}: {} not allowed for {:?}", request_id, handle, request.requester);
                return None;
            }
            cleartexts.extend_from_slice(&encode_cleartext_u64(engine.plaintext(*handle)?));
        }

        let signatures = engine.sign_decryption(request_id, &cleartexts).to_vec();

        Some(DecryptionResponse {
            request_id,
            cleartexts,
            signatures,
        })
    }

    /// Forget a queued request, as if the oracle never answered
    pub fn drop_request(&mut self, request_id: RequestId) -> bool {
        self.pending.remove(&request_id).is_some()
    }
}

impl DecryptionOracle for ClearOracle {
    fn request_decryption(
        &mut self,
        handles: &[Handle],
        requester: Address,
    ) -> Result<RequestId, EngineError> {
        if handles.is_empty() {
            return Err(EngineError::RequestRejected("no ciphertexts to decrypt".into()));
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending.insert(
            request_id,
            PendingDecryption {
                handles: handles.to_vec(),
                requester,
            },
        );

        debug!("Queued decryption request {} for {} ciphertext(s)", request_id, handles.len());
        Ok(request_id)
    }
}
