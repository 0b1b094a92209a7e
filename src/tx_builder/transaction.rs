//! Transactions and signed transactions
//!
//! The hash of a transaction is `sha256(borsh(tx))`; that hash is what the
//! signer signs and what the ledger reports back as the transaction id.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use super::actions::Action;
use crate::codec::{decode, encode, WireError, WireResult};
use crate::keys::{KeyPair, PublicKey, Signature};
use crate::types::{AccountId, CryptoHash};

/// Unsigned transaction. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Transaction {
    pub signer_id: AccountId,
    pub public_key: PublicKey,
    pub nonce: u64,
    pub receiver_id: AccountId,
    /// Recent block hash bounding the validity window
    pub block_hash: CryptoHash,
    pub actions: Vec<Action>,
}

impl Transaction {
    pub fn new(
        signer_id: AccountId,
        public_key: PublicKey,
        nonce: u64,
        receiver_id: AccountId,
        block_hash: CryptoHash,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            signer_id,
            public_key,
            nonce,
            receiver_id,
            block_hash,
            actions,
        }
    }

    pub fn to_bytes(&self) -> WireResult<Vec<u8>> {
        encode(self)
    }

    /// `sha256` of the wire bytes
    pub fn get_hash(&self) -> WireResult<CryptoHash> {
        Ok(CryptoHash::hash(&self.to_bytes()?))
    }

    /// Hash plus byte length, as reported in fee estimation
    pub fn get_hash_and_size(&self) -> WireResult<(CryptoHash, u64)> {
        let bytes = self.to_bytes()?;
        Ok((CryptoHash::hash(&bytes), bytes.len() as u64))
    }

    /// Attach an externally produced signature
    pub fn with_signature(self, signature: Signature) -> SignedTransaction {
        SignedTransaction {
            transaction: self,
            signature,
        }
    }

    /// Sign the transaction hash with `key`
    pub fn sign(self, key: &KeyPair) -> Result<SignedTransaction, crate::keys::KeyError> {
        let hash = self
            .get_hash()
            .map_err(|e| crate::keys::KeyError::Signing(e.to_string()))?;
        let signature = key.sign(hash.as_bytes())?;
        Ok(self.with_signature(signature))
    }
}

/// Transaction plus signature; wire form is `borsh(tx) ‖ borsh(signature)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Signature,
}

impl SignedTransaction {
    /// Same as the inner transaction's hash
    pub fn get_hash(&self) -> WireResult<CryptoHash> {
        self.transaction.get_hash()
    }

    /// Verify the signature against the transaction's public key
    pub fn verify(&self) -> bool {
        match self.transaction.get_hash() {
            Ok(hash) => self
                .transaction
                .public_key
                .verify(hash.as_bytes(), &self.signature),
            Err(_) => false,
        }
    }

    pub fn to_bytes(&self) -> WireResult<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> WireResult<Self> {
        decode(bytes)
    }

    /// Base64 of the wire bytes, the form `send_tx` takes
    pub fn to_base64(&self) -> WireResult<String> {
        Ok(BASE64.encode(self.to_bytes()?))
    }

    pub fn from_base64(encoded: &str) -> WireResult<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| WireError::malformed("SignedTransaction", e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}
