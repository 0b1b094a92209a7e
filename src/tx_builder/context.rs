//! Execution context for transaction building
//!
//! An [`ExecutionContext`] is the resolved state a transaction is built
//! against: which key signs, with which nonce, anchored to which block. It
//! is produced fresh for every signing attempt, so a retry after a nonce
//! conflict never reuses the values of a rejected transaction.

use crate::nonce_manager::ResolvedKey;
use crate::observability::TraceContext;
use crate::keys::PublicKey;
use crate::types::{AccountId, CryptoHash, WaitUntil};

use super::actions::Action;
use super::transaction::Transaction;

/// Resolved key, nonce and block hash for one signing attempt
#[derive(Clone)]
pub struct ExecutionContext {
    pub signer_id: AccountId,

    pub public_key: PublicKey,

    /// Strictly above the access key's on-chain nonce
    pub nonce: u64,

    /// Hash of a recent final block
    pub block_hash: CryptoHash,

    pub wait_until: WaitUntil,

    pub trace_context: TraceContext,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("signer_id", &self.signer_id)
            .field("public_key", &self.public_key)
            .field("nonce", &self.nonce)
            .field("block_hash", &self.block_hash)
            .field("wait_until", &self.wait_until)
            .field(
                "trace_context",
                &format!(
                    "trace_id={}, span_id={}",
                    self.trace_context.trace_id(),
                    self.trace_context.span_id()
                ),
            )
            .finish()
    }
}

impl ExecutionContext {
    pub fn new(
        resolved: ResolvedKey,
        block_hash: CryptoHash,
        wait_until: WaitUntil,
        trace_context: TraceContext,
    ) -> Self {
        Self {
            signer_id: resolved.signer_id,
            public_key: resolved.public_key,
            nonce: resolved.nonce,
            block_hash,
            wait_until,
            trace_context,
        }
    }

    /// Unsigned transaction carrying `actions` to `receiver_id`
    pub fn transaction(&self, receiver_id: AccountId, actions: Vec<Action>) -> Transaction {
        Transaction::new(
            self.signer_id.clone(),
            self.public_key.clone(),
            self.nonce,
            receiver_id,
            self.block_hash,
            actions,
        )
    }
}
