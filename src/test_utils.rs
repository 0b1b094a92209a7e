//! Test Utilities Module
//!
//! In-memory [`RpcProvider`] and outcome fixtures for deterministic tests of
//! the signing and submission pipeline.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::keys::PublicKey;
use crate::rpc_manager::rpc_types::{
    AccessKeyDetails, AccessKeyInfoView, BlockHeaderView, ExecutionOutcomeWithId, SyncInfo,
};
use crate::rpc_manager::{
    AccessKeyListView, AccessKeyPermissionView, AccessKeyView, BlockView, ExecutionOutcome,
    ExecutionStatus, FinalExecutionOutcome, FinalExecutionStatus, RpcError, RpcProvider, RpcResult,
    StatusResponse,
};
use crate::tx_builder::transaction::SignedTransaction;
use crate::types::{AccountId, BlockReference, CryptoHash, Gas, NearToken, WaitUntil};

#[derive(Default)]
struct MockState {
    access_keys: HashMap<PublicKey, AccessKeyDetails>,
    block_height: u64,
    send_results: VecDeque<RpcResult<FinalExecutionOutcome>>,
    status_results: VecDeque<RpcResult<FinalExecutionOutcome>>,
    sent: Vec<SignedTransaction>,
}

/// Scripted ledger.
///
/// Access keys are looked up by public key regardless of account. Queued
/// `send_tx` / `tx` results are consumed in order; once empty, calls
/// succeed with [`success_outcome`].
#[derive(Default)]
pub struct MockRpcProvider {
    state: Mutex<MockState>,
    access_key_queries: AtomicUsize,
}

impl MockRpcProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a full-access key with the given on-chain nonce
    pub fn set_access_key_nonce(&self, public_key: &PublicKey, nonce: u64) {
        self.set_access_key(public_key, nonce, AccessKeyPermissionView::FullAccess);
    }

    pub fn set_access_key(&self, public_key: &PublicKey, nonce: u64, permission: AccessKeyPermissionView) {
        self.state
            .lock()
            .access_keys
            .insert(public_key.clone(), AccessKeyDetails { nonce, permission });
    }

    pub fn set_block_height(&self, height: u64) {
        self.state.lock().block_height = height;
    }

    /// Hash of the current mock block
    pub fn block_hash(&self) -> CryptoHash {
        block_hash_at(self.state.lock().block_height)
    }

    pub fn push_send_result(&self, result: RpcResult<FinalExecutionOutcome>) {
        self.state.lock().send_results.push_back(result);
    }

    pub fn push_status_result(&self, result: RpcResult<FinalExecutionOutcome>) {
        self.state.lock().status_results.push_back(result);
    }

    /// Every signed transaction handed to `send_tx`, in order
    pub fn sent_transactions(&self) -> Vec<SignedTransaction> {
        self.state.lock().sent.clone()
    }

    pub fn access_key_queries(&self) -> usize {
        self.access_key_queries.load(Ordering::SeqCst)
    }
}

fn block_hash_at(height: u64) -> CryptoHash {
    CryptoHash::hash(&height.to_le_bytes())
}

#[async_trait]
impl RpcProvider for MockRpcProvider {
    async fn block(&self, _reference: &BlockReference) -> RpcResult<BlockView> {
        let height = self.state.lock().block_height;
        Ok(BlockView {
            author: None,
            header: BlockHeaderView {
                height,
                hash: block_hash_at(height),
                prev_hash: None,
                timestamp: 0,
            },
        })
    }

    async fn view_access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
        _reference: &BlockReference,
    ) -> RpcResult<AccessKeyView> {
        self.access_key_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        let details = state
            .access_keys
            .get(public_key)
            .ok_or_else(|| RpcError::AccessKeyDoesNotExist {
                account_id: account_id.to_string(),
                public_key: public_key.to_string(),
            })?;
        Ok(AccessKeyView {
            nonce: details.nonce,
            permission: details.permission.clone(),
            block_height: state.block_height,
            block_hash: block_hash_at(state.block_height),
        })
    }

    async fn view_access_key_list(
        &self,
        _account_id: &AccountId,
        _reference: &BlockReference,
    ) -> RpcResult<AccessKeyListView> {
        let state = self.state.lock();
        Ok(AccessKeyListView {
            keys: state
                .access_keys
                .iter()
                .map(|(public_key, access_key)| AccessKeyInfoView {
                    public_key: public_key.clone(),
                    access_key: access_key.clone(),
                })
                .collect(),
            block_height: state.block_height,
            block_hash: block_hash_at(state.block_height),
        })
    }

    async fn send_tx(
        &self,
        signed: &SignedTransaction,
        _wait_until: WaitUntil,
    ) -> RpcResult<FinalExecutionOutcome> {
        let mut state = self.state.lock();
        state.sent.push(signed.clone());
        match state.send_results.pop_front() {
            Some(result) => result,
            None => {
                let mut outcome = success_outcome();
                if let (Some(tx_outcome), Ok(hash)) =
                    (outcome.transaction_outcome.as_mut(), signed.get_hash())
                {
                    tx_outcome.id = hash;
                }
                Ok(outcome)
            }
        }
    }

    async fn tx_status(
        &self,
        _tx_hash: &CryptoHash,
        _sender_id: &AccountId,
        _wait_until: WaitUntil,
    ) -> RpcResult<FinalExecutionOutcome> {
        self.state
            .lock()
            .status_results
            .pop_front()
            .unwrap_or_else(|| Ok(success_outcome()))
    }

    async fn status(&self) -> RpcResult<StatusResponse> {
        let height = self.state.lock().block_height;
        Ok(StatusResponse {
            chain_id: "mocknet".to_string(),
            protocol_version: 0,
            sync_info: SyncInfo {
                latest_block_hash: block_hash_at(height),
                latest_block_height: height,
                latest_block_time: None,
                syncing: false,
            },
        })
    }
}

fn receipt(status: ExecutionStatus, logs: Vec<String>) -> ExecutionOutcomeWithId {
    receipt_executed_by("receiver.near".parse().expect("valid account id"), status, logs)
}

fn receipt_executed_by(
    executor_id: AccountId,
    status: ExecutionStatus,
    logs: Vec<String>,
) -> ExecutionOutcomeWithId {
    ExecutionOutcomeWithId {
        id: CryptoHash::hash(b"receipt"),
        outcome: ExecutionOutcome {
            executor_id,
            gas_burnt: Gas::from_gas(Gas::ONE_TERA),
            tokens_burnt: NearToken::default(),
            logs,
            receipt_ids: Vec::new(),
            status,
        },
        block_hash: None,
    }
}

/// Final outcome with an empty success value
pub fn success_outcome() -> FinalExecutionOutcome {
    FinalExecutionOutcome {
        final_execution_status: Some(WaitUntil::ExecutedOptimistic),
        status: FinalExecutionStatus::SuccessValue(String::new()),
        transaction_outcome: Some(ExecutionOutcomeWithId {
            id: CryptoHash::hash(b"transaction"),
            ..receipt(
                ExecutionStatus::SuccessReceiptId(CryptoHash::hash(b"receipt")),
                Vec::new(),
            )
        }),
        receipts_outcome: vec![receipt(ExecutionStatus::SuccessValue(String::new()), Vec::new())],
    }
}

/// Final outcome failing with `failure` in the transaction's own receipt,
/// executed by `executor_id` and carrying `logs`
pub fn failure_outcome(
    executor_id: &AccountId,
    failure: serde_json::Value,
    logs: Vec<String>,
) -> FinalExecutionOutcome {
    FinalExecutionOutcome {
        final_execution_status: Some(WaitUntil::ExecutedOptimistic),
        status: FinalExecutionStatus::Failure(failure.clone()),
        transaction_outcome: success_outcome().transaction_outcome,
        receipts_outcome: vec![receipt_executed_by(
            executor_id.clone(),
            ExecutionStatus::Failure(failure),
            logs,
        )],
    }
}

/// Final outcome whose first receipt, run by `receiver_id`, hands off to a
/// second receipt on `downstream_id` that fails with `failure`
pub fn downstream_failure_outcome(
    receiver_id: &AccountId,
    downstream_id: &AccountId,
    failure: serde_json::Value,
    logs: Vec<String>,
) -> FinalExecutionOutcome {
    let downstream = ExecutionOutcomeWithId {
        id: CryptoHash::hash(b"downstream receipt"),
        ..receipt_executed_by(downstream_id.clone(), ExecutionStatus::Failure(failure.clone()), logs)
    };
    let first = receipt_executed_by(
        receiver_id.clone(),
        ExecutionStatus::SuccessReceiptId(downstream.id),
        Vec::new(),
    );
    FinalExecutionOutcome {
        final_execution_status: Some(WaitUntil::ExecutedOptimistic),
        status: FinalExecutionStatus::Failure(failure),
        transaction_outcome: success_outcome().transaction_outcome,
        receipts_outcome: vec![first, downstream],
    }
}
