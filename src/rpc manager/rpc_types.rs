//! JSON-RPC response shapes
//!
//! Only the fields the submission pipeline reads are modelled; unknown
//! fields are ignored so newer nodes stay compatible.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::keys::PublicKey;
use crate::types::{AccountId, CryptoHash, Gas, NearToken, WaitUntil};

/// `query` / `view_access_key` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyView {
    pub nonce: u64,
    pub permission: AccessKeyPermissionView,
    pub block_height: u64,
    pub block_hash: CryptoHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyDetails {
    pub nonce: u64,
    pub permission: AccessKeyPermissionView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKeyPermissionView {
    FullAccess,
    FunctionCall {
        allowance: Option<NearToken>,
        receiver_id: AccountId,
        method_names: Vec<String>,
    },
}

impl AccessKeyPermissionView {
    pub fn is_full_access(&self) -> bool {
        matches!(self, AccessKeyPermissionView::FullAccess)
    }
}

/// `query` / `view_access_key_list` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyListView {
    pub keys: Vec<AccessKeyInfoView>,
    pub block_height: u64,
    pub block_hash: CryptoHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeyInfoView {
    pub public_key: PublicKey,
    pub access_key: AccessKeyDetails,
}

/// `block` result, header only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    #[serde(default)]
    pub author: Option<AccountId>,
    pub header: BlockHeaderView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderView {
    pub height: u64,
    pub hash: CryptoHash,
    #[serde(default)]
    pub prev_hash: Option<CryptoHash>,
    /// Nanoseconds since the unix epoch
    #[serde(default)]
    pub timestamp: u64,
}

/// `status` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub chain_id: String,
    #[serde(default)]
    pub protocol_version: u32,
    pub sync_info: SyncInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInfo {
    pub latest_block_hash: CryptoHash,
    pub latest_block_height: u64,
    #[serde(default)]
    pub latest_block_time: Option<String>,
    pub syncing: bool,
}

/// Overall transaction status.
///
/// Failures are kept as raw JSON; [`super::rpc_errors::classify_outcome_failure`]
/// turns them into typed errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum FinalExecutionStatus {
    #[default]
    NotStarted,
    Started,
    Failure(serde_json::Value),
    /// Base64 return value of the last receipt
    SuccessValue(String),
}

/// Per-receipt status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Unknown,
    Pending,
    Failure(serde_json::Value),
    SuccessValue(String),
    SuccessReceiptId(CryptoHash),
}

impl ExecutionStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionStatus::Failure(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub executor_id: AccountId,
    #[serde(default)]
    pub gas_burnt: Gas,
    #[serde(default)]
    pub tokens_burnt: NearToken,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub receipt_ids: Vec<CryptoHash>,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcomeWithId {
    /// Transaction or receipt id
    pub id: CryptoHash,
    pub outcome: ExecutionOutcome,
    #[serde(default)]
    pub block_hash: Option<CryptoHash>,
}

/// Result of `send_tx` / `tx`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalExecutionOutcome {
    /// Wait level the node reached before answering
    #[serde(default)]
    pub final_execution_status: Option<WaitUntil>,
    #[serde(default)]
    pub status: FinalExecutionStatus,
    #[serde(default)]
    pub transaction_outcome: Option<ExecutionOutcomeWithId>,
    #[serde(default)]
    pub receipts_outcome: Vec<ExecutionOutcomeWithId>,
}

impl FinalExecutionOutcome {
    /// Outcome of a `NONE`-level submission, before any execution
    pub fn pending(wait_until: WaitUntil) -> Self {
        Self {
            final_execution_status: Some(wait_until),
            status: FinalExecutionStatus::NotStarted,
            transaction_outcome: None,
            receipts_outcome: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, FinalExecutionStatus::SuccessValue(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, FinalExecutionStatus::Failure(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            FinalExecutionStatus::NotStarted | FinalExecutionStatus::Started
        )
    }

    pub fn failure(&self) -> Option<&serde_json::Value> {
        match &self.status {
            FinalExecutionStatus::Failure(err) => Some(err),
            _ => None,
        }
    }

    /// Decoded success value, if any
    pub fn success_value(&self) -> Option<Vec<u8>> {
        match &self.status {
            FinalExecutionStatus::SuccessValue(s) => BASE64.decode(s).ok(),
            _ => None,
        }
    }

    pub fn success_value_json<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.success_value()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    pub fn transaction_hash(&self) -> Option<&CryptoHash> {
        self.transaction_outcome.as_ref().map(|o| &o.id)
    }

    /// Logs of every receipt, in execution order
    pub fn logs(&self) -> Vec<&str> {
        self.receipts_outcome
            .iter()
            .flat_map(|r| r.outcome.logs.iter().map(String::as_str))
            .collect()
    }

    /// Receipt the transaction itself produced
    pub fn first_receipt_id(&self) -> Option<&CryptoHash> {
        let tx = &self.transaction_outcome.as_ref()?.outcome;
        match &tx.status {
            ExecutionStatus::SuccessReceiptId(id) => Some(id),
            _ => tx.receipt_ids.first(),
        }
    }

    pub fn receipt(&self, id: &CryptoHash) -> Option<&ExecutionOutcomeWithId> {
        self.receipts_outcome.iter().find(|r| r.id == *id)
    }

    /// Receipt whose failure became the transaction's status.
    ///
    /// Follows the `SuccessReceiptId` chain from the transaction. Without a
    /// usable chain, falls back to a receipt failing with the same error.
    pub fn failing_receipt(&self) -> Option<&ExecutionOutcomeWithId> {
        let failure = self.failure()?;

        let mut next = self.first_receipt_id();
        // Bounded so a malformed response cannot loop
        for _ in 0..=self.receipts_outcome.len() {
            let Some(receipt) = next.and_then(|id| self.receipt(id)) else {
                break;
            };
            match &receipt.outcome.status {
                ExecutionStatus::Failure(_) => return Some(receipt),
                ExecutionStatus::SuccessReceiptId(id) => next = Some(id),
                _ => break,
            }
        }

        self.receipts_outcome
            .iter()
            .find(|r| matches!(&r.outcome.status, ExecutionStatus::Failure(f) if f == failure))
    }

    pub fn total_gas_burnt(&self) -> Gas {
        let tx_gas = self
            .transaction_outcome
            .as_ref()
            .map(|o| o.outcome.gas_burnt.as_gas())
            .unwrap_or(0);
        let receipts: u64 = self
            .receipts_outcome
            .iter()
            .map(|r| r.outcome.gas_burnt.as_gas())
            .fold(0u64, u64::saturating_add);
        Gas::from_gas(tx_gas.saturating_add(receipts))
    }
}
