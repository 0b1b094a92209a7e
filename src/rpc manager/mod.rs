//! RPC Manager Module
//!
//! The [`RpcProvider`] trait is the seam between the submission pipeline and
//! the ledger; [`JsonRpcClient`] implements it over HTTP JSON-RPC with
//! endpoint failover.

use async_trait::async_trait;

use crate::keys::PublicKey;
use crate::tx_builder::transaction::SignedTransaction;
use crate::types::{AccountId, BlockReference, CryptoHash, WaitUntil};

// Submodules
pub mod rpc_config;
pub mod rpc_errors;
pub mod rpc_pool;
pub mod rpc_types;

// Re-exports for convenience
pub use rpc_config::{ConfigError, RpcEndpointConfig, RpcManagerConfig};
pub use rpc_errors::{classify_failure, classify_outcome_failure, RetryPolicy, RpcError, RpcResult};
pub use rpc_pool::JsonRpcClient;
pub use rpc_types::{
    AccessKeyListView, AccessKeyPermissionView, AccessKeyView, BlockView, ExecutionOutcome,
    ExecutionOutcomeWithId, ExecutionStatus, FinalExecutionOutcome, FinalExecutionStatus,
    StatusResponse,
};

/// Read and submit operations the pipeline needs from a ledger node
#[async_trait]
pub trait RpcProvider: Send + Sync {
    /// Block at `reference`
    async fn block(&self, reference: &BlockReference) -> RpcResult<BlockView>;

    async fn view_access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
        reference: &BlockReference,
    ) -> RpcResult<AccessKeyView>;

    async fn view_access_key_list(
        &self,
        account_id: &AccountId,
        reference: &BlockReference,
    ) -> RpcResult<AccessKeyListView>;

    /// Submit and wait until `wait_until` is reached
    async fn send_tx(
        &self,
        signed: &SignedTransaction,
        wait_until: WaitUntil,
    ) -> RpcResult<FinalExecutionOutcome>;

    /// Outcome of an already submitted transaction
    async fn tx_status(
        &self,
        tx_hash: &CryptoHash,
        sender_id: &AccountId,
        wait_until: WaitUntil,
    ) -> RpcResult<FinalExecutionOutcome>;

    async fn status(&self) -> RpcResult<StatusResponse>;
}
