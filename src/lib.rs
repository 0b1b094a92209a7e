//! NEAR transaction pipeline
//!
//! Builds, encodes, signs and submits NEAR transactions, delegate actions and
//! NEP-413 messages, with per-key nonce management and a failover JSON-RPC
//! client.

pub mod codec;
pub mod config;
pub mod keys;
pub mod keystore;
pub mod metrics;
pub mod mnemonic;
pub mod nep413;
pub mod observability;
pub mod structured_logging;
pub mod tx_builder;
pub mod types;
pub mod wallet;

// Component modules with non-standard paths (directories with spaces)
#[path = "nonce manager/mod.rs"]
pub mod nonce_manager;

#[path = "rpc manager/mod.rs"]
pub mod rpc_manager;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use keys::{KeyPair, KeyType, PublicKey, Signature};
pub use rpc_manager::{JsonRpcClient, RpcError, RpcProvider};
pub use tx_builder::{Action, SignedTransaction, Submitter, Transaction, TransactionBuilder};
pub use types::{AccountId, CryptoHash, Gas, NearToken, WaitUntil};
