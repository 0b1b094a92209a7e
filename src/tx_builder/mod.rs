//! Transaction model, builder and submission pipeline
//!
//! ## Architecture
//!
//! - **actions**: the `Action` union and its payloads, with explicit wire tags
//! - **transaction**: `Transaction` / `SignedTransaction` and their hashes
//! - **delegate**: meta transactions signed by a sender, relayed by another account
//! - **errors**: construction and submission error taxonomy
//! - **builder**: fluent `TransactionBuilder` that records the first error
//! - **context**: resolved key, nonce and block hash for one signing attempt
//! - **output**: signed transaction with its hash and wire bytes
//! - **submit**: `Submitter`, which resolves, signs, sends and classifies
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use near_submit::keys::KeyPair;
//! use near_submit::nonce_manager::LocalSigner;
//! use near_submit::rpc_manager::JsonRpcClient;
//! use near_submit::tx_builder::{Submitter, TransactionBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key: KeyPair = "ed25519:...".parse()?;
//! let rpc = Arc::new(JsonRpcClient::from_url("https://rpc.testnet.near.org")?);
//! let signer = Arc::new(LocalSigner::new("alice.testnet".parse()?, key));
//! let submitter = Submitter::new(rpc, signer);
//!
//! let outcome = submitter
//!     .send(
//!         TransactionBuilder::new("alice.testnet".parse()?, "bob.testnet".parse()?)
//!             .transfer("0.1 NEAR"),
//!     )
//!     .await?;
//! println!("{:?}", outcome.transaction_hash());
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod builder;
pub mod context;
pub mod delegate;
pub mod errors;
pub mod output;
pub mod submit;
pub mod transaction;

pub use actions::{
    AccessKey, AccessKeyPermission, Action, ActionTag, FunctionCallPermission,
    GlobalContractDeployMode, GlobalContractIdentifier,
};
pub use builder::{CallBuilder, TransactionBuilder, TransactionPlan};
pub use context::ExecutionContext;
pub use delegate::{DelegateAction, NonDelegateAction, SignedDelegateAction, DELEGATE_ACTION_PREFIX};
pub use errors::{TransactionBuilderError, TxResult};
pub use output::TxBuildOutput;
pub use submit::{DelegateOptions, Submitter};
pub use transaction::{SignedTransaction, Transaction};
