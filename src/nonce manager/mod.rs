//! Nonce Manager Module
//!
//! Key rotation, per-key nonce tracking and the signer services built on them.

// Submodules
pub mod nonce_cache;
pub mod nonce_errors;
pub mod nonce_retry;
pub mod nonce_rotation;
pub mod nonce_signer;

// Re-exports for convenience
pub use nonce_cache::NonceCache;
pub use nonce_errors::{NonceError, NonceResult};
pub use nonce_retry::{retry_with_backoff, Retryable};
pub use nonce_rotation::{KeyAllocation, KeyRotationManager};
pub use nonce_signer::{LocalSigner, ResolvedKey, RotatingSigner, SignerService};
