//! Signer abstraction for the submission pipeline
//!
//! A [`SignerService`] decides which access key signs the next transaction
//! and which nonce it uses. Two implementations are provided:
//! - [`LocalSigner`]: one key pair
//! - [`RotatingSigner`]: round-robin over several keys of one account
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::nonce_cache::NonceCache;
use super::nonce_errors::{NonceError, NonceResult};
use super::nonce_retry::retry_with_backoff;
use super::nonce_rotation::KeyRotationManager;
use crate::keys::{KeyPair, PublicKey, Signature};
use crate::rpc_manager::{RetryPolicy, RpcProvider, RpcResult};
use crate::types::{AccountId, BlockReference};

/// Key and nonce chosen for one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKey {
    pub signer_id: AccountId,
    pub public_key: PublicKey,
    pub nonce: u64,
}

/// Async signer trait for transaction submission
#[async_trait]
pub trait SignerService: Send + Sync {
    /// Account that signs and pays
    fn account_id(&self) -> &AccountId;

    /// Pick a key and reserve its next nonce
    async fn resolve(&self, rpc: &dyn RpcProvider) -> NonceResult<ResolvedKey>;

    /// Sign `message` with the key identified by `public_key`
    async fn sign(&self, public_key: &PublicKey, message: &[u8]) -> NonceResult<Signature>;

    /// React to an invalid-nonce rejection for `public_key`.
    ///
    /// With the access key nonce known the cache is raised past it,
    /// otherwise the cached value is dropped and refetched.
    async fn on_invalid_nonce(&self, public_key: &PublicKey, ak_nonce: Option<u64>);
}

/// Access key nonce at the latest final block, retried with backoff
async fn fetch_access_key_nonce(
    rpc: &dyn RpcProvider,
    policy: &RetryPolicy,
    account_id: &AccountId,
    public_key: &PublicKey,
) -> RpcResult<u64> {
    retry_with_backoff("view_access_key", policy, || async {
        rpc.view_access_key(account_id, public_key, &BlockReference::latest())
            .await
            .map(|view| view.nonce)
    })
    .await
}

async fn apply_invalid_nonce(
    cache: &NonceCache,
    account_id: &AccountId,
    public_key: &PublicKey,
    ak_nonce: Option<u64>,
) {
    match ak_nonce {
        Some(ak_nonce) => cache.observe_ak_nonce(account_id, public_key, ak_nonce).await,
        None => cache.invalidate(account_id, public_key).await,
    }
}

/// Single key pair signer
pub struct LocalSigner {
    account_id: AccountId,
    key: Arc<KeyPair>,
    cache: NonceCache,
    retry_policy: RetryPolicy,
}

impl LocalSigner {
    pub fn new(account_id: AccountId, key: KeyPair) -> Self {
        Self {
            account_id,
            key: Arc::new(key),
            cache: NonceCache::new(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key
    }

    pub fn public_key(&self) -> &PublicKey {
        self.key.public_key()
    }

    pub fn nonce_cache(&self) -> &NonceCache {
        &self.cache
    }
}

#[async_trait]
impl SignerService for LocalSigner {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    async fn resolve(&self, rpc: &dyn RpcProvider) -> NonceResult<ResolvedKey> {
        let public_key = self.key.public_key();
        let nonce = self
            .cache
            .next_nonce(&self.account_id, public_key, || {
                fetch_access_key_nonce(rpc, &self.retry_policy, &self.account_id, public_key)
            })
            .await?;

        Ok(ResolvedKey {
            signer_id: self.account_id.clone(),
            public_key: public_key.clone(),
            nonce,
        })
    }

    async fn sign(&self, public_key: &PublicKey, message: &[u8]) -> NonceResult<Signature> {
        if public_key != self.key.public_key() {
            return Err(NonceError::KeyNotRegistered {
                account_id: self.account_id.to_string(),
                public_key: public_key.to_string(),
            });
        }
        Ok(self.key.sign(message)?)
    }

    async fn on_invalid_nonce(&self, public_key: &PublicKey, ak_nonce: Option<u64>) {
        apply_invalid_nonce(&self.cache, &self.account_id, public_key, ak_nonce).await;
    }
}

/// Round-robin signer over the account's registered keys.
///
/// Every `resolve` advances the rotation counter, so concurrent submissions
/// spread over the pool and each key keeps its own nonce sequence.
pub struct RotatingSigner {
    account_id: AccountId,
    rotation: Arc<KeyRotationManager>,
    cache: Arc<NonceCache>,
    retry_policy: RetryPolicy,
}

impl RotatingSigner {
    pub fn new(account_id: AccountId, rotation: Arc<KeyRotationManager>) -> Self {
        Self {
            account_id,
            rotation,
            cache: Arc::new(NonceCache::new()),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Build a signer with its own rotation pool holding `keys`
    pub fn from_keys(account_id: AccountId, keys: Vec<KeyPair>) -> Self {
        let rotation = Arc::new(KeyRotationManager::new());
        rotation.register_keys(account_id.clone(), keys);
        Self::new(account_id, rotation)
    }

    /// Share a nonce cache with other signers of the same account
    pub fn with_nonce_cache(mut self, cache: Arc<NonceCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn rotation(&self) -> &Arc<KeyRotationManager> {
        &self.rotation
    }

    pub fn nonce_cache(&self) -> &Arc<NonceCache> {
        &self.cache
    }
}

#[async_trait]
impl SignerService for RotatingSigner {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    async fn resolve(&self, rpc: &dyn RpcProvider) -> NonceResult<ResolvedKey> {
        let allocation = self.rotation.allocate(&self.account_id)?;
        let public_key = allocation.public_key();
        debug!(
            account_id = %self.account_id,
            public_key = %public_key,
            slot = allocation.slot,
            "Allocated rotation key"
        );

        let nonce = self
            .cache
            .next_nonce(&self.account_id, public_key, || {
                fetch_access_key_nonce(rpc, &self.retry_policy, &self.account_id, public_key)
            })
            .await?;

        Ok(ResolvedKey {
            signer_id: self.account_id.clone(),
            public_key: public_key.clone(),
            nonce,
        })
    }

    async fn sign(&self, public_key: &PublicKey, message: &[u8]) -> NonceResult<Signature> {
        let key = self
            .rotation
            .find_key(&self.account_id, public_key)
            .ok_or_else(|| NonceError::KeyNotRegistered {
                account_id: self.account_id.to_string(),
                public_key: public_key.to_string(),
            })?;
        Ok(key.sign(message)?)
    }

    async fn on_invalid_nonce(&self, public_key: &PublicKey, ak_nonce: Option<u64>) {
        if !self.rotation.contains_key(&self.account_id, public_key) {
            warn!(
                account_id = %self.account_id,
                public_key = %public_key,
                "Invalid nonce reported for a key outside the rotation pool"
            );
        }
        apply_invalid_nonce(&self.cache, &self.account_id, public_key, ak_nonce).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_manager::RpcError;
    use crate::test_utils::MockRpcProvider;

    fn account() -> AccountId {
        "alice.near".parse().unwrap()
    }

    #[tokio::test]
    async fn test_local_signer_resolves_sequential_nonces() {
        let key = KeyPair::from_ed25519_seed(&[1; 32]);
        let rpc = MockRpcProvider::new();
        rpc.set_access_key_nonce(key.public_key(), 41);
        let signer = LocalSigner::new(account(), key);

        let first = signer.resolve(&rpc).await.unwrap();
        let second = signer.resolve(&rpc).await.unwrap();
        assert_eq!(first.nonce, 42);
        assert_eq!(second.nonce, 43);
        assert_eq!(rpc.access_key_queries(), 1);
    }

    #[tokio::test]
    async fn test_local_signer_rejects_foreign_key() {
        let signer = LocalSigner::new(account(), KeyPair::from_ed25519_seed(&[1; 32]));
        let other = KeyPair::from_ed25519_seed(&[2; 32]);
        let err = signer.sign(other.public_key(), b"msg").await.unwrap_err();
        assert!(matches!(err, NonceError::KeyNotRegistered { .. }));
    }

    #[tokio::test]
    async fn test_local_signer_signature_verifies() {
        let key = KeyPair::from_ed25519_seed(&[3; 32]);
        let public_key = key.public_key().clone();
        let signer = LocalSigner::new(account(), key);
        let signature = signer.sign(&public_key, b"payload").await.unwrap();
        assert!(public_key.verify(b"payload", &signature));
    }

    #[tokio::test]
    async fn test_invalid_nonce_observation_raises_next_nonce() {
        let key = KeyPair::from_ed25519_seed(&[1; 32]);
        let public_key = key.public_key().clone();
        let rpc = MockRpcProvider::new();
        rpc.set_access_key_nonce(&public_key, 5);
        let signer = LocalSigner::new(account(), key);

        assert_eq!(signer.resolve(&rpc).await.unwrap().nonce, 6);
        signer.on_invalid_nonce(&public_key, Some(90)).await;
        assert_eq!(signer.resolve(&rpc).await.unwrap().nonce, 91);

        rpc.set_access_key_nonce(&public_key, 200);
        signer.on_invalid_nonce(&public_key, None).await;
        assert_eq!(signer.resolve(&rpc).await.unwrap().nonce, 201);
    }

    #[tokio::test]
    async fn test_rotating_signer_cycles_keys() {
        let keys: Vec<KeyPair> = (1..=3u8).map(|i| KeyPair::from_ed25519_seed(&[i; 32])).collect();
        let rpc = MockRpcProvider::new();
        for key in &keys {
            rpc.set_access_key_nonce(key.public_key(), 10);
        }
        let expected: Vec<PublicKey> = keys.iter().map(|k| k.public_key().clone()).collect();
        let signer = RotatingSigner::from_keys(account(), keys);

        let mut resolved = Vec::new();
        for _ in 0..6 {
            resolved.push(signer.resolve(&rpc).await.unwrap());
        }
        for (i, key) in resolved.iter().enumerate() {
            assert_eq!(key.public_key, expected[i % 3]);
            assert_eq!(key.nonce, 11 + (i / 3) as u64);
        }

        let signature = signer.sign(&expected[1], b"m").await.unwrap();
        assert!(expected[1].verify(b"m", &signature));
    }

    #[tokio::test]
    async fn test_rotating_signer_without_keys() {
        let signer = RotatingSigner::new(account(), Arc::new(KeyRotationManager::new()));
        let rpc = MockRpcProvider::new();
        assert!(matches!(
            signer.resolve(&rpc).await,
            Err(NonceError::NoKeysRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_access_key_is_not_retried() {
        let key = KeyPair::from_ed25519_seed(&[8; 32]);
        let rpc = MockRpcProvider::new();
        let signer = LocalSigner::new(account(), key);

        let err = signer.resolve(&rpc).await.unwrap_err();
        assert!(matches!(
            err,
            NonceError::Fetch(RpcError::AccessKeyDoesNotExist { .. })
        ));
        assert_eq!(rpc.access_key_queries(), 1);
    }
}
