//! Key store contract
//!
//! Credential backends (OS keychains, credential files) live outside this
//! crate and implement [`KeyStore`]. [`InMemoryKeyStore`] is the process-local
//! backend used by [`crate::wallet::LocalWallet`] and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

use crate::keys::{KeyPair, PublicKey};
use crate::types::AccountId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyStoreError {
    /// Failure reported by the storage backend
    #[error("Key store backend error: {0}")]
    Backend(String),
}

pub type KeyStoreResult<T> = Result<T, KeyStoreError>;

/// Descriptive data stored next to a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMetadata {
    pub created_at: DateTime<Utc>,
    pub label: Option<String>,
}

impl KeyMetadata {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Default for KeyMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// One signing key per account.
///
/// `add` replaces any key already stored for the account.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn add(
        &self,
        account_id: &AccountId,
        key_pair: KeyPair,
        metadata: Option<KeyMetadata>,
    ) -> KeyStoreResult<()>;

    async fn get(&self, account_id: &AccountId) -> KeyStoreResult<Option<KeyPair>>;

    /// Returns whether a key was stored for the account
    async fn remove(&self, account_id: &AccountId) -> KeyStoreResult<bool>;

    /// Accounts with a stored key, sorted
    async fn list(&self) -> KeyStoreResult<Vec<AccountId>>;

    async fn metadata(&self, _account_id: &AccountId) -> KeyStoreResult<Option<KeyMetadata>> {
        Ok(None)
    }
}

struct StoredKey {
    key_pair: KeyPair,
    metadata: KeyMetadata,
}

#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: DashMap<AccountId, StoredKey>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Public key stored for `account_id`, without cloning the secret
    pub fn public_key(&self, account_id: &AccountId) -> Option<PublicKey> {
        self.keys
            .get(account_id)
            .map(|entry| entry.key_pair.public_key().clone())
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn add(
        &self,
        account_id: &AccountId,
        key_pair: KeyPair,
        metadata: Option<KeyMetadata>,
    ) -> KeyStoreResult<()> {
        tracing::debug!(
            account_id = %account_id,
            public_key = %key_pair.public_key(),
            "Storing key"
        );
        self.keys.insert(
            account_id.clone(),
            StoredKey {
                key_pair,
                metadata: metadata.unwrap_or_default(),
            },
        );
        Ok(())
    }

    async fn get(&self, account_id: &AccountId) -> KeyStoreResult<Option<KeyPair>> {
        Ok(self.keys.get(account_id).map(|entry| entry.key_pair.clone()))
    }

    async fn remove(&self, account_id: &AccountId) -> KeyStoreResult<bool> {
        Ok(self.keys.remove(account_id).is_some())
    }

    async fn list(&self) -> KeyStoreResult<Vec<AccountId>> {
        let mut accounts: Vec<AccountId> = self.keys.iter().map(|entry| entry.key().clone()).collect();
        accounts.sort();
        Ok(accounts)
    }

    async fn metadata(&self, account_id: &AccountId) -> KeyStoreResult<Option<KeyMetadata>> {
        Ok(self.keys.get(account_id).map(|entry| entry.metadata.clone()))
    }
}
