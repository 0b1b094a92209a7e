//! Round-robin key rotation per account
//!
//! Spreading submissions over several access keys of one account lets them
//! proceed in parallel, since every access key has its own nonce sequence.
//!
//! Each account owns a key list and a monotonic counter. An allocation
//! reads the list and performs a single `fetch_add` on the counter, so two
//! concurrent allocations always observe distinct counter values and the
//! pool is cycled fairly without a global lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use super::nonce_errors::{NonceError, NonceResult};
use crate::keys::{KeyPair, PublicKey};
use crate::types::AccountId;

#[derive(Default)]
struct RotationPool {
    keys: RwLock<Vec<Arc<KeyPair>>>,
    counter: AtomicU64,
}

/// Key selected for one submission
#[derive(Debug, Clone)]
pub struct KeyAllocation {
    pub account_id: AccountId,
    pub key: Arc<KeyPair>,
    /// Counter value consumed by this allocation
    pub slot: u64,
    /// Position of `key` in the pool
    pub index: usize,
}

impl KeyAllocation {
    pub fn public_key(&self) -> &PublicKey {
        self.key.public_key()
    }
}

/// Per-account key pools with round-robin allocation
#[derive(Default)]
pub struct KeyRotationManager {
    pools: DashMap<AccountId, Arc<RotationPool>>,
}

impl KeyRotationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the account's keys and reset its counter
    pub fn register_keys(&self, account_id: AccountId, keys: Vec<KeyPair>) {
        let count = keys.len();
        let pool = RotationPool {
            keys: RwLock::new(keys.into_iter().map(Arc::new).collect()),
            counter: AtomicU64::new(0),
        };
        self.pools.insert(account_id.clone(), Arc::new(pool));
        debug!(account_id = %account_id, keys = count, "Registered rotation keys");
    }

    /// Append a key; the counter is left as is
    pub fn add_key(&self, account_id: AccountId, key: KeyPair) {
        let pool = self.pools.entry(account_id).or_default().clone();
        pool.keys.write().push(Arc::new(key));
    }

    /// Remove one key from the pool and reset the counter
    pub fn remove_key(&self, account_id: &AccountId, public_key: &PublicKey) -> NonceResult<()> {
        let pool = self.pool(account_id)?;
        let mut keys = pool.keys.write();
        let before = keys.len();
        keys.retain(|k| k.public_key() != public_key);
        if keys.len() == before {
            return Err(NonceError::KeyNotRegistered {
                account_id: account_id.to_string(),
                public_key: public_key.to_string(),
            });
        }
        pool.counter.store(0, Ordering::SeqCst);
        Ok(())
    }

    /// Drop the account's keys and its counter
    pub fn remove_account(&self, account_id: &AccountId) -> bool {
        self.pools.remove(account_id).is_some()
    }

    /// Reset the account's counter to zero.
    ///
    /// Must not be called while submissions for the account are in flight:
    /// a concurrent allocation may then reuse a slot.
    pub fn reset_counter(&self, account_id: &AccountId) {
        if let Some(pool) = self.pools.get(account_id) {
            pool.counter.store(0, Ordering::SeqCst);
        }
    }

    /// Number of allocations since registration or the last reset
    pub fn counter(&self, account_id: &AccountId) -> u64 {
        self.pools
            .get(account_id)
            .map(|p| p.counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn keys(&self, account_id: &AccountId) -> Vec<Arc<KeyPair>> {
        self.pools
            .get(account_id)
            .map(|p| p.keys.read().clone())
            .unwrap_or_default()
    }

    pub fn contains_key(&self, account_id: &AccountId, public_key: &PublicKey) -> bool {
        self.pools
            .get(account_id)
            .map(|p| p.keys.read().iter().any(|k| k.public_key() == public_key))
            .unwrap_or(false)
    }

    pub fn find_key(&self, account_id: &AccountId, public_key: &PublicKey) -> Option<Arc<KeyPair>> {
        self.pools.get(account_id).and_then(|p| {
            p.keys
                .read()
                .iter()
                .find(|k| k.public_key() == public_key)
                .cloned()
        })
    }

    /// Pick `keys[counter % len]` and advance the counter
    pub fn allocate(&self, account_id: &AccountId) -> NonceResult<KeyAllocation> {
        let pool = self.pool(account_id)?;
        let keys = pool.keys.read();
        if keys.is_empty() {
            return Err(NonceError::NoKeysRegistered {
                account_id: account_id.to_string(),
            });
        }

        let slot = pool.counter.fetch_add(1, Ordering::SeqCst);
        let index = (slot % keys.len() as u64) as usize;
        Ok(KeyAllocation {
            account_id: account_id.clone(),
            key: keys[index].clone(),
            slot,
            index,
        })
    }

    fn pool(&self, account_id: &AccountId) -> NonceResult<Arc<RotationPool>> {
        self.pools
            .get(account_id)
            .map(|p| p.clone())
            .ok_or_else(|| NonceError::NoKeysRegistered {
                account_id: account_id.to_string(),
            })
    }
}
