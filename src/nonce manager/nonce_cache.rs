//! Local nonce tracking per access key
//!
//! The first submission through a key reads the access key nonce from the
//! chain; later submissions advance a local counter so that concurrent
//! transactions through the same key get strictly increasing nonces without
//! a round trip each.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::nonce_errors::{NonceError, NonceResult};
use crate::keys::PublicKey;
use crate::rpc_manager::RpcResult;
use crate::types::AccountId;

type CacheKey = (AccountId, PublicKey);

/// Last nonce handed out, per `(account, key)`.
///
/// Each entry has its own async mutex: callers using the same key queue up
/// behind the first fetch, callers using different keys never contend.
#[derive(Default)]
pub struct NonceCache {
    entries: DashMap<CacheKey, Arc<Mutex<Option<u64>>>>,
}

impl NonceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, account_id: &AccountId, public_key: &PublicKey) -> Arc<Mutex<Option<u64>>> {
        // Clone the Arc so the map shard is not held across an await
        self.entries
            .entry((account_id.clone(), public_key.clone()))
            .or_default()
            .clone()
    }

    /// Next nonce for the key.
    ///
    /// `fetch` returns the access key nonce from the chain and is only
    /// awaited when nothing is cached.
    pub async fn next_nonce<F, Fut>(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
        fetch: F,
    ) -> NonceResult<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RpcResult<u64>>,
    {
        let entry = self.entry(account_id, public_key);
        let mut cached = entry.lock().await;

        let base = match *cached {
            Some(last) => last,
            None => {
                let on_chain = fetch().await?;
                debug!(
                    account_id = %account_id,
                    public_key = %public_key,
                    nonce = on_chain,
                    "Fetched access key nonce"
                );
                on_chain
            }
        };

        let next = base.checked_add(1).ok_or_else(|| NonceError::Overflow {
            public_key: public_key.to_string(),
        })?;
        *cached = Some(next);
        Ok(next)
    }

    /// Forget the cached nonce; the next call fetches again
    pub async fn invalidate(&self, account_id: &AccountId, public_key: &PublicKey) {
        if let Some((_, entry)) = self
            .entries
            .remove(&(account_id.clone(), public_key.clone()))
        {
            // Wait for an in-flight holder so it cannot write a stale value back
            let _guard = entry.lock().await;
        }
        debug!(account_id = %account_id, public_key = %public_key, "Invalidated cached nonce");
    }

    /// Raise the cache so the next nonce is at least `ak_nonce + 1`
    pub async fn observe_ak_nonce(&self, account_id: &AccountId, public_key: &PublicKey, ak_nonce: u64) {
        let entry = self.entry(account_id, public_key);
        let mut cached = entry.lock().await;
        *cached = Some(cached.map_or(ak_nonce, |current| current.max(ak_nonce)));
    }

    /// Last nonce handed out, if cached
    pub async fn current(&self, account_id: &AccountId, public_key: &PublicKey) -> Option<u64> {
        let entry = self
            .entries
            .get(&(account_id.clone(), public_key.clone()))
            .map(|e| e.clone())?;
        let cached = entry.lock().await;
        *cached
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
