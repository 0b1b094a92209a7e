//! Wallet adapter contract
//!
//! Applications talk to wallets through [`WalletAdapter`]. Parameters and
//! results use the same serde shapes as the ledger JSON so adapters that
//! forward to third-party wallets can pass them through unchanged.
//! [`LocalWallet`] signs with keys held in a [`KeyStore`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ClientConfig, NonceSettings, RetrySettings};
use crate::keys::PublicKey;
use crate::keystore::{KeyStore, KeyStoreError};
use crate::nep413::{self, Nep413Error, SignMessageParams, SignedMessage};
use crate::nonce_manager::LocalSigner;
use crate::rpc_manager::{FinalExecutionOutcome, RpcProvider};
use crate::tx_builder::{
    Action, DelegateOptions, SignedDelegateAction, Submitter, TransactionBuilder,
    TransactionBuilderError,
};
use crate::types::{AccountId, WaitUntil};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WalletError {
    #[error("Wallet has no accounts")]
    NoAccounts,

    #[error("No key for account {account_id}")]
    UnknownAccount { account_id: AccountId },

    #[error("Wallet does not support {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    #[error(transparent)]
    Transaction(#[from] TransactionBuilderError),

    #[error(transparent)]
    Message(#[from] Nep413Error),
}

pub type WalletResult<T> = Result<T, WalletError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub account_id: AccountId,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignAndSendTransactionParams {
    /// Defaults to the wallet's active account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_id: Option<AccountId>,
    pub receiver_id: AccountId,
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<WaitUntil>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateActionRequest {
    pub receiver_id: AccountId,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignDelegateActionsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_id: Option<AccountId>,
    pub delegate_actions: Vec<DelegateActionRequest>,
}

/// Operations an application may request from a wallet
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    async fn get_accounts(&self) -> WalletResult<Vec<WalletAccount>>;

    async fn sign_and_send_transaction(
        &self,
        params: SignAndSendTransactionParams,
    ) -> WalletResult<FinalExecutionOutcome>;

    /// NEP-413 off-chain message signature from the active account
    async fn sign_message(&self, params: &SignMessageParams) -> WalletResult<SignedMessage>;

    async fn sign_delegate_actions(
        &self,
        _params: SignDelegateActionsParams,
    ) -> WalletResult<Vec<SignedDelegateAction>> {
        Err(WalletError::Unsupported("signDelegateActions"))
    }
}

/// Wallet backed by a key store, submitting through one [`Submitter`] per account
pub struct LocalWallet {
    keystore: Arc<dyn KeyStore>,
    rpc: Arc<dyn RpcProvider>,
    active_account: Option<AccountId>,
    retry: RetrySettings,
    nonce: NonceSettings,
    submitters: DashMap<AccountId, (PublicKey, Arc<Submitter>)>,
}

impl LocalWallet {
    pub fn new(keystore: Arc<dyn KeyStore>, rpc: Arc<dyn RpcProvider>) -> Self {
        Self {
            keystore,
            rpc,
            active_account: None,
            retry: RetrySettings::default(),
            nonce: NonceSettings::default(),
            submitters: DashMap::new(),
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        keystore: Arc<dyn KeyStore>,
        rpc: Arc<dyn RpcProvider>,
    ) -> Self {
        let mut wallet = Self::new(keystore, rpc);
        wallet.retry = config.retry.clone();
        wallet.nonce = config.nonce.clone();
        wallet
    }

    /// Account used when a request names no signer. Without one, the first
    /// stored account is used.
    pub fn with_active_account(mut self, account_id: AccountId) -> Self {
        self.active_account = Some(account_id);
        self
    }

    async fn resolve_account(&self, requested: Option<AccountId>) -> WalletResult<AccountId> {
        if let Some(account_id) = requested.or_else(|| self.active_account.clone()) {
            return Ok(account_id);
        }
        self.keystore
            .list()
            .await?
            .into_iter()
            .next()
            .ok_or(WalletError::NoAccounts)
    }

    /// Submitter for `account_id`, rebuilt when the stored key changed
    pub async fn submitter(&self, account_id: &AccountId) -> WalletResult<Arc<Submitter>> {
        let key_pair = self
            .keystore
            .get(account_id)
            .await?
            .ok_or_else(|| WalletError::UnknownAccount {
                account_id: account_id.clone(),
            })?;

        if let Some(entry) = self.submitters.get(account_id) {
            let (public_key, submitter) = entry.value();
            if public_key == key_pair.public_key() {
                return Ok(Arc::clone(submitter));
            }
        }

        let public_key = key_pair.public_key().clone();
        let signer = LocalSigner::new(account_id.clone(), key_pair)
            .with_retry_policy(self.retry.to_policy());
        let submitter = Arc::new(
            Submitter::new(Arc::clone(&self.rpc), Arc::new(signer))
                .with_max_nonce_retries(self.nonce.max_nonce_retries)
                .with_retry_policy(self.retry.to_policy())
                .with_delegate_block_offset(self.nonce.delegate_block_offset),
        );
        self.submitters
            .insert(account_id.clone(), (public_key, Arc::clone(&submitter)));
        Ok(submitter)
    }

    fn builder(signer_id: AccountId, receiver_id: AccountId, actions: Vec<Action>) -> TransactionBuilder {
        actions
            .into_iter()
            .fold(TransactionBuilder::new(signer_id, receiver_id), |builder, action| {
                builder.add_action(action)
            })
    }
}

#[async_trait]
impl WalletAdapter for LocalWallet {
    async fn get_accounts(&self) -> WalletResult<Vec<WalletAccount>> {
        let account_ids = self.keystore.list().await?;
        let keys = try_join_all(account_ids.iter().map(|id| self.keystore.get(id))).await?;
        Ok(account_ids
            .into_iter()
            .zip(keys)
            .filter_map(|(account_id, key_pair)| {
                key_pair.map(|key_pair| WalletAccount {
                    public_key: key_pair.public_key().clone(),
                    account_id,
                })
            })
            .collect())
    }

    async fn sign_and_send_transaction(
        &self,
        params: SignAndSendTransactionParams,
    ) -> WalletResult<FinalExecutionOutcome> {
        let signer_id = self.resolve_account(params.signer_id).await?;
        let submitter = self.submitter(&signer_id).await?;

        let mut builder = Self::builder(signer_id, params.receiver_id, params.actions);
        if let Some(wait_until) = params.wait_until {
            builder = builder.wait_until(wait_until);
        }
        Ok(submitter.send(builder).await?)
    }

    async fn sign_message(&self, params: &SignMessageParams) -> WalletResult<SignedMessage> {
        let account_id = self.resolve_account(None).await?;
        let key_pair = self
            .keystore
            .get(&account_id)
            .await?
            .ok_or_else(|| WalletError::UnknownAccount {
                account_id: account_id.clone(),
            })?;
        Ok(nep413::sign_message(&key_pair, &account_id, params)?)
    }

    async fn sign_delegate_actions(
        &self,
        params: SignDelegateActionsParams,
    ) -> WalletResult<Vec<SignedDelegateAction>> {
        let signer_id = self.resolve_account(params.signer_id).await?;
        let submitter = self.submitter(&signer_id).await?;

        let mut signed = Vec::with_capacity(params.delegate_actions.len());
        for request in params.delegate_actions {
            let builder = Self::builder(signer_id.clone(), request.receiver_id, request.actions);
            signed.push(submitter.delegate(builder, DelegateOptions::default()).await?);
        }
        Ok(signed)
    }
}
