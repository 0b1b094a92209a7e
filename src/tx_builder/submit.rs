//! Submission pipeline
//!
//! `Building → Resolved → Serialized → Signed → Submitted → Settled | Failed`
//!
//! [`Submitter::send`] resolves a key and nonce through the
//! [`SignerService`], anchors the transaction to a final block, signs the
//! transaction hash and submits it. An invalid-nonce rejection re-resolves
//! everything and signs a new transaction; a rejected signed transaction is
//! never submitted again. Other errors are returned to the caller typed.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::builder::{TransactionBuilder, TransactionPlan};
use super::context::ExecutionContext;
use super::delegate::{DelegateAction, SignedDelegateAction};
use super::errors::{TransactionBuilderError, TxResult};
use super::output::TxBuildOutput;
use crate::config::ClientConfig;
use crate::metrics::{Metrics, Timer};
use crate::nonce_manager::{retry_with_backoff, SignerService};
use crate::observability::TraceContext;
use crate::rpc_manager::{
    classify_outcome_failure, BlockView, FinalExecutionOutcome, RetryPolicy, RpcError, RpcProvider,
};
use crate::structured_logging::SubmissionLogger;
use crate::types::{AccountId, BlockReference, CryptoHash, WaitUntil};

pub const DEFAULT_MAX_NONCE_RETRIES: u32 = 3;
pub const DEFAULT_DELEGATE_BLOCK_OFFSET: u64 = 200;

/// Validity window of a delegate action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegateOptions {
    /// Absolute last block height; overrides `block_height_offset`
    pub max_block_height: Option<u64>,
    /// Blocks past the latest final block; defaults to the submitter's offset
    pub block_height_offset: Option<u64>,
}

/// Signs and submits transactions for one signer
pub struct Submitter {
    rpc: Arc<dyn RpcProvider>,
    signer: Arc<dyn SignerService>,
    max_nonce_retries: u32,
    retry_policy: RetryPolicy,
    delegate_block_offset: u64,
    metrics: Option<Arc<Metrics>>,
}

impl Submitter {
    pub fn new(rpc: Arc<dyn RpcProvider>, signer: Arc<dyn SignerService>) -> Self {
        Self {
            rpc,
            signer,
            max_nonce_retries: DEFAULT_MAX_NONCE_RETRIES,
            retry_policy: RetryPolicy::default(),
            delegate_block_offset: DEFAULT_DELEGATE_BLOCK_OFFSET,
            metrics: None,
        }
    }

    /// Retry and nonce settings taken from `config`
    pub fn from_config(
        config: &ClientConfig,
        rpc: Arc<dyn RpcProvider>,
        signer: Arc<dyn SignerService>,
    ) -> Self {
        Self::new(rpc, signer)
            .with_max_nonce_retries(config.nonce.max_nonce_retries)
            .with_retry_policy(config.retry.to_policy())
            .with_delegate_block_offset(config.nonce.delegate_block_offset)
    }

    pub fn with_max_nonce_retries(mut self, retries: u32) -> Self {
        self.max_nonce_retries = retries;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_delegate_block_offset(mut self, offset: u64) -> Self {
        self.delegate_block_offset = offset;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn account_id(&self) -> &AccountId {
        self.signer.account_id()
    }

    pub fn rpc(&self) -> &Arc<dyn RpcProvider> {
        &self.rpc
    }

    fn check_signer(&self, signer_id: &AccountId) -> TxResult<()> {
        if signer_id != self.signer.account_id() {
            return Err(TransactionBuilderError::Configuration(format!(
                "builder signer {} does not match submitter account {}",
                signer_id,
                self.signer.account_id()
            )));
        }
        Ok(())
    }

    async fn latest_block(&self) -> TxResult<BlockView> {
        let rpc = &self.rpc;
        Ok(retry_with_backoff("block", &self.retry_policy, || async {
            rpc.block(&BlockReference::latest()).await
        })
        .await?)
    }

    /// Key, nonce and block hash for a new signing attempt
    async fn resolve(&self, wait_until: WaitUntil, trace: &TraceContext) -> TxResult<ExecutionContext> {
        let resolved = self.signer.resolve(self.rpc.as_ref()).await?;
        let block = self.latest_block().await?;
        Ok(ExecutionContext::new(
            resolved,
            block.header.hash,
            wait_until,
            trace.child_span("resolve"),
        ))
    }

    async fn sign_plan(&self, plan: &TransactionPlan, context: &ExecutionContext) -> TxResult<TxBuildOutput> {
        let tx = context.transaction(plan.receiver_id.clone(), plan.actions.clone());
        let hash = tx.get_hash()?;
        let signature = self.signer.sign(&context.public_key, hash.as_bytes()).await?;
        TxBuildOutput::new(tx.with_signature(signature))
    }

    /// Resolve and sign without submitting
    #[instrument(skip(self, builder), fields(receiver_id = %builder.receiver_id()))]
    pub async fn sign(&self, builder: TransactionBuilder) -> TxResult<TxBuildOutput> {
        let plan = builder.build()?;
        self.check_signer(&plan.signer_id)?;
        let context = self.resolve(plan.wait_until, &TraceContext::new("sign")).await?;
        self.sign_plan(&plan, &context).await
    }

    /// Build, sign, submit and classify the outcome
    #[instrument(skip(self, builder), fields(signer_id = %builder.signer_id(), receiver_id = %builder.receiver_id()))]
    pub async fn send(&self, builder: TransactionBuilder) -> TxResult<FinalExecutionOutcome> {
        let plan = builder.build()?;
        self.check_signer(&plan.signer_id)?;

        let trace = TraceContext::new("send");
        let logger = SubmissionLogger::new(trace.correlation_id().clone());
        let timer = Timer::new();

        let result = self.submit_with_nonce_retries(&plan, &trace, &logger).await;
        let latency_ms = (timer.elapsed_secs() * 1000.0) as u64;

        if let Some(metrics) = &self.metrics {
            timer.observe_duration(&metrics.tx_submit_latency);
        }
        match &result {
            Ok(outcome) => {
                if let Some(metrics) = &self.metrics {
                    metrics.tx_succeeded.inc();
                }
                if let Some(hash) = outcome.transaction_hash() {
                    logger.log_settled(hash, latency_ms);
                }
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_tx_failed(err.category());
                }
                logger.log_failed(&err.to_string(), err.category(), latency_ms);
            }
        }
        result
    }

    async fn submit_with_nonce_retries(
        &self,
        plan: &TransactionPlan,
        trace: &TraceContext,
        logger: &SubmissionLogger,
    ) -> TxResult<FinalExecutionOutcome> {
        let mut attempt = 0u32;
        loop {
            let context = self.resolve(plan.wait_until, trace).await?;
            logger.log_resolved(&context.signer_id, &context.public_key, context.nonce);

            let output = self.sign_plan(plan, &context).await?;
            logger.log_submitted(&output.hash, output.nonce(), plan.wait_until);
            if let Some(metrics) = &self.metrics {
                metrics.tx_submitted.inc();
            }

            let error = match self.rpc.send_tx(&output.signed, plan.wait_until).await {
                Ok(outcome) => {
                    match classify_outcome_failure(&outcome, &plan.actions, &plan.receiver_id) {
                        None => return Ok(outcome),
                        Some(err) => err,
                    }
                }
                Err(err) => err,
            };

            match error {
                RpcError::InvalidNonce { tx_nonce, ak_nonce } if attempt < self.max_nonce_retries => {
                    attempt += 1;
                    logger.log_nonce_retry(attempt, tx_nonce, ak_nonce);
                    if let Some(metrics) = &self.metrics {
                        metrics.nonce_retries.inc();
                    }
                    // An unparsed access key nonce comes back as 0; refetch instead
                    let observed = Some(ak_nonce).filter(|n| *n > 0);
                    self.signer.on_invalid_nonce(&context.public_key, observed).await;
                }
                other => return Err(other.into()),
            }
        }
    }

    /// Build and sign a delegate action for a relayer to submit
    #[instrument(skip(self, builder, options), fields(receiver_id = %builder.receiver_id()))]
    pub async fn delegate(
        &self,
        builder: TransactionBuilder,
        options: DelegateOptions,
    ) -> TxResult<SignedDelegateAction> {
        let (sender_id, receiver_id, actions) = builder.build_delegate_actions()?;
        self.check_signer(&sender_id)?;

        let resolved = self.signer.resolve(self.rpc.as_ref()).await?;
        let max_block_height = match options.max_block_height {
            Some(height) => height,
            None => {
                let offset = options
                    .block_height_offset
                    .unwrap_or(self.delegate_block_offset);
                let latest = self.latest_block().await?.header.height;
                latest.checked_add(offset).ok_or_else(|| {
                    TransactionBuilderError::Configuration(format!(
                        "block height {} + offset {} overflows",
                        latest, offset
                    ))
                })?
            }
        };

        let delegate_action = DelegateAction {
            sender_id,
            receiver_id,
            actions,
            nonce: resolved.nonce,
            max_block_height,
            public_key: resolved.public_key,
        };
        let hash = delegate_action.get_hash()?;
        let signature = self
            .signer
            .sign(&delegate_action.public_key, hash.as_bytes())
            .await?;
        debug!(
            nonce = delegate_action.nonce,
            max_block_height,
            "Signed delegate action"
        );
        Ok(SignedDelegateAction {
            delegate_action,
            signature,
        })
    }

    /// Outcome of a submitted transaction; retried like other reads
    pub async fn tx_status(
        &self,
        tx_hash: &CryptoHash,
        sender_id: &AccountId,
        wait_until: WaitUntil,
    ) -> TxResult<FinalExecutionOutcome> {
        let rpc = &self.rpc;
        Ok(retry_with_backoff("tx_status", &self.retry_policy, || async {
            rpc.tx_status(tx_hash, sender_id, wait_until).await
        })
        .await?)
    }
}
