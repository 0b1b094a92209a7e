//! Logging setup and submission pipeline events

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::keys::PublicKey;
use crate::observability::CorrelationId;
use crate::types::{AccountId, CryptoHash, WaitUntil};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    }
}

/// Structured logger for the events of one submission
#[derive(Debug, Clone)]
pub struct SubmissionLogger {
    correlation_id: CorrelationId,
}

impl SubmissionLogger {
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn log_resolved(&self, signer_id: &AccountId, public_key: &PublicKey, nonce: u64) {
        tracing::debug!(
            correlation_id = %self.correlation_id,
            signer_id = %signer_id,
            public_key = %public_key,
            nonce,
            "Resolved signing key"
        );
    }

    pub fn log_submitted(&self, tx_hash: &CryptoHash, nonce: u64, wait_until: WaitUntil) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            tx_hash = %tx_hash,
            nonce,
            wait_until = %wait_until,
            "Transaction submitted"
        );
    }

    pub fn log_settled(&self, tx_hash: &CryptoHash, latency_ms: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            tx_hash = %tx_hash,
            latency_ms,
            "Transaction settled"
        );
    }

    pub fn log_failed(&self, error: &str, category: &str, latency_ms: u64) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            error = %error,
            category,
            latency_ms,
            "Transaction failed"
        );
    }

    pub fn log_nonce_retry(&self, attempt: u32, tx_nonce: u64, ak_nonce: u64) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            attempt,
            tx_nonce,
            ak_nonce,
            "Invalid nonce, re-signing with a fresh nonce"
        );
    }
}
