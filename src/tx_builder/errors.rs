//! Error types for transaction construction and submission
//!
//! Construction errors are raised synchronously before any I/O; submission
//! errors wrap the RPC taxonomy so callers can match on the typed cause.

use thiserror::Error;

use crate::codec::WireError;
use crate::keys::KeyError;
use crate::nonce_manager::NonceError;
use crate::rpc_manager::RpcError;
use crate::types::TypeError;

/// Error type for all transaction builder operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionBuilderError {
    /// An account id, hash or amount did not parse
    #[error("Invalid value: {0}")]
    Type(TypeError),

    /// Amount does not fit its wire width
    #[error("Amount {value} does not fit in {width}")]
    AmountOverflow { value: String, width: &'static str },

    /// `build` was called without any action
    #[error("Transaction has no actions")]
    EmptyActions,

    /// A delegate action cannot contain another delegate action
    #[error("Delegate actions cannot be nested")]
    NestedDelegate,

    /// Function call arguments could not be serialized
    #[error("Invalid function call arguments: {0}")]
    InvalidArgs(String),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// Failed to resolve a key and nonce for the signer
    #[error("Nonce acquisition failed: {0}")]
    NonceAcquisition(NonceError),

    /// RPC or execution failure
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<TypeError> for TransactionBuilderError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::AmountOverflow { value, width } => Self::AmountOverflow { value, width },
            other => Self::Type(other),
        }
    }
}

impl From<NonceError> for TransactionBuilderError {
    fn from(err: NonceError) -> Self {
        match err {
            NonceError::Fetch(rpc) => Self::Rpc(rpc),
            NonceError::Signing(reason) => Self::Signing(reason),
            other => Self::NonceAcquisition(other),
        }
    }
}

impl TransactionBuilderError {
    /// Check if this error is potentially retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(err) => err.is_retryable(),
            Self::NonceAcquisition(err) => err.is_transient(),

            Self::Type(_) => false,
            Self::AmountOverflow { .. } => false,
            Self::EmptyActions => false,
            Self::NestedDelegate => false,
            Self::InvalidArgs(_) => false,
            Self::Key(_) => false,
            Self::Wire(_) => false,
            Self::Signing(_) => false,
            Self::Configuration(_) => false,
        }
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Type(_) | Self::AmountOverflow { .. } | Self::InvalidArgs(_) => "validation",
            Self::EmptyActions | Self::NestedDelegate => "validation",
            Self::Key(_) | Self::Signing(_) => "signing",
            Self::Wire(_) => "wire",
            Self::NonceAcquisition(_) => "nonce",
            Self::Rpc(err) => err.category(),
            Self::Configuration(_) => "config",
        }
    }

    /// The RPC error behind this failure, if any
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for builder and submission operations
pub type TxResult<T> = Result<T, TransactionBuilderError>;
