use thiserror::Error;

use crate::keys::KeyError;
use crate::rpc_manager::RpcError;

/// Nonce and key-rotation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NonceError {
    /// No keys were registered for the account
    #[error("No keys registered for account {account_id}")]
    NoKeysRegistered { account_id: String },

    /// The key is not part of the account's rotation pool
    #[error("Key {public_key} is not registered for account {account_id}")]
    KeyNotRegistered {
        account_id: String,
        public_key: String,
    },

    /// Fetching the on-chain access key failed
    #[error("Failed to fetch access key nonce: {0}")]
    Fetch(#[from] RpcError),

    /// Signing error
    #[error("Signing error: {0}")]
    Signing(String),

    /// Next nonce would not fit in u64
    #[error("Nonce overflow for key {public_key}")]
    Overflow { public_key: String },
}

impl From<KeyError> for NonceError {
    fn from(err: KeyError) -> Self {
        NonceError::Signing(err.to_string())
    }
}

impl NonceError {
    /// Check if error is transient (retryable)
    pub fn is_transient(&self) -> bool {
        match self {
            NonceError::Fetch(err) => err.is_retryable(),
            NonceError::NoKeysRegistered { .. } => false,
            NonceError::KeyNotRegistered { .. } => false,
            NonceError::Signing(_) => false,
            NonceError::Overflow { .. } => false,
        }
    }

    /// The RPC error behind a fetch failure
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            NonceError::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for nonce operations
pub type NonceResult<T> = Result<T, NonceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(NonceError::Fetch(RpcError::Timeout("slow".into())).is_transient());
        assert!(!NonceError::Fetch(RpcError::AccountDoesNotExist {
            account_id: "a.near".into()
        })
        .is_transient());
        assert!(!NonceError::NoKeysRegistered {
            account_id: "a.near".into()
        }
        .is_transient());
        assert!(!NonceError::Signing("bad".into()).is_transient());
    }

    #[test]
    fn test_key_error_conversion() {
        let err: NonceError = KeyError::InvalidHashLength(5).into();
        assert!(matches!(err, NonceError::Signing(_)));
    }
}
