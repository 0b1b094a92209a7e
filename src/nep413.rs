//! Off-chain message signing (NEP-413)
//!
//! A signed message proves control of an account's key without submitting a
//! transaction. The signed bytes are `sha256(borsh(tag) ‖ borsh(payload))`,
//! where the tag keeps a message signature from ever being a valid
//! transaction signature.
//!
//! Verification returns a plain `bool`: a caller deciding whether to trust a
//! message has nothing to do with the reason a check failed.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use borsh::BorshSerialize;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::codec::{self, WireError};
use crate::keys::{KeyError, KeyPair, KeyType, PublicKey, Signature};
use crate::rpc_manager::{AccessKeyView, RpcProvider, RpcResult};
use crate::types::{AccountId, BlockReference};

/// `2^31 + 413`, prepended to every signed payload
pub const NEP413_TAG: u32 = 2_147_484_061;

/// Default maximum age of a message nonce
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Nep413Error {
    /// Only Ed25519 keys can sign off-chain messages
    #[error("Unsupported key type for message signing: {0}")]
    UnsupportedKeyType(KeyType),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

pub type Nep413Result<T> = Result<T, Nep413Error>;

/// Message to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageParams {
    pub message: String,
    pub recipient: String,
    /// 32 bytes; see [`generate_nonce`]
    #[serde(with = "nonce_base64")]
    pub nonce: [u8; 32],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Opaque value echoed back in [`SignedMessage::state`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl SignMessageParams {
    /// Params with a fresh timestamped nonce
    pub fn new(message: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recipient: recipient.into(),
            nonce: generate_nonce(),
            callback_url: None,
            state: None,
        }
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

#[derive(BorshSerialize)]
struct Payload<'a> {
    message: &'a str,
    nonce: [u8; 32],
    recipient: &'a str,
    callback_url: Option<&'a str>,
}

/// Signed message as handed back to the requesting application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub account_id: AccountId,
    pub public_key: PublicKey,
    /// Base64 encoded Ed25519 signature
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    /// `None` disables the expiry check
    pub max_age: Option<Duration>,
    /// Only honoured by [`verify_signature_with_lookup`]
    pub require_full_access: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            max_age: Some(DEFAULT_MAX_AGE),
            require_full_access: true,
        }
    }
}

/// Tag followed by the borsh payload
pub fn serialize_message(params: &SignMessageParams) -> Nep413Result<Vec<u8>> {
    let mut bytes = codec::encode(&NEP413_TAG)?;
    bytes.extend(codec::encode(&Payload {
        message: &params.message,
        nonce: params.nonce,
        recipient: &params.recipient,
        callback_url: params.callback_url.as_deref(),
    })?);
    Ok(bytes)
}

/// Digest that is actually signed
pub fn hash_message(params: &SignMessageParams) -> Nep413Result<[u8; 32]> {
    Ok(Sha256::digest(serialize_message(params)?).into())
}

/// 8 bytes of big-endian millisecond timestamp, then 24 random bytes
pub fn generate_nonce() -> [u8; 32] {
    let mut nonce = [0u8; 32];
    let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
    nonce[..8].copy_from_slice(&now_ms.to_be_bytes());
    OsRng.fill_bytes(&mut nonce[8..]);
    nonce
}

/// Millisecond timestamp embedded in a nonce
pub fn nonce_timestamp_ms(nonce: &[u8; 32]) -> u64 {
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&nonce[..8]);
    u64::from_be_bytes(ts)
}

pub fn sign_message(
    key_pair: &KeyPair,
    account_id: &AccountId,
    params: &SignMessageParams,
) -> Nep413Result<SignedMessage> {
    if key_pair.key_type() != KeyType::Ed25519 {
        return Err(Nep413Error::UnsupportedKeyType(key_pair.key_type()));
    }

    let hash = hash_message(params)?;
    let signature = key_pair.sign(&hash)?;
    Ok(SignedMessage {
        account_id: account_id.clone(),
        public_key: key_pair.public_key().clone(),
        signature: BASE64.encode(signature.as_bytes()),
        state: params.state.clone(),
    })
}

/// Every reading of `encoded` as a 64-byte signature, in the order wallets
/// commonly emit them: base64, `ed25519:` base58, then bare base58
fn signature_candidates(encoded: &str) -> Vec<Signature> {
    [
        BASE64.decode(encoded).ok(),
        encoded
            .strip_prefix("ed25519:")
            .and_then(|rest| bs58::decode(rest).into_vec().ok()),
        bs58::decode(encoded).into_vec().ok(),
    ]
    .into_iter()
    .flatten()
    .filter_map(|bytes| Signature::from_parts(KeyType::Ed25519, &bytes).ok())
    .collect()
}

fn within_age(nonce: &[u8; 32], max_age: Option<Duration>) -> bool {
    let Some(max_age) = max_age else {
        return true;
    };
    let issued_ms = nonce_timestamp_ms(nonce);
    let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
    if issued_ms > now_ms {
        return false;
    }
    now_ms - issued_ms <= max_age.as_millis() as u64
}

/// Check the signature and the nonce age
pub fn verify_signature(
    signed: &SignedMessage,
    params: &SignMessageParams,
    options: &VerifyOptions,
) -> bool {
    if signed.public_key.key_type() != KeyType::Ed25519 {
        return false;
    }
    if !within_age(&params.nonce, options.max_age) {
        debug!(account_id = %signed.account_id, "Message nonce outside allowed age");
        return false;
    }
    let Ok(hash) = hash_message(params) else {
        return false;
    };
    // A string may decode under more than one encoding; any verifying reading is accepted
    signature_candidates(&signed.signature)
        .iter()
        .any(|signature| signed.public_key.verify(&hash, signature))
}

/// Source of on-chain access keys for verification
#[async_trait]
pub trait AccessKeyLookup: Send + Sync {
    async fn access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
    ) -> RpcResult<AccessKeyView>;
}

#[async_trait]
impl<T: RpcProvider + ?Sized> AccessKeyLookup for T {
    async fn access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
    ) -> RpcResult<AccessKeyView> {
        self.view_access_key(account_id, public_key, &BlockReference::latest())
            .await
    }
}

/// [`verify_signature`], plus a check that the key belongs to the account
/// (and is full access when `require_full_access` is set)
pub async fn verify_signature_with_lookup(
    signed: &SignedMessage,
    params: &SignMessageParams,
    options: &VerifyOptions,
    lookup: &dyn AccessKeyLookup,
) -> bool {
    if !verify_signature(signed, params, options) {
        return false;
    }

    match lookup.access_key(&signed.account_id, &signed.public_key).await {
        Ok(view) => !options.require_full_access || view.permission.is_full_access(),
        Err(err) => {
            debug!(
                account_id = %signed.account_id,
                public_key = %signed.public_key,
                error = %err,
                "Access key lookup failed during message verification"
            );
            false
        }
    }
}

mod nonce_base64 {
    use super::BASE64;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(nonce: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(nonce))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = BASE64.decode(encoded).map_err(de::Error::custom)?;
        <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| de::Error::custom(format!("nonce must be 32 bytes, got {}", bytes.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> AccountId {
        "alice.near".parse().unwrap()
    }

    fn key() -> KeyPair {
        KeyPair::from_ed25519_seed(&[5; 32])
    }

    fn params() -> SignMessageParams {
        SignMessageParams::new("log me in", "app.example.com")
    }

    #[test]
    fn test_serialized_layout() {
        let params = SignMessageParams {
            message: "hi".into(),
            recipient: "r".into(),
            nonce: [7; 32],
            callback_url: None,
            state: None,
        };
        let bytes = serialize_message(&params).unwrap();

        assert_eq!(&bytes[..4], &NEP413_TAG.to_le_bytes());
        assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
        assert_eq!(&bytes[8..10], b"hi");
        assert_eq!(&bytes[10..42], &[7; 32]);
        assert_eq!(&bytes[42..46], &1u32.to_le_bytes());
        assert_eq!(bytes[46], b'r');
        assert_eq!(bytes[47], 0);
        assert_eq!(bytes.len(), 48);
    }

    #[test]
    fn test_sign_and_verify() {
        let params = params().with_state("csrf-token");
        let signed = sign_message(&key(), &account(), &params).unwrap();

        assert_eq!(signed.state.as_deref(), Some("csrf-token"));
        assert_eq!(BASE64.decode(&signed.signature).unwrap().len(), 64);
        assert!(verify_signature(&signed, &params, &VerifyOptions::default()));
    }

    #[test]
    fn test_tampering_fails() {
        let params = params();
        let signed = sign_message(&key(), &account(), &params).unwrap();
        let options = VerifyOptions::default();

        let mut changed = params.clone();
        changed.message.push('!');
        assert!(!verify_signature(&signed, &changed, &options));

        let mut changed = params.clone();
        changed.recipient = "evil.example.com".into();
        assert!(!verify_signature(&signed, &changed, &options));

        let mut changed = params.clone();
        changed.nonce[31] ^= 1;
        assert!(!verify_signature(&signed, &changed, &options));

        let mut changed = params.clone();
        changed.callback_url = Some("https://cb".into());
        assert!(!verify_signature(&signed, &changed, &options));
    }

    #[test]
    fn test_alternate_signature_encodings() {
        let params = params();
        let mut signed = sign_message(&key(), &account(), &params).unwrap();
        let raw = BASE64.decode(&signed.signature).unwrap();
        let options = VerifyOptions::default();

        signed.signature = format!("ed25519:{}", bs58::encode(&raw).into_string());
        assert!(verify_signature(&signed, &params, &options));

        signed.signature = bs58::encode(&raw).into_string();
        assert!(verify_signature(&signed, &params, &options));

        signed.signature = "not a signature".into();
        assert!(!verify_signature(&signed, &params, &options));
    }

    #[test]
    fn test_signature_candidates_by_encoding() {
        let signed = sign_message(&key(), &account(), &params()).unwrap();
        let raw = BASE64.decode(&signed.signature).unwrap();
        let expected = Signature::from_parts(KeyType::Ed25519, &raw).unwrap();

        for encoded in [
            signed.signature.clone(),
            format!("ed25519:{}", bs58::encode(&raw).into_string()),
            bs58::encode(&raw).into_string(),
        ] {
            assert_eq!(signature_candidates(&encoded), vec![expected.clone()]);
        }
        // Decodes, but not to 64 bytes
        assert!(signature_candidates(&BASE64.encode([1u8; 32])).is_empty());
    }

    #[test]
    fn test_expired_and_future_nonces() {
        let mut params = params();
        let now_ms = chrono::Utc::now().timestamp_millis() as u64;
        let options = VerifyOptions::default();

        params.nonce[..8].copy_from_slice(&(now_ms - 10 * 60 * 1000).to_be_bytes());
        let signed = sign_message(&key(), &account(), &params).unwrap();
        assert!(!verify_signature(&signed, &params, &options));
        let no_expiry = VerifyOptions {
            max_age: None,
            ..VerifyOptions::default()
        };
        assert!(verify_signature(&signed, &params, &no_expiry));

        params.nonce[..8].copy_from_slice(&(now_ms + 60 * 60 * 1000).to_be_bytes());
        let signed = sign_message(&key(), &account(), &params).unwrap();
        assert!(!verify_signature(&signed, &params, &options));
    }

    #[test]
    fn test_secp256k1_rejected() {
        let key = KeyPair::generate(KeyType::Secp256k1);
        assert!(matches!(
            sign_message(&key, &account(), &params()),
            Err(Nep413Error::UnsupportedKeyType(KeyType::Secp256k1))
        ));
    }

    #[test]
    fn test_nonce_timestamp_prefix() {
        let before = chrono::Utc::now().timestamp_millis() as u64;
        let nonce = generate_nonce();
        let after = chrono::Utc::now().timestamp_millis() as u64;
        let ts = nonce_timestamp_ms(&nonce);
        assert!(before <= ts && ts <= after);
        assert_ne!(generate_nonce()[8..], nonce[8..]);
    }

    #[test]
    fn test_signed_message_json_shape() {
        let params = params();
        let signed = sign_message(&key(), &account(), &params).unwrap();
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["accountId"], "alice.near");
        assert!(json["publicKey"].as_str().unwrap().starts_with("ed25519:"));
        assert!(json.get("state").is_none());

        let params_json = serde_json::to_value(&params).unwrap();
        let back: SignMessageParams = serde_json::from_value(params_json).unwrap();
        assert_eq!(back, params);
    }

    #[tokio::test]
    async fn test_lookup_checks_permission() {
        use crate::rpc_manager::AccessKeyPermissionView;
        use crate::test_utils::MockRpcProvider;

        let params = params();
        let signed = sign_message(&key(), &account(), &params).unwrap();
        let rpc = MockRpcProvider::new();
        let options = VerifyOptions::default();

        // Unknown key
        assert!(!verify_signature_with_lookup(&signed, &params, &options, &rpc).await);

        rpc.set_access_key(
            key().public_key(),
            3,
            AccessKeyPermissionView::FunctionCall {
                allowance: None,
                receiver_id: "app.near".parse().unwrap(),
                method_names: vec![],
            },
        );
        assert!(!verify_signature_with_lookup(&signed, &params, &options, &rpc).await);
        let relaxed = VerifyOptions {
            require_full_access: false,
            ..VerifyOptions::default()
        };
        assert!(verify_signature_with_lookup(&signed, &params, &relaxed, &rpc).await);

        rpc.set_access_key_nonce(key().public_key(), 3);
        assert!(verify_signature_with_lookup(&signed, &params, &options, &rpc).await);
    }
}
