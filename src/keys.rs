//! Key & signature subsystem
//!
//! Two algorithms are supported, selected at runtime by [`KeyType`]:
//! - **Ed25519**: 32-byte public key, 64-byte deterministic signature (RFC 8032)
//! - **Secp256k1**: 64-byte raw public key (uncompressed point without the
//!   `0x04` header), 65-byte recoverable signature laid out `r ‖ s ‖ v`
//!
//! Every encode/sign/verify site matches exhaustively on the variant, so a
//! third algorithm is a compiler-enforced change.

use borsh::io::{Read, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::codec::{read_tag, unknown_tag};
use crate::types::AccountId;

pub const ED25519_PUBLIC_KEY_LEN: usize = 32;
pub const ED25519_SIGNATURE_LEN: usize = 64;
pub const ED25519_SECRET_KEY_LEN: usize = 64;
pub const SECP256K1_PUBLIC_KEY_LEN: usize = 64;
pub const SECP256K1_SIGNATURE_LEN: usize = 65;
pub const SECP256K1_SECRET_KEY_LEN: usize = 32;

/// Errors raised while parsing, generating or using keys
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Unknown prefix, malformed base58 or wrong length for the algorithm
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Secp256k1 signs 32-byte digests only
    #[error("Invalid hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("Signature recovery failed: {0}")]
    Recovery(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Result type for key operations
pub type KeyResult<T> = Result<T, KeyError>;

// ============================================================================
// KeyType
// ============================================================================

/// Signature algorithm; the discriminant is the wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Ed25519,
    Secp256k1,
}

impl KeyType {
    pub const ED25519_TAG: u8 = 0;
    pub const SECP256K1_TAG: u8 = 1;

    pub fn tag(&self) -> u8 {
        match self {
            KeyType::Ed25519 => Self::ED25519_TAG,
            KeyType::Secp256k1 => Self::SECP256K1_TAG,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "ed25519",
            KeyType::Secp256k1 => "secp256k1",
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            Self::ED25519_TAG => Some(KeyType::Ed25519),
            Self::SECP256K1_TAG => Some(KeyType::Secp256k1),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for KeyType {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(KeyType::Ed25519),
            "secp256k1" => Ok(KeyType::Secp256k1),
            other => Err(KeyError::InvalidKeyFormat(format!(
                "unknown key type '{}'",
                other
            ))),
        }
    }
}

/// Split `"<prefix>:<base58>"` and decode the payload
fn split_prefixed(input: &str) -> KeyResult<(KeyType, Vec<u8>)> {
    let (prefix, payload) = input.split_once(':').ok_or_else(|| {
        KeyError::InvalidKeyFormat(format!("missing algorithm prefix in '{}'", input))
    })?;
    let key_type = prefix.parse::<KeyType>()?;
    let bytes = bs58::decode(payload)
        .into_vec()
        .map_err(|e| KeyError::InvalidKeyFormat(format!("malformed base58: {}", e)))?;
    Ok((key_type, bytes))
}

fn fixed<const N: usize>(bytes: &[u8], what: &str, key_type: KeyType) -> KeyResult<[u8; N]> {
    bytes.try_into().map_err(|_| {
        KeyError::InvalidKeyFormat(format!(
            "{} {} must be {} bytes, got {}",
            key_type,
            what,
            N,
            bytes.len()
        ))
    })
}

// ============================================================================
// PublicKey
// ============================================================================

/// Public key tagged with its algorithm
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublicKey {
    Ed25519([u8; ED25519_PUBLIC_KEY_LEN]),
    Secp256k1([u8; SECP256K1_PUBLIC_KEY_LEN]),
}

impl PublicKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Ed25519(_) => KeyType::Ed25519,
            PublicKey::Secp256k1(_) => KeyType::Secp256k1,
        }
    }

    pub fn key_data(&self) -> &[u8] {
        match self {
            PublicKey::Ed25519(bytes) => bytes,
            PublicKey::Secp256k1(bytes) => bytes,
        }
    }

    /// Build from raw bytes; the length must match the algorithm
    pub fn from_parts(key_type: KeyType, data: &[u8]) -> KeyResult<Self> {
        match key_type {
            KeyType::Ed25519 => Ok(PublicKey::Ed25519(fixed(data, "public key", key_type)?)),
            KeyType::Secp256k1 => Ok(PublicKey::Secp256k1(fixed(data, "public key", key_type)?)),
        }
    }

    /// Verify `signature` over `message`.
    ///
    /// For Secp256k1 `message` must be the 32-byte digest that was signed.
    /// Mismatched algorithms never verify.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        match (self, signature) {
            (PublicKey::Ed25519(pk), Signature::Ed25519(sig)) => {
                let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(pk) else {
                    return false;
                };
                let sig = ed25519_dalek::Signature::from_bytes(sig);
                key.verify(message, &sig).is_ok()
            }
            (PublicKey::Secp256k1(pk), Signature::Secp256k1(sig)) => {
                if message.len() != 32 {
                    return false;
                }
                let Ok(key) = secp256k1_verifying_key(pk) else {
                    return false;
                };
                let Ok(sig) = K256Signature::from_slice(&sig[..64]) else {
                    return false;
                };
                key.verify_prehash(message, &sig).is_ok()
            }
            _ => false,
        }
    }

    /// Implicit account id (lowercase hex) for Ed25519 keys
    pub fn implicit_account_id(&self) -> Option<AccountId> {
        match self {
            PublicKey::Ed25519(bytes) => hex::encode(bytes).parse().ok(),
            PublicKey::Secp256k1(_) => None,
        }
    }
}

fn secp256k1_verifying_key(raw: &[u8; SECP256K1_PUBLIC_KEY_LEN]) -> KeyResult<VerifyingKey> {
    let mut sec1 = [0u8; SECP256K1_PUBLIC_KEY_LEN + 1];
    sec1[0] = 0x04;
    sec1[1..].copy_from_slice(raw);
    VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|e| KeyError::InvalidKeyFormat(format!("invalid secp256k1 point: {}", e)))
}

fn secp256k1_raw_public(key: &VerifyingKey) -> [u8; SECP256K1_PUBLIC_KEY_LEN] {
    let point = key.to_encoded_point(false);
    let mut raw = [0u8; SECP256K1_PUBLIC_KEY_LEN];
    // Uncompressed SEC1 is 0x04 ‖ x ‖ y
    raw.copy_from_slice(&point.as_bytes()[1..]);
    raw
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.key_type(),
            bs58::encode(self.key_data()).into_string()
        )
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key_type, bytes) = split_prefixed(s)?;
        Self::from_parts(key_type, &bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl BorshSerialize for PublicKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        writer.write_all(&[self.key_type().tag()])?;
        writer.write_all(self.key_data())
    }
}

impl BorshDeserialize for PublicKey {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let tag = read_tag(reader)?;
        match KeyType::from_tag(tag) {
            Some(KeyType::Ed25519) => Ok(PublicKey::Ed25519(<[u8; 32]>::deserialize_reader(reader)?)),
            Some(KeyType::Secp256k1) => {
                Ok(PublicKey::Secp256k1(<[u8; 64]>::deserialize_reader(reader)?))
            }
            None => Err(unknown_tag("PublicKey", tag)),
        }
    }
}

// ============================================================================
// Signature
// ============================================================================

/// Signature tagged with its algorithm
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    Ed25519([u8; ED25519_SIGNATURE_LEN]),
    /// `r(32) ‖ s(32) ‖ v(1)`
    Secp256k1([u8; SECP256K1_SIGNATURE_LEN]),
}

impl Signature {
    pub fn key_type(&self) -> KeyType {
        match self {
            Signature::Ed25519(_) => KeyType::Ed25519,
            Signature::Secp256k1(_) => KeyType::Secp256k1,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Signature::Ed25519(bytes) => bytes,
            Signature::Secp256k1(bytes) => bytes,
        }
    }

    pub fn from_parts(key_type: KeyType, data: &[u8]) -> KeyResult<Self> {
        let check = |expected: usize| {
            if data.len() == expected {
                Ok(())
            } else {
                Err(KeyError::InvalidSignature(format!(
                    "{} signature must be {} bytes, got {}",
                    key_type,
                    expected,
                    data.len()
                )))
            }
        };
        match key_type {
            KeyType::Ed25519 => {
                check(ED25519_SIGNATURE_LEN)?;
                let mut out = [0u8; ED25519_SIGNATURE_LEN];
                out.copy_from_slice(data);
                Ok(Signature::Ed25519(out))
            }
            KeyType::Secp256k1 => {
                check(SECP256K1_SIGNATURE_LEN)?;
                let mut out = [0u8; SECP256K1_SIGNATURE_LEN];
                out.copy_from_slice(data);
                Ok(Signature::Secp256k1(out))
            }
        }
    }

    /// Recovery byte of a Secp256k1 signature
    pub fn recovery_id(&self) -> Option<u8> {
        match self {
            Signature::Ed25519(_) => None,
            Signature::Secp256k1(bytes) => Some(bytes[64]),
        }
    }

    /// Recover the signer's public key from a Secp256k1 signature over `digest`
    pub fn recover(&self, digest: &[u8; 32]) -> KeyResult<PublicKey> {
        match self {
            Signature::Ed25519(_) => Err(KeyError::Recovery(
                "ed25519 signatures carry no recovery id".to_string(),
            )),
            Signature::Secp256k1(bytes) => {
                let sig = K256Signature::from_slice(&bytes[..64])
                    .map_err(|e| KeyError::Recovery(e.to_string()))?;
                let recovery_id = RecoveryId::from_byte(bytes[64])
                    .ok_or_else(|| KeyError::Recovery(format!("bad recovery id {}", bytes[64])))?;
                let key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
                    .map_err(|e| KeyError::Recovery(e.to_string()))?;
                Ok(PublicKey::Secp256k1(secp256k1_raw_public(&key)))
            }
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.key_type(),
            bs58::encode(self.as_bytes()).into_string()
        )
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key_type, bytes) = split_prefixed(s)?;
        Self::from_parts(key_type, &bytes)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl BorshSerialize for Signature {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        writer.write_all(&[self.key_type().tag()])?;
        writer.write_all(self.as_bytes())
    }
}

impl BorshDeserialize for Signature {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let tag = read_tag(reader)?;
        match KeyType::from_tag(tag) {
            Some(KeyType::Ed25519) => Ok(Signature::Ed25519(<[u8; 64]>::deserialize_reader(reader)?)),
            Some(KeyType::Secp256k1) => {
                Ok(Signature::Secp256k1(<[u8; 65]>::deserialize_reader(reader)?))
            }
            None => Err(unknown_tag("Signature", tag)),
        }
    }
}

// ============================================================================
// SecretKey / KeyPair
// ============================================================================

/// Secret key material. Both backends zeroize their scalars on drop.
#[derive(Clone)]
pub enum SecretKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(SigningKey),
}

impl SecretKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            SecretKey::Ed25519(_) => KeyType::Ed25519,
            SecretKey::Secp256k1(_) => KeyType::Secp256k1,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            SecretKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes()),
            SecretKey::Secp256k1(key) => {
                PublicKey::Secp256k1(secp256k1_raw_public(key.verifying_key()))
            }
        }
    }

    /// Prefixed base58 text form. Ed25519 uses the 64-byte `seed ‖ public` layout.
    pub fn to_prefixed_string(&self) -> String {
        let bytes: Zeroizing<Vec<u8>> = match self {
            SecretKey::Ed25519(key) => Zeroizing::new(key.to_keypair_bytes().to_vec()),
            SecretKey::Secp256k1(key) => Zeroizing::new(key.to_bytes().to_vec()),
        };
        format!(
            "{}:{}",
            self.key_type(),
            bs58::encode(bytes.as_slice()).into_string()
        )
    }

    fn from_parts(key_type: KeyType, bytes: &[u8]) -> KeyResult<Self> {
        match key_type {
            KeyType::Ed25519 => {
                let seed: [u8; 32] = match bytes.len() {
                    32 | ED25519_SECRET_KEY_LEN => fixed(&bytes[..32], "secret seed", key_type)?,
                    n => {
                        return Err(KeyError::InvalidKeyFormat(format!(
                            "ed25519 secret key must be 32 or 64 bytes, got {}",
                            n
                        )))
                    }
                };
                let key = ed25519_dalek::SigningKey::from_bytes(&seed);
                if bytes.len() == ED25519_SECRET_KEY_LEN
                    && key.verifying_key().as_bytes()[..] != bytes[32..]
                {
                    return Err(KeyError::InvalidKeyFormat(
                        "ed25519 secret key does not match embedded public key".to_string(),
                    ));
                }
                Ok(SecretKey::Ed25519(key))
            }
            KeyType::Secp256k1 => {
                if bytes.len() != SECP256K1_SECRET_KEY_LEN {
                    return Err(KeyError::InvalidKeyFormat(format!(
                        "secp256k1 secret key must be 32 bytes, got {}",
                        bytes.len()
                    )));
                }
                SigningKey::from_slice(bytes)
                    .map(SecretKey::Secp256k1)
                    .map_err(|e| KeyError::InvalidKeyFormat(format!("invalid secp256k1 scalar: {}", e)))
            }
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({}:<redacted>)", self.key_type())
    }
}

impl FromStr for SecretKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key_type, bytes) = split_prefixed(s)?;
        let bytes = Zeroizing::new(bytes);
        Self::from_parts(key_type, &bytes)
    }
}

/// Secret key plus its cached public key
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from OS randomness
    pub fn generate(key_type: KeyType) -> Self {
        let secret = match key_type {
            KeyType::Ed25519 => SecretKey::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            KeyType::Secp256k1 => SecretKey::Secp256k1(SigningKey::random(&mut OsRng)),
        };
        Self::from_secret(secret)
    }

    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Ed25519 key pair from a 32-byte seed
    pub fn from_ed25519_seed(seed: &[u8; 32]) -> Self {
        Self::from_secret(SecretKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed)))
    }

    pub fn key_type(&self) -> KeyType {
        self.secret.key_type()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// Sign `message`.
    ///
    /// Deterministic for a given (key, message). Ed25519 signs the message
    /// itself; Secp256k1 signs a 32-byte digest with RFC 6979 nonces and
    /// rejects any other length.
    pub fn sign(&self, message: &[u8]) -> KeyResult<Signature> {
        match &self.secret {
            SecretKey::Ed25519(key) => Ok(Signature::Ed25519(key.sign(message).to_bytes())),
            SecretKey::Secp256k1(key) => {
                if message.len() != 32 {
                    return Err(KeyError::InvalidHashLength(message.len()));
                }
                let (sig, recovery_id) = key
                    .sign_prehash_recoverable(message)
                    .map_err(|e| KeyError::Signing(e.to_string()))?;
                let mut out = [0u8; SECP256K1_SIGNATURE_LEN];
                out[..64].copy_from_slice(&sig.to_bytes());
                out[64] = recovery_id.to_byte();
                Ok(Signature::Secp256k1(out))
            }
        }
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public.verify(message, signature)
    }

    /// Prefixed secret key string, suitable for a key store
    pub fn to_secret_string(&self) -> String {
        self.secret.to_prefixed_string()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for KeyPair {}

impl FromStr for KeyPair {
    type Err = KeyError;

    /// Parse `ed25519:<base58>` or `secp256k1:<base58>` secret key text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_secret(s.parse()?))
    }
}
