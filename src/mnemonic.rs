//! BIP-39 mnemonic phrases and SLIP-10 Ed25519 derivation
//!
//! Seed phrases are turned into keys the way ledger wallets do it:
//! - BIP-39: phrase (+ optional passphrase) → 64-byte seed (PBKDF2-HMAC-SHA512)
//! - SLIP-10: hardened Ed25519 derivation along `m/44'/397'/i'`
//! - the derived 32-byte private key seeds an Ed25519 key pair
//!
//! Derivation from a fixed phrase and path is deterministic across processes.

use bip39::{Language, Mnemonic};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::keys::KeyPair;

type HmacSha512 = Hmac<Sha512>;

/// SLIP-44 coin type of the ledger
pub const NEAR_COIN_TYPE: u32 = 397;

/// Derivation path used when none is given
pub const DEFAULT_HD_PATH: &str = "m/44'/397'/0'";

const HARDENED_OFFSET: u32 = 0x8000_0000;
const ED25519_CURVE_KEY: &[u8] = b"ed25519 seed";

/// Mnemonic and derivation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("Invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid word count: {0} (must be 12, 15, 18, 21, or 24)")]
    InvalidWordCount(usize),

    /// Malformed path or a non-hardened segment (Ed25519 only supports hardened)
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),
}

/// Result type for mnemonic operations
pub type MnemonicResult<T> = Result<T, MnemonicError>;

/// Generate a new English BIP-39 phrase with `word_count` words
pub fn generate_mnemonic(word_count: usize) -> MnemonicResult<String> {
    let entropy_bits = match word_count {
        12 => 128,
        15 => 160,
        18 => 192,
        21 => 224,
        24 => 256,
        _ => return Err(MnemonicError::InvalidWordCount(word_count)),
    };

    let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
    rand::rngs::OsRng.fill_bytes(entropy.as_mut_slice());

    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| MnemonicError::InvalidMnemonic(format!("{:?}", e)))?;
    Ok(mnemonic.to_string())
}

/// Check that `phrase` is a valid English BIP-39 phrase
pub fn validate_mnemonic(phrase: &str) -> MnemonicResult<()> {
    Mnemonic::parse_in_normalized(Language::English, phrase)
        .map(|_| ())
        .map_err(|e| MnemonicError::InvalidMnemonic(format!("{:?}", e)))
}

/// 64-byte BIP-39 seed for `phrase` and optional passphrase
pub fn mnemonic_to_seed(phrase: &str, passphrase: Option<&str>) -> MnemonicResult<Zeroizing<[u8; 64]>> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| MnemonicError::InvalidMnemonic(format!("{:?}", e)))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase.unwrap_or(""))))
}

/// Path for account index `i`: `m/44'/397'/i'`
pub fn hd_path_for_index(index: u32) -> String {
    format!("m/44'/{}'/{}'", NEAR_COIN_TYPE, index)
}

/// Parse `m/44'/397'/0'` into hardened indices
pub fn parse_hd_path(path: &str) -> MnemonicResult<Vec<u32>> {
    let mut segments = path.trim().split('/');
    if segments.next() != Some("m") {
        return Err(MnemonicError::InvalidPath(format!(
            "'{}' must start with 'm/'",
            path
        )));
    }

    segments
        .map(|segment| {
            let raw = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
                .ok_or_else(|| {
                    MnemonicError::InvalidPath(format!(
                        "segment '{}' is not hardened",
                        segment
                    ))
                })?;
            let index: u32 = raw.parse().map_err(|_| {
                MnemonicError::InvalidPath(format!("segment '{}' is not a number", segment))
            })?;
            if index >= HARDENED_OFFSET {
                return Err(MnemonicError::InvalidPath(format!(
                    "segment '{}' out of range",
                    segment
                )));
            }
            Ok(index | HARDENED_OFFSET)
        })
        .collect()
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> MnemonicResult<Zeroizing<[u8; 64]>> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| MnemonicError::Derivation(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// SLIP-10 Ed25519 derivation of the 32-byte private key at `path`
pub fn derive_ed25519_seed(seed: &[u8], path: &[u32]) -> MnemonicResult<Zeroizing<[u8; 32]>> {
    let master = hmac_sha512(ED25519_CURVE_KEY, &[seed])?;
    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&master[..32]);
    chain_code.copy_from_slice(&master[32..]);

    for &index in path {
        if index < HARDENED_OFFSET {
            return Err(MnemonicError::InvalidPath(format!(
                "index {} is not hardened",
                index
            )));
        }
        // Data = 0x00 ‖ key ‖ ser32(index)
        let child = hmac_sha512(
            chain_code.as_slice(),
            &[&[0u8][..], key.as_slice(), &index.to_be_bytes()[..]],
        )?;
        key.copy_from_slice(&child[..32]);
        chain_code.copy_from_slice(&child[32..]);
    }

    Ok(key)
}

/// Derive an Ed25519 key pair from `phrase` along `path`
pub fn derive_key(phrase: &str, passphrase: Option<&str>, path: &str) -> MnemonicResult<KeyPair> {
    let indices = parse_hd_path(path)?;
    let seed = mnemonic_to_seed(phrase, passphrase)?;
    let private = derive_ed25519_seed(seed.as_slice(), &indices)?;
    Ok(KeyPair::from_ed25519_seed(&private))
}

impl KeyPair {
    /// Ed25519 key for account index `index` (`m/44'/397'/index'`)
    pub fn from_mnemonic(phrase: &str, index: u32) -> MnemonicResult<Self> {
        derive_key(phrase, None, &hd_path_for_index(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyType;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon \
                          abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_mnemonic_word_counts() {
        for words in [12, 15, 18, 21, 24] {
            let phrase = generate_mnemonic(words).unwrap();
            assert_eq!(phrase.split_whitespace().count(), words);
            assert!(validate_mnemonic(&phrase).is_ok());
        }
        assert_eq!(generate_mnemonic(13), Err(MnemonicError::InvalidWordCount(13)));
    }

    #[test]
    fn test_invalid_phrase_rejected() {
        let bad = "abandon abandon abandon abandon abandon abandon \
                   abandon abandon abandon abandon abandon abandon";
        assert!(matches!(
            mnemonic_to_seed(bad, None),
            Err(MnemonicError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_parse_hd_path() {
        assert_eq!(
            parse_hd_path("m/44'/397'/0'").unwrap(),
            vec![44 | HARDENED_OFFSET, 397 | HARDENED_OFFSET, HARDENED_OFFSET]
        );
        assert!(parse_hd_path("m/44'/397'/0").is_err());
        assert!(parse_hd_path("44'/397'").is_err());
        assert!(parse_hd_path("m/x'").is_err());
    }

    #[test]
    fn test_slip10_ed25519_vector() {
        // SLIP-0010 test vector 1 for ed25519
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();

        let master = derive_ed25519_seed(&seed, &[]).unwrap();
        assert_eq!(
            hex::encode(master.as_slice()),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );

        let child = derive_ed25519_seed(&seed, &[HARDENED_OFFSET]).unwrap();
        assert_eq!(
            hex::encode(child.as_slice()),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = KeyPair::from_mnemonic(PHRASE, 0).unwrap();
        let b = derive_key(PHRASE, None, DEFAULT_HD_PATH).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.key_type(), KeyType::Ed25519);

        let next = KeyPair::from_mnemonic(PHRASE, 1).unwrap();
        assert_ne!(a.public_key(), next.public_key());

        let with_pass = derive_key(PHRASE, Some("secret"), DEFAULT_HD_PATH).unwrap();
        assert_ne!(a.public_key(), with_pass.public_key());
    }
}
