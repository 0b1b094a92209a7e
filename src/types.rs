//! Core ledger types shared by every layer: account ids, hashes, gas and
//! token amounts, block references and wait-until policies.

use borsh::io::{Read, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::codec::invalid_data;

static ACCOUNT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([a-z\d]+[\-_])*[a-z\d]+\.)*([a-z\d]+[\-_])*[a-z\d]+$")
        .expect("account id pattern is a valid regex")
});

pub const MIN_ACCOUNT_ID_LEN: usize = 2;
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

/// Errors produced when parsing ledger primitives
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("Invalid account id '{0}'")]
    InvalidAccountId(String),

    #[error("Invalid crypto hash: {0}")]
    InvalidHash(String),

    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },

    /// Amount does not fit the declared width (`u64` gas, `u128` tokens)
    #[error("Amount '{value}' overflows {width}")]
    AmountOverflow { value: String, width: &'static str },

    #[error("Invalid wait-until value '{0}'")]
    InvalidWaitUntil(String),
}

// ============================================================================
// AccountId
// ============================================================================

/// Validated account identifier (`alice.near`, implicit hex ids, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(value: &str) -> Result<(), TypeError> {
        if value.len() < MIN_ACCOUNT_ID_LEN
            || value.len() > MAX_ACCOUNT_ID_LEN
            || !ACCOUNT_ID_RE.is_match(value)
        {
            return Err(TypeError::InvalidAccountId(value.to_string()));
        }
        Ok(())
    }

    /// True for 64-char lowercase hex ids derived from an Ed25519 key
    pub fn is_implicit(&self) -> bool {
        self.0.len() == 64 && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl FromStr for AccountId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for AccountId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

impl TryFrom<&str> for AccountId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as Deserialize>::deserialize(deserializer)?;
        AccountId::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl BorshSerialize for AccountId {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        BorshSerialize::serialize(&self.0, writer)
    }
}

impl BorshDeserialize for AccountId {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let raw = String::deserialize_reader(reader)?;
        AccountId::try_from(raw).map_err(|e| invalid_data(e.to_string()))
    }
}

// ============================================================================
// CryptoHash
// ============================================================================

/// 32-byte SHA-256 hash, rendered as base58
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub struct CryptoHash(pub [u8; 32]);

impl CryptoHash {
    /// SHA-256 of `bytes`
    pub fn hash(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            TypeError::InvalidHash(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoHash({})", self)
    }
}

impl FromStr for CryptoHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TypeError::InvalidHash(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for CryptoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CryptoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Amounts
// ============================================================================

/// Parse a non-negative decimal string scaled by `10^decimals`, with checked
/// arithmetic so oversized input is reported instead of wrapping.
fn parse_scaled(value: &str, decimals: u32, width: &'static str) -> Result<u128, TypeError> {
    let invalid = |reason: &str| TypeError::InvalidAmount {
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let overflow = || TypeError::AmountOverflow {
        value: value.to_string(),
        width,
    };

    let digits = value.trim().replace('_', "");
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits.as_str(), ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("empty amount"));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected unsigned decimal digits"));
    }
    if frac_part.len() > decimals as usize {
        return Err(invalid("too many decimal places for unit"));
    }

    let mut total: u128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        let d = u128::from(c as u8 - b'0');
        total = total
            .checked_mul(10)
            .and_then(|t| t.checked_add(d))
            .ok_or_else(overflow)?;
    }
    let pad = decimals - frac_part.len() as u32;
    let scale = 10u128.checked_pow(pad).ok_or_else(overflow)?;
    total.checked_mul(scale).ok_or_else(overflow)
}

fn split_unit(input: &str) -> (&str, &str) {
    let trimmed = input.trim();
    match trimmed.find(|c: char| c.is_ascii_alphabetic()) {
        Some(pos) => (trimmed[..pos].trim(), trimmed[pos..].trim()),
        None => (trimmed, ""),
    }
}

/// Gas units attached to a function call
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Gas(u64);

impl Gas {
    pub const ONE_TERA: u64 = 1_000_000_000_000;
    pub const ONE_GIGA: u64 = 1_000_000_000;

    /// Default gas for a function call (30 Tgas)
    pub const DEFAULT_CALL: Gas = Gas(30 * Self::ONE_TERA);
    /// Protocol maximum prepaid gas for one transaction (300 Tgas)
    pub const MAX: Gas = Gas(300 * Self::ONE_TERA);

    pub const fn from_gas(gas: u64) -> Self {
        Self(gas)
    }

    /// Whole teragas; errors instead of clamping when the product exceeds `u64`
    pub fn from_tgas(tgas: u64) -> Result<Self, TypeError> {
        tgas.checked_mul(Self::ONE_TERA)
            .map(Self)
            .ok_or_else(|| TypeError::AmountOverflow {
                value: format!("{} Tgas", tgas),
                width: "u64",
            })
    }

    pub const fn as_gas(&self) -> u64 {
        self.0
    }

    pub fn as_tgas(&self) -> u64 {
        self.0 / Self::ONE_TERA
    }

    /// Parse `"30 Tgas"`, `"5 Ggas"`, `"1000 gas"` or a bare integer.
    pub fn parse_units(input: &str) -> Result<Self, TypeError> {
        let (number, unit) = split_unit(input);
        let decimals = match unit.to_ascii_lowercase().as_str() {
            "" | "gas" => 0,
            "tgas" => 12,
            "ggas" => 9,
            _ => {
                return Err(TypeError::InvalidAmount {
                    value: input.to_string(),
                    reason: format!("unknown gas unit '{}'", unit),
                })
            }
        };
        let raw = parse_scaled(number, decimals, "u64")?;
        let gas = u64::try_from(raw).map_err(|_| TypeError::AmountOverflow {
            value: input.to_string(),
            width: "u64",
        })?;
        Ok(Self(gas))
    }
}

impl FromStr for Gas {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_units(s)
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % Self::ONE_TERA == 0 && self.0 > 0 {
            write!(f, "{} Tgas", self.0 / Self::ONE_TERA)
        } else {
            write!(f, "{} gas", self.0)
        }
    }
}

impl Serialize for Gas {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Gas {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GasVisitor;

        impl serde::de::Visitor<'_> for GasVisitor {
            type Value = Gas;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("gas as an integer or a decimal string")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Gas, E> {
                Ok(Gas(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Gas, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(GasVisitor)
    }
}

/// Token amount in yoctoNEAR (10^-24 NEAR)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct NearToken(u128);

impl NearToken {
    pub const ONE_NEAR: u128 = 1_000_000_000_000_000_000_000_000;
    pub const ONE_MILLINEAR: u128 = 1_000_000_000_000_000_000_000;

    pub const fn from_yocto(yocto: u128) -> Self {
        Self(yocto)
    }

    pub fn from_near(near: u128) -> Result<Self, TypeError> {
        near.checked_mul(Self::ONE_NEAR)
            .map(Self)
            .ok_or_else(|| TypeError::AmountOverflow {
                value: format!("{} NEAR", near),
                width: "u128",
            })
    }

    pub const fn as_yoctonear(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse `"1.5 NEAR"`, `"10 mNEAR"`, `"100 yocto"` or a bare yocto integer.
    pub fn parse_yocto(input: &str) -> Result<Self, TypeError> {
        let (number, unit) = split_unit(input);
        let decimals = match unit.to_ascii_lowercase().as_str() {
            "" | "yocto" | "yoctonear" => 0,
            "near" | "n" => 24,
            "mnear" | "millinear" => 21,
            _ => {
                return Err(TypeError::InvalidAmount {
                    value: input.to_string(),
                    reason: format!("unknown token unit '{}'", unit),
                })
            }
        };
        Ok(Self(parse_scaled(number, decimals, "u128")?))
    }
}

impl FromStr for NearToken {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_yocto(s)
    }
}

impl fmt::Display for NearToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % Self::ONE_NEAR == 0 {
            write!(f, "{} NEAR", self.0 / Self::ONE_NEAR)
        } else {
            write!(f, "{} yoctoNEAR", self.0)
        }
    }
}

impl Serialize for NearToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for NearToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TokenVisitor;

        impl serde::de::Visitor<'_> for TokenVisitor {
            type Value = NearToken;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("yoctoNEAR as a decimal string or an integer")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<NearToken, E> {
                Ok(NearToken(u128::from(v)))
            }

            fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<NearToken, E> {
                Ok(NearToken(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<NearToken, E> {
                v.parse::<u128>().map(NearToken).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(TokenVisitor)
    }
}

/// Conversion into [`Gas`] that reports overflow instead of truncating
pub trait IntoGas {
    fn into_gas(self) -> Result<Gas, TypeError>;
}

impl IntoGas for Gas {
    fn into_gas(self) -> Result<Gas, TypeError> {
        Ok(self)
    }
}

impl IntoGas for u64 {
    fn into_gas(self) -> Result<Gas, TypeError> {
        Ok(Gas(self))
    }
}

impl IntoGas for u128 {
    fn into_gas(self) -> Result<Gas, TypeError> {
        u64::try_from(self)
            .map(Gas)
            .map_err(|_| TypeError::AmountOverflow {
                value: self.to_string(),
                width: "u64",
            })
    }
}

impl IntoGas for &str {
    fn into_gas(self) -> Result<Gas, TypeError> {
        Gas::parse_units(self)
    }
}

impl IntoGas for String {
    fn into_gas(self) -> Result<Gas, TypeError> {
        Gas::parse_units(&self)
    }
}

/// Conversion into [`NearToken`] that reports overflow instead of truncating
pub trait IntoNearToken {
    fn into_near_token(self) -> Result<NearToken, TypeError>;
}

impl IntoNearToken for NearToken {
    fn into_near_token(self) -> Result<NearToken, TypeError> {
        Ok(self)
    }
}

impl IntoNearToken for u128 {
    fn into_near_token(self) -> Result<NearToken, TypeError> {
        Ok(NearToken(self))
    }
}

impl IntoNearToken for &str {
    fn into_near_token(self) -> Result<NearToken, TypeError> {
        NearToken::parse_yocto(self)
    }
}

impl IntoNearToken for String {
    fn into_near_token(self) -> Result<NearToken, TypeError> {
        NearToken::parse_yocto(&self)
    }
}

// ============================================================================
// Block references and wait policies
// ============================================================================

/// Finality level used when querying chain state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Finality {
    Optimistic,
    NearFinal,
    #[default]
    Final,
}

impl Finality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Finality::Optimistic => "optimistic",
            Finality::NearFinal => "near-final",
            Finality::Final => "final",
        }
    }
}

/// Which block a query is evaluated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReference {
    Finality(Finality),
    Height(u64),
    Hash(CryptoHash),
}

impl BlockReference {
    pub fn latest() -> Self {
        BlockReference::Finality(Finality::Final)
    }

    pub fn optimistic() -> Self {
        BlockReference::Finality(Finality::Optimistic)
    }

    /// JSON-RPC params fragment for this reference
    pub fn to_params(&self) -> serde_json::Value {
        match self {
            BlockReference::Finality(f) => serde_json::json!({ "finality": f.as_str() }),
            BlockReference::Height(h) => serde_json::json!({ "block_id": h }),
            BlockReference::Hash(h) => serde_json::json!({ "block_id": h.to_string() }),
        }
    }
}

impl Default for BlockReference {
    fn default() -> Self {
        Self::latest()
    }
}

/// Point in a transaction's lifecycle at which `send_tx` returns.
///
/// Variants are declared in increasing strictness, so `Ord` follows the
/// ledger's ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitUntil {
    /// Syntactic validation only
    None,
    /// Included in a block, nonce consumed
    Included,
    /// All receipts executed optimistically
    #[default]
    ExecutedOptimistic,
    /// Containing block is final
    IncludedFinal,
    /// Both of the previous two
    Executed,
    /// Full finality including all downstream receipts
    Final,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::None => "NONE",
            WaitUntil::Included => "INCLUDED",
            WaitUntil::ExecutedOptimistic => "EXECUTED_OPTIMISTIC",
            WaitUntil::IncludedFinal => "INCLUDED_FINAL",
            WaitUntil::Executed => "EXECUTED",
            WaitUntil::Final => "FINAL",
        }
    }

    /// Whether receipts have executed by the time this level is reached
    pub fn executes_receipts(&self) -> bool {
        matches!(
            self,
            WaitUntil::ExecutedOptimistic | WaitUntil::Executed | WaitUntil::Final
        )
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitUntil {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NONE" => Ok(WaitUntil::None),
            "INCLUDED" => Ok(WaitUntil::Included),
            "EXECUTED_OPTIMISTIC" => Ok(WaitUntil::ExecutedOptimistic),
            "INCLUDED_FINAL" => Ok(WaitUntil::IncludedFinal),
            "EXECUTED" => Ok(WaitUntil::Executed),
            "FINAL" => Ok(WaitUntil::Final),
            _ => Err(TypeError::InvalidWaitUntil(s.to_string())),
        }
    }
}

/// Serde adapter for byte fields that travel as base64 in JSON
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_validation() {
        assert!("alice.near".parse::<AccountId>().is_ok());
        assert!("app-1_x.testnet".parse::<AccountId>().is_ok());
        assert!("a".parse::<AccountId>().is_err());
        assert!("Alice.near".parse::<AccountId>().is_err());
        assert!("alice..near".parse::<AccountId>().is_err());
        assert!("-alice.near".parse::<AccountId>().is_err());
        assert!("a".repeat(65).parse::<AccountId>().is_err());
    }

    #[test]
    fn test_account_id_borsh_rejects_invalid() {
        let bytes = crate::codec::encode(&"Bad Id".to_string()).unwrap();
        assert!(crate::codec::decode::<AccountId>(&bytes).is_err());
    }

    #[test]
    fn test_crypto_hash_base58_round_trip() {
        let hash = CryptoHash::hash(b"near");
        let parsed: CryptoHash = hash.to_string().parse().unwrap();
        assert_eq!(parsed, hash);
        assert!("abc".parse::<CryptoHash>().is_err());
    }

    #[test]
    fn test_near_token_parsing() {
        assert_eq!(
            NearToken::parse_yocto("1 NEAR").unwrap(),
            NearToken::from_near(1).unwrap()
        );
        assert_eq!(
            NearToken::parse_yocto("1.5 NEAR").unwrap().as_yoctonear(),
            1_500_000_000_000_000_000_000_000
        );
        assert_eq!(NearToken::parse_yocto("42").unwrap().as_yoctonear(), 42);
        assert!(NearToken::parse_yocto("1.0000000000000000000000001 NEAR").is_err());
        assert!(NearToken::parse_yocto("-1").is_err());
    }

    #[test]
    fn test_amount_overflow_is_reported() {
        let too_big = "340282366920938463463374607431768211456"; // u128::MAX + 1
        assert!(matches!(
            NearToken::parse_yocto(too_big),
            Err(TypeError::AmountOverflow { width: "u128", .. })
        ));
        assert!(matches!(
            Gas::parse_units("18446744073709551616"),
            Err(TypeError::AmountOverflow { width: "u64", .. })
        ));
        assert!(matches!(
            (u64::MAX as u128 + 1).into_gas(),
            Err(TypeError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_unit_constructors_reject_overflow() {
        assert_eq!(Gas::from_tgas(300).unwrap(), Gas::MAX);
        assert!(matches!(
            Gas::from_tgas(u64::MAX),
            Err(TypeError::AmountOverflow { width: "u64", .. })
        ));
        assert!(matches!(
            NearToken::from_near(u128::MAX / 2),
            Err(TypeError::AmountOverflow { width: "u128", .. })
        ));
        assert_eq!(
            NearToken::from_near(2).unwrap().as_yoctonear(),
            2 * NearToken::ONE_NEAR
        );
    }

    #[test]
    fn test_gas_parsing() {
        assert_eq!(Gas::parse_units("30 Tgas").unwrap(), Gas::DEFAULT_CALL);
        assert_eq!(Gas::parse_units("5 ggas").unwrap().as_gas(), 5_000_000_000);
        assert_eq!("100".into_gas().unwrap().as_gas(), 100);
    }

    #[test]
    fn test_wait_until_ordering_and_serde() {
        assert!(WaitUntil::None < WaitUntil::Included);
        assert!(WaitUntil::Included < WaitUntil::ExecutedOptimistic);
        assert!(WaitUntil::ExecutedOptimistic < WaitUntil::IncludedFinal);
        assert!(WaitUntil::IncludedFinal < WaitUntil::Executed);
        assert!(WaitUntil::Executed < WaitUntil::Final);
        assert_eq!(WaitUntil::default(), WaitUntil::ExecutedOptimistic);

        let json = serde_json::to_string(&WaitUntil::IncludedFinal).unwrap();
        assert_eq!(json, "\"INCLUDED_FINAL\"");
        assert_eq!("executed-optimistic".parse::<WaitUntil>().unwrap(), WaitUntil::ExecutedOptimistic);
    }

    #[test]
    fn test_near_token_serde_accepts_string_and_number() {
        let a: NearToken = serde_json::from_str("\"1000\"").unwrap();
        let b: NearToken = serde_json::from_str("1000").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"1000\"");
    }
}
