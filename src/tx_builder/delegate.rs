//! Meta-transactions (delegate actions)
//!
//! A delegate action is signed by the sender and relayed by a third party
//! who pays for the gas. The signed payload is prefixed with a domain tag so
//! that it can never be confused with a plain transaction.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use borsh::io::{Read, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use super::actions::{Action, ActionTag};
use crate::codec::{decode, encode, invalid_data, WireError, WireResult};
use crate::keys::{KeyError, KeyPair, PublicKey, Signature};
use crate::types::{AccountId, CryptoHash};

/// Domain tag prepended to a delegate action before hashing (2^30 + 366)
pub const DELEGATE_ACTION_PREFIX: u32 = 1_073_742_190;

/// An action that is allowed inside a delegate action.
///
/// Nested delegation is rejected both when constructing and when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Action", into = "Action")]
pub struct NonDelegateAction(Action);

impl NonDelegateAction {
    pub fn action(&self) -> &Action {
        &self.0
    }

    pub fn into_inner(self) -> Action {
        self.0
    }
}

impl TryFrom<Action> for NonDelegateAction {
    type Error = WireError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        if matches!(action, Action::SignedDelegate(_)) {
            return Err(WireError::malformed(
                "NonDelegateAction",
                "delegate actions cannot be nested",
            ));
        }
        Ok(Self(action))
    }
}

impl From<NonDelegateAction> for Action {
    fn from(action: NonDelegateAction) -> Self {
        action.0
    }
}

impl BorshSerialize for NonDelegateAction {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        BorshSerialize::serialize(&self.0, writer)
    }
}

impl BorshDeserialize for NonDelegateAction {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let action = Action::deserialize_reader(reader)?;
        if action.tag() == ActionTag::SignedDelegate {
            return Err(invalid_data("delegate actions cannot be nested"));
        }
        Ok(Self(action))
    }
}

/// Actions a relayer will submit on behalf of `sender_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DelegateAction {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub actions: Vec<NonDelegateAction>,
    /// Must exceed the nonce of `public_key`'s access key
    pub nonce: u64,
    /// Last block height at which the relayer may submit
    pub max_block_height: u64,
    pub public_key: PublicKey,
}

impl DelegateAction {
    /// Bytes that are hashed and signed: `borsh(prefix) ‖ borsh(self)`
    pub fn signable_bytes(&self) -> WireResult<Vec<u8>> {
        let mut bytes = encode(&DELEGATE_ACTION_PREFIX)?;
        bytes.extend(encode(self)?);
        Ok(bytes)
    }

    pub fn get_hash(&self) -> WireResult<CryptoHash> {
        Ok(CryptoHash::hash(&self.signable_bytes()?))
    }

    /// Sign with `key`, which must match `public_key`
    pub fn sign(self, key: &KeyPair) -> Result<SignedDelegateAction, KeyError> {
        if key.public_key() != &self.public_key {
            return Err(KeyError::Signing(format!(
                "key {} does not match delegate public key {}",
                key.public_key(),
                self.public_key
            )));
        }
        let hash = self
            .get_hash()
            .map_err(|e| KeyError::Signing(e.to_string()))?;
        let signature = key.sign(hash.as_bytes())?;
        Ok(SignedDelegateAction {
            delegate_action: self,
            signature,
        })
    }
}

/// Delegate action plus the sender's signature over its prefixed hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SignedDelegateAction {
    pub delegate_action: DelegateAction,
    pub signature: Signature,
}

impl SignedDelegateAction {
    /// Check the signature against the embedded public key
    pub fn verify(&self) -> bool {
        match self.delegate_action.get_hash() {
            Ok(hash) => self
                .delegate_action
                .public_key
                .verify(hash.as_bytes(), &self.signature),
            Err(_) => false,
        }
    }

    pub fn sender_id(&self) -> &AccountId {
        &self.delegate_action.sender_id
    }

    pub fn receiver_id(&self) -> &AccountId {
        &self.delegate_action.receiver_id
    }

    /// Base64 of the wire bytes, the form a relayer accepts
    pub fn to_base64(&self) -> WireResult<String> {
        Ok(BASE64.encode(encode(self)?))
    }

    pub fn from_base64(encoded: &str) -> WireResult<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| WireError::malformed("SignedDelegateAction", e.to_string()))?;
        decode(&bytes)
    }

    /// Wrap into an action a relayer puts in its own transaction
    pub fn into_action(self) -> Action {
        Action::SignedDelegate(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyType;
    use crate::types::NearToken;

    fn delegate(key: &KeyPair) -> DelegateAction {
        DelegateAction {
            sender_id: "alice.near".parse().unwrap(),
            receiver_id: "token.near".parse().unwrap(),
            actions: vec![
                Action::function_call("ft_transfer", b"{}".to_vec(), crate::types::Gas::DEFAULT_CALL, NearToken::from_yocto(1))
                    .try_into()
                    .unwrap(),
            ],
            nonce: 42,
            max_block_height: 1_200,
            public_key: key.public_key().clone(),
        }
    }

    #[test]
    fn test_prefix_precedes_payload() {
        let key = KeyPair::from_ed25519_seed(&[1u8; 32]);
        let action = delegate(&key);
        let bytes = action.signable_bytes().unwrap();
        assert_eq!(&bytes[..4], &DELEGATE_ACTION_PREFIX.to_le_bytes());
        assert_eq!(&bytes[4..], encode(&action).unwrap().as_slice());
        assert_eq!(action.get_hash().unwrap(), CryptoHash::hash(&bytes));
    }

    #[test]
    fn test_sign_and_verify() {
        for key_type in [KeyType::Ed25519, KeyType::Secp256k1] {
            let key = KeyPair::generate(key_type);
            let signed = delegate(&key).sign(&key).unwrap();
            assert!(signed.verify());

            let mut tampered = signed.clone();
            tampered.delegate_action.nonce += 1;
            assert!(!tampered.verify());
        }
    }

    #[test]
    fn test_sign_with_wrong_key_rejected() {
        let key = KeyPair::from_ed25519_seed(&[1u8; 32]);
        let other = KeyPair::from_ed25519_seed(&[2u8; 32]);
        assert!(delegate(&key).sign(&other).is_err());
    }

    #[test]
    fn test_nested_delegate_rejected() {
        let key = KeyPair::from_ed25519_seed(&[1u8; 32]);
        let signed = delegate(&key).sign(&key).unwrap();
        assert!(NonDelegateAction::try_from(signed.clone().into_action()).is_err());

        // Hand-build a delegate whose action list carries a nested delegate
        let mut bytes = encode(&signed.delegate_action.sender_id).unwrap();
        bytes.extend(encode(&signed.delegate_action.receiver_id).unwrap());
        bytes.extend(1u32.to_le_bytes());
        bytes.extend(encode(&signed.clone().into_action()).unwrap());
        bytes.extend(0u64.to_le_bytes());
        bytes.extend(0u64.to_le_bytes());
        bytes.extend(encode(key.public_key()).unwrap());
        assert!(decode::<DelegateAction>(&bytes).is_err());
    }

    #[test]
    fn test_base64_round_trip() {
        let key = KeyPair::from_ed25519_seed(&[5u8; 32]);
        let signed = delegate(&key).sign(&key).unwrap();
        let encoded = signed.to_base64().unwrap();
        assert_eq!(SignedDelegateAction::from_base64(&encoded).unwrap(), signed);
        assert!(SignedDelegateAction::from_base64("not base64!").is_err());
    }
}
