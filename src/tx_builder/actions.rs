//! Action model
//!
//! `Action` is the closed set of operations a transaction can carry. The
//! discriminant of each variant is fixed by the wire contract in
//! [`ActionTag`]; the Rust declaration order is irrelevant to the encoding.

use borsh::io::{Read, Write};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use super::delegate::SignedDelegateAction;
use crate::codec::{read_tag, unknown_tag};
use crate::keys::PublicKey;
use crate::types::{base64_bytes, AccountId, CryptoHash, Gas, NearToken};

/// Wire discriminants for [`Action`]. Reordering is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActionTag {
    CreateAccount = 0,
    DeployContract = 1,
    FunctionCall = 2,
    Transfer = 3,
    Stake = 4,
    AddKey = 5,
    DeleteKey = 6,
    DeleteAccount = 7,
    SignedDelegate = 8,
    DeployGlobalContract = 9,
    UseGlobalContract = 10,
}

impl ActionTag {
    pub const ALL: [ActionTag; 11] = [
        ActionTag::CreateAccount,
        ActionTag::DeployContract,
        ActionTag::FunctionCall,
        ActionTag::Transfer,
        ActionTag::Stake,
        ActionTag::AddKey,
        ActionTag::DeleteKey,
        ActionTag::DeleteAccount,
        ActionTag::SignedDelegate,
        ActionTag::DeployGlobalContract,
        ActionTag::UseGlobalContract,
    ];

    pub fn from_byte(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CreateAccountAction {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DeployContractAction {
    #[serde(with = "base64_bytes")]
    pub code: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FunctionCallAction {
    pub method_name: String,
    #[serde(with = "base64_bytes")]
    pub args: Vec<u8>,
    pub gas: Gas,
    pub deposit: NearToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TransferAction {
    pub deposit: NearToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeAction {
    pub stake: NearToken,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AddKeyAction {
    pub public_key: PublicKey,
    pub access_key: AccessKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DeleteKeyAction {
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DeleteAccountAction {
    pub beneficiary_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DeployGlobalContractAction {
    #[serde(with = "base64_bytes")]
    pub code: Vec<u8>,
    pub deploy_mode: GlobalContractDeployMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UseGlobalContractAction {
    pub contract_identifier: GlobalContractIdentifier,
}

/// Access key attached by `AddKey`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccessKey {
    /// Starting nonce; the ledger overrides it, clients send 0
    pub nonce: u64,
    pub permission: AccessKeyPermission,
}

impl AccessKey {
    pub fn full_access() -> Self {
        Self {
            nonce: 0,
            permission: AccessKeyPermission::FullAccess,
        }
    }

    pub fn function_call(
        receiver_id: AccountId,
        method_names: Vec<String>,
        allowance: Option<NearToken>,
    ) -> Self {
        Self {
            nonce: 0,
            permission: AccessKeyPermission::FunctionCall(FunctionCallPermission {
                allowance,
                receiver_id,
                method_names,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FunctionCallPermission {
    pub allowance: Option<NearToken>,
    pub receiver_id: AccountId,
    pub method_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKeyPermission {
    FunctionCall(FunctionCallPermission),
    FullAccess,
}

impl AccessKeyPermission {
    const FUNCTION_CALL_TAG: u8 = 0;
    const FULL_ACCESS_TAG: u8 = 1;

    pub fn is_full_access(&self) -> bool {
        matches!(self, AccessKeyPermission::FullAccess)
    }
}

impl BorshSerialize for AccessKeyPermission {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        match self {
            AccessKeyPermission::FunctionCall(permission) => {
                BorshSerialize::serialize(&Self::FUNCTION_CALL_TAG, writer)?;
                BorshSerialize::serialize(permission, writer)
            }
            AccessKeyPermission::FullAccess => BorshSerialize::serialize(&Self::FULL_ACCESS_TAG, writer),
        }
    }
}

impl BorshDeserialize for AccessKeyPermission {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        match read_tag(reader)? {
            Self::FUNCTION_CALL_TAG => Ok(AccessKeyPermission::FunctionCall(
                FunctionCallPermission::deserialize_reader(reader)?,
            )),
            Self::FULL_ACCESS_TAG => Ok(AccessKeyPermission::FullAccess),
            tag => Err(unknown_tag("AccessKeyPermission", tag)),
        }
    }
}

/// How a global contract is addressed once published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalContractDeployMode {
    /// Immutable, addressed by code hash
    CodeHash,
    /// Updatable, addressed by the publishing account
    AccountId,
}

impl BorshSerialize for GlobalContractDeployMode {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        let tag: u8 = match self {
            GlobalContractDeployMode::CodeHash => 0,
            GlobalContractDeployMode::AccountId => 1,
        };
        BorshSerialize::serialize(&tag, writer)
    }
}

impl BorshDeserialize for GlobalContractDeployMode {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        match read_tag(reader)? {
            0 => Ok(GlobalContractDeployMode::CodeHash),
            1 => Ok(GlobalContractDeployMode::AccountId),
            tag => Err(unknown_tag("GlobalContractDeployMode", tag)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalContractIdentifier {
    CodeHash(CryptoHash),
    AccountId(AccountId),
}

impl BorshSerialize for GlobalContractIdentifier {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        match self {
            GlobalContractIdentifier::CodeHash(hash) => {
                BorshSerialize::serialize(&0u8, writer)?;
                BorshSerialize::serialize(hash, writer)
            }
            GlobalContractIdentifier::AccountId(account) => {
                BorshSerialize::serialize(&1u8, writer)?;
                BorshSerialize::serialize(account, writer)
            }
        }
    }
}

impl BorshDeserialize for GlobalContractIdentifier {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        match read_tag(reader)? {
            0 => Ok(GlobalContractIdentifier::CodeHash(CryptoHash::deserialize_reader(reader)?)),
            1 => Ok(GlobalContractIdentifier::AccountId(AccountId::deserialize_reader(reader)?)),
            tag => Err(unknown_tag("GlobalContractIdentifier", tag)),
        }
    }
}

/// One operation inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    CreateAccount(CreateAccountAction),
    DeployContract(DeployContractAction),
    FunctionCall(Box<FunctionCallAction>),
    Transfer(TransferAction),
    Stake(Box<StakeAction>),
    AddKey(Box<AddKeyAction>),
    DeleteKey(Box<DeleteKeyAction>),
    DeleteAccount(DeleteAccountAction),
    #[serde(rename = "Delegate")]
    SignedDelegate(Box<SignedDelegateAction>),
    DeployGlobalContract(DeployGlobalContractAction),
    UseGlobalContract(Box<UseGlobalContractAction>),
}

impl Action {
    pub fn tag(&self) -> ActionTag {
        match self {
            Action::CreateAccount(_) => ActionTag::CreateAccount,
            Action::DeployContract(_) => ActionTag::DeployContract,
            Action::FunctionCall(_) => ActionTag::FunctionCall,
            Action::Transfer(_) => ActionTag::Transfer,
            Action::Stake(_) => ActionTag::Stake,
            Action::AddKey(_) => ActionTag::AddKey,
            Action::DeleteKey(_) => ActionTag::DeleteKey,
            Action::DeleteAccount(_) => ActionTag::DeleteAccount,
            Action::SignedDelegate(_) => ActionTag::SignedDelegate,
            Action::DeployGlobalContract(_) => ActionTag::DeployGlobalContract,
            Action::UseGlobalContract(_) => ActionTag::UseGlobalContract,
        }
    }

    pub fn transfer(deposit: NearToken) -> Self {
        Action::Transfer(TransferAction { deposit })
    }

    pub fn function_call(method_name: impl Into<String>, args: Vec<u8>, gas: Gas, deposit: NearToken) -> Self {
        Action::FunctionCall(Box::new(FunctionCallAction {
            method_name: method_name.into(),
            args,
            gas,
            deposit,
        }))
    }

    pub fn add_key(public_key: PublicKey, access_key: AccessKey) -> Self {
        Action::AddKey(Box::new(AddKeyAction {
            public_key,
            access_key,
        }))
    }

    pub fn delete_key(public_key: PublicKey) -> Self {
        Action::DeleteKey(Box::new(DeleteKeyAction { public_key }))
    }

    /// Method name if this is a function call
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Action::FunctionCall(call) => Some(&call.method_name),
            _ => None,
        }
    }
}

impl BorshSerialize for Action {
    fn serialize<W: Write>(&self, writer: &mut W) -> borsh::io::Result<()> {
        BorshSerialize::serialize(&(self.tag() as u8), writer)?;
        match self {
            Action::CreateAccount(a) => BorshSerialize::serialize(a, writer),
            Action::DeployContract(a) => BorshSerialize::serialize(a, writer),
            Action::FunctionCall(a) => BorshSerialize::serialize(a, writer),
            Action::Transfer(a) => BorshSerialize::serialize(a, writer),
            Action::Stake(a) => BorshSerialize::serialize(a, writer),
            Action::AddKey(a) => BorshSerialize::serialize(a, writer),
            Action::DeleteKey(a) => BorshSerialize::serialize(a, writer),
            Action::DeleteAccount(a) => BorshSerialize::serialize(a, writer),
            Action::SignedDelegate(a) => BorshSerialize::serialize(a, writer),
            Action::DeployGlobalContract(a) => BorshSerialize::serialize(a, writer),
            Action::UseGlobalContract(a) => BorshSerialize::serialize(a, writer),
        }
    }
}

impl BorshDeserialize for Action {
    fn deserialize_reader<R: Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let tag = read_tag(reader)?;
        let Some(tag) = ActionTag::from_byte(tag) else {
            return Err(unknown_tag("Action", tag));
        };
        Ok(match tag {
            ActionTag::CreateAccount => Action::CreateAccount(BorshDeserialize::deserialize_reader(reader)?),
            ActionTag::DeployContract => Action::DeployContract(BorshDeserialize::deserialize_reader(reader)?),
            ActionTag::FunctionCall => Action::FunctionCall(Box::new(BorshDeserialize::deserialize_reader(reader)?)),
            ActionTag::Transfer => Action::Transfer(BorshDeserialize::deserialize_reader(reader)?),
            ActionTag::Stake => Action::Stake(Box::new(BorshDeserialize::deserialize_reader(reader)?)),
            ActionTag::AddKey => Action::AddKey(Box::new(BorshDeserialize::deserialize_reader(reader)?)),
            ActionTag::DeleteKey => Action::DeleteKey(Box::new(BorshDeserialize::deserialize_reader(reader)?)),
            ActionTag::DeleteAccount => Action::DeleteAccount(BorshDeserialize::deserialize_reader(reader)?),
            ActionTag::SignedDelegate => {
                Action::SignedDelegate(Box::new(BorshDeserialize::deserialize_reader(reader)?))
            }
            ActionTag::DeployGlobalContract => {
                Action::DeployGlobalContract(BorshDeserialize::deserialize_reader(reader)?)
            }
            ActionTag::UseGlobalContract => {
                Action::UseGlobalContract(Box::new(BorshDeserialize::deserialize_reader(reader)?))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::keys::{KeyPair, KeyType};
    use crate::tx_builder::delegate::{DelegateAction, NonDelegateAction};

    fn account(s: &str) -> AccountId {
        s.parse().unwrap()
    }

    fn sample_actions() -> Vec<Action> {
        let key = KeyPair::from_ed25519_seed(&[3u8; 32]);
        let secp = KeyPair::generate(KeyType::Secp256k1);
        let delegate = DelegateAction {
            sender_id: account("alice.near"),
            receiver_id: account("bob.near"),
            actions: vec![NonDelegateAction::try_from(Action::transfer(NearToken::from_yocto(1))).unwrap()],
            nonce: 5,
            max_block_height: 1_000,
            public_key: key.public_key().clone(),
        };
        let signed = delegate.sign(&key).unwrap();

        vec![
            Action::CreateAccount(CreateAccountAction {}),
            Action::DeployContract(DeployContractAction { code: vec![0, 97, 115, 109] }),
            Action::function_call("ft_transfer", b"{}".to_vec(), Gas::DEFAULT_CALL, NearToken::from_yocto(1)),
            Action::transfer(NearToken::from_near(2).unwrap()),
            Action::Stake(Box::new(StakeAction {
                stake: NearToken::from_near(100).unwrap(),
                public_key: secp.public_key().clone(),
            })),
            Action::add_key(key.public_key().clone(), AccessKey::full_access()),
            Action::add_key(
                key.public_key().clone(),
                AccessKey::function_call(account("app.near"), vec!["vote".into()], Some(NearToken::from_near(1).unwrap())),
            ),
            Action::delete_key(key.public_key().clone()),
            Action::DeleteAccount(DeleteAccountAction { beneficiary_id: account("carol.near") }),
            Action::SignedDelegate(Box::new(signed)),
            Action::DeployGlobalContract(DeployGlobalContractAction {
                code: vec![1, 2, 3],
                deploy_mode: GlobalContractDeployMode::AccountId,
            }),
            Action::UseGlobalContract(Box::new(UseGlobalContractAction {
                contract_identifier: GlobalContractIdentifier::CodeHash(CryptoHash::hash(b"wasm")),
            })),
        ]
    }

    #[test]
    fn test_every_action_round_trips() {
        for action in sample_actions() {
            let bytes = encode(&action).unwrap();
            assert_eq!(bytes[0], action.tag() as u8);
            assert_eq!(decode::<Action>(&bytes).unwrap(), action);
        }
    }

    #[test]
    fn test_discriminants_are_stable() {
        let transfer = encode(&Action::transfer(NearToken::from_yocto(1))).unwrap();
        assert_eq!(transfer[0], 3);
        assert_eq!(transfer.len(), 1 + 16);

        let key = KeyPair::from_ed25519_seed(&[9u8; 32]);
        let add_key = encode(&Action::add_key(key.public_key().clone(), AccessKey::full_access())).unwrap();
        assert_eq!(add_key[0], 5);
        // tag + (key tag + 32) + nonce u64 + permission tag
        assert_eq!(add_key.len(), 1 + 33 + 8 + 1);
        assert_eq!(*add_key.last().unwrap(), 1);
    }

    #[test]
    fn test_unknown_discriminant_is_malformed() {
        let err = decode::<Action>(&[11]).unwrap_err();
        assert!(matches!(err, crate::codec::WireError::MalformedWireData { .. }));
        assert!(decode::<Action>(&[3, 1, 0]).is_err());
    }

    #[test]
    fn test_action_json_shape() {
        let json = serde_json::to_value(Action::transfer(NearToken::from_yocto(7))).unwrap();
        assert_eq!(json, serde_json::json!({"Transfer": {"deposit": "7"}}));

        let call = Action::function_call("go", b"{}".to_vec(), Gas::from_gas(10), NearToken::default());
        let json = serde_json::to_value(call).unwrap();
        assert_eq!(json["FunctionCall"]["args"], "e30=");
        assert_eq!(json["FunctionCall"]["gas"], 10);

        let full = serde_json::to_value(AccessKeyPermission::FullAccess).unwrap();
        assert_eq!(full, serde_json::json!("FullAccess"));
    }
}
