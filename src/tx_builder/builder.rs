//! Fluent transaction builder
//!
//! [`TransactionBuilder`] collects the actions of one transaction. Parse
//! and serialization failures do not interrupt the chain of calls: the first
//! one is recorded and reported by [`TransactionBuilder::build`], before any
//! key, nonce or block hash is resolved.

use serde::Serialize;

use super::actions::{
    AccessKey, Action, AddKeyAction, CreateAccountAction, DeleteAccountAction,
    DeployContractAction, DeployGlobalContractAction, FunctionCallAction,
    GlobalContractDeployMode, GlobalContractIdentifier, StakeAction, TransferAction,
    UseGlobalContractAction,
};
use super::delegate::{NonDelegateAction, SignedDelegateAction};
use super::errors::{TransactionBuilderError, TxResult};
use super::output::TxBuildOutput;
use crate::keys::{KeyPair, PublicKey};
use crate::types::{AccountId, CryptoHash, Gas, IntoGas, IntoNearToken, NearToken, WaitUntil};

/// Validated actions and routing of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPlan {
    pub signer_id: AccountId,
    pub receiver_id: AccountId,
    pub actions: Vec<Action>,
    pub wait_until: WaitUntil,
}

/// Builder for a transaction from `signer_id` to `receiver_id`.
///
/// Every action targets the same receiver.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    signer_id: AccountId,
    receiver_id: AccountId,
    actions: Vec<Action>,
    wait_until: WaitUntil,
    error: Option<TransactionBuilderError>,
}

impl TransactionBuilder {
    pub fn new(signer_id: AccountId, receiver_id: AccountId) -> Self {
        Self {
            signer_id,
            receiver_id,
            actions: Vec::new(),
            wait_until: WaitUntil::default(),
            error: None,
        }
    }

    pub fn signer_id(&self) -> &AccountId {
        &self.signer_id
    }

    pub fn receiver_id(&self) -> &AccountId {
        &self.receiver_id
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until = wait_until;
        self
    }

    /// Keep the first error only
    fn record(&mut self, err: impl Into<TransactionBuilderError>) {
        if self.error.is_none() {
            self.error = Some(err.into());
        }
    }

    pub fn add_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn create_account(self) -> Self {
        self.add_action(Action::CreateAccount(CreateAccountAction {}))
    }

    pub fn deploy_contract(self, code: Vec<u8>) -> Self {
        self.add_action(Action::DeployContract(DeployContractAction { code }))
    }

    /// Start a function call; finish it with [`CallBuilder::finish`]
    pub fn function_call(self, method_name: impl Into<String>) -> CallBuilder {
        CallBuilder {
            parent: self,
            method_name: method_name.into(),
            args: Vec::new(),
            gas: Gas::DEFAULT_CALL,
            deposit: NearToken::default(),
        }
    }

    pub fn transfer(mut self, amount: impl IntoNearToken) -> Self {
        match amount.into_near_token() {
            Ok(deposit) => self.add_action(Action::Transfer(TransferAction { deposit })),
            Err(err) => {
                self.record(err);
                self
            }
        }
    }

    pub fn stake(mut self, amount: impl IntoNearToken, public_key: PublicKey) -> Self {
        match amount.into_near_token() {
            Ok(stake) => self.add_action(Action::Stake(Box::new(StakeAction { stake, public_key }))),
            Err(err) => {
                self.record(err);
                self
            }
        }
    }

    pub fn add_full_access_key(self, public_key: PublicKey) -> Self {
        self.add_action(Action::add_key(public_key, AccessKey::full_access()))
    }

    /// Key limited to calling `method_names` on `receiver_id` (any method
    /// when empty), spending at most `allowance` on fees
    pub fn add_function_call_key(
        self,
        public_key: PublicKey,
        receiver_id: AccountId,
        method_names: Vec<String>,
        allowance: Option<NearToken>,
    ) -> Self {
        self.add_action(Action::AddKey(Box::new(AddKeyAction {
            public_key,
            access_key: AccessKey::function_call(receiver_id, method_names, allowance),
        })))
    }

    pub fn delete_key(self, public_key: PublicKey) -> Self {
        self.add_action(Action::delete_key(public_key))
    }

    pub fn delete_account(self, beneficiary_id: AccountId) -> Self {
        self.add_action(Action::DeleteAccount(DeleteAccountAction { beneficiary_id }))
    }

    /// Relay a delegate action signed by another account
    pub fn signed_delegate(self, signed: SignedDelegateAction) -> Self {
        self.add_action(signed.into_action())
    }

    pub fn deploy_global_contract(self, code: Vec<u8>, deploy_mode: GlobalContractDeployMode) -> Self {
        self.add_action(Action::DeployGlobalContract(DeployGlobalContractAction {
            code,
            deploy_mode,
        }))
    }

    pub fn use_global_contract(self, contract_identifier: GlobalContractIdentifier) -> Self {
        self.add_action(Action::UseGlobalContract(Box::new(UseGlobalContractAction {
            contract_identifier,
        })))
    }

    /// Validate and hand out the plan, or the first recorded error
    pub fn build(self) -> TxResult<TransactionPlan> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.actions.is_empty() {
            return Err(TransactionBuilderError::EmptyActions);
        }
        Ok(TransactionPlan {
            signer_id: self.signer_id,
            receiver_id: self.receiver_id,
            actions: self.actions,
            wait_until: self.wait_until,
        })
    }

    /// Actions for a delegate action; nested delegates are rejected
    pub fn build_delegate_actions(self) -> TxResult<(AccountId, AccountId, Vec<NonDelegateAction>)> {
        let plan = self.build()?;
        let actions = plan
            .actions
            .into_iter()
            .map(|action| {
                NonDelegateAction::try_from(action).map_err(|_| TransactionBuilderError::NestedDelegate)
            })
            .collect::<TxResult<Vec<_>>>()?;
        Ok((plan.signer_id, plan.receiver_id, actions))
    }

    /// Sign offline with an explicit nonce and block hash
    pub fn sign_with(self, key: &KeyPair, nonce: u64, block_hash: CryptoHash) -> TxResult<TxBuildOutput> {
        let plan = self.build()?;
        let tx = super::transaction::Transaction::new(
            plan.signer_id,
            key.public_key().clone(),
            nonce,
            plan.receiver_id,
            block_hash,
            plan.actions,
        );
        TxBuildOutput::new(tx.sign(key)?)
    }
}

/// Function call under construction
#[derive(Debug, Clone)]
pub struct CallBuilder {
    parent: TransactionBuilder,
    method_name: String,
    args: Vec<u8>,
    gas: Gas,
    deposit: NearToken,
}

impl CallBuilder {
    /// JSON-encode `args`
    pub fn args_json<T: Serialize + ?Sized>(mut self, args: &T) -> Self {
        match serde_json::to_vec(args) {
            Ok(bytes) => self.args = bytes,
            Err(err) => self
                .parent
                .record(TransactionBuilderError::InvalidArgs(err.to_string())),
        }
        self
    }

    pub fn args_raw(mut self, args: Vec<u8>) -> Self {
        self.args = args;
        self
    }

    /// Prepaid gas; defaults to 30 Tgas
    pub fn gas(mut self, gas: impl IntoGas) -> Self {
        match gas.into_gas() {
            Ok(gas) => self.gas = gas,
            Err(err) => self.parent.record(err),
        }
        self
    }

    /// Attached deposit; defaults to zero
    pub fn deposit(mut self, deposit: impl IntoNearToken) -> Self {
        match deposit.into_near_token() {
            Ok(deposit) => self.deposit = deposit,
            Err(err) => self.parent.record(err),
        }
        self
    }

    pub fn finish(self) -> TransactionBuilder {
        let action = Action::FunctionCall(Box::new(FunctionCallAction {
            method_name: self.method_name,
            args: self.args,
            gas: self.gas,
            deposit: self.deposit,
        }));
        self.parent.add_action(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx_builder::actions::ActionTag;
    use crate::tx_builder::delegate::DelegateAction;
    use serde_json::json;

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new("alice.near".parse().unwrap(), "bob.near".parse().unwrap())
    }

    #[test]
    fn test_actions_in_order() {
        let key = KeyPair::from_ed25519_seed(&[1; 32]);
        let plan = builder()
            .create_account()
            .transfer("1.5 NEAR")
            .add_full_access_key(key.public_key().clone())
            .function_call("init")
            .args_json(&json!({"owner": "alice.near"}))
            .gas("50 Tgas")
            .finish()
            .wait_until(WaitUntil::Final)
            .build()
            .unwrap();

        let tags: Vec<ActionTag> = plan.actions.iter().map(Action::tag).collect();
        assert_eq!(
            tags,
            vec![
                ActionTag::CreateAccount,
                ActionTag::Transfer,
                ActionTag::AddKey,
                ActionTag::FunctionCall
            ]
        );
        assert_eq!(plan.wait_until, WaitUntil::Final);

        match &plan.actions[1] {
            Action::Transfer(t) => {
                assert_eq!(t.deposit.as_yoctonear(), 1_500_000_000_000_000_000_000_000)
            }
            other => panic!("unexpected action {other:?}"),
        }
        match &plan.actions[3] {
            Action::FunctionCall(call) => {
                assert_eq!(call.gas, Gas::from_tgas(50).unwrap());
                assert_eq!(call.args, br#"{"owner":"alice.near"}"#.to_vec());
                assert_eq!(call.deposit, NearToken::default());
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_empty_builder_rejected() {
        assert_eq!(builder().build(), Err(TransactionBuilderError::EmptyActions));
    }

    #[test]
    fn test_first_error_is_reported() {
        let err = builder()
            .transfer("1000000000000000000000000000000000000000 NEAR")
            .transfer("not a number")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionBuilderError::AmountOverflow { width: "u128", .. }
        ));
    }

    #[test]
    fn test_gas_overflow_is_construction_error() {
        let err = builder()
            .function_call("f")
            .gas(u128::from(u64::MAX) + 1)
            .finish()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TransactionBuilderError::AmountOverflow { width: "u64", .. }
        ));
    }

    #[test]
    fn test_nested_delegate_rejected() {
        let key = KeyPair::from_ed25519_seed(&[3; 32]);
        let inner = DelegateAction {
            sender_id: "carol.near".parse().unwrap(),
            receiver_id: "bob.near".parse().unwrap(),
            actions: vec![NonDelegateAction::try_from(Action::transfer(NearToken::from_yocto(1))).unwrap()],
            nonce: 1,
            max_block_height: 100,
            public_key: key.public_key().clone(),
        }
        .sign(&key)
        .unwrap();

        let err = builder()
            .signed_delegate(inner)
            .build_delegate_actions()
            .unwrap_err();
        assert_eq!(err, TransactionBuilderError::NestedDelegate);
    }

    #[test]
    fn test_sign_with_produces_verifiable_output() {
        let key = KeyPair::from_ed25519_seed(&[9; 32]);
        let output = builder()
            .transfer(1u128)
            .sign_with(&key, 5, CryptoHash::hash(b"recent"))
            .unwrap();

        assert!(output.signed.verify());
        assert_eq!(output.nonce(), 5);
        let tx_len = output.signed.transaction.to_bytes().unwrap().len();
        assert_eq!(output.len(), tx_len + 1 + 64);
    }
}
