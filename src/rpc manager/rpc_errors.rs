//! Typed classification of JSON-RPC errors and execution failures

use serde_json::Value;
use thiserror::Error;

use super::rpc_types::FinalExecutionOutcome;
use crate::tx_builder::actions::Action;
use crate::types::AccountId;

/// Errors surfaced by the RPC layer and by submission outcomes
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    #[error("Account {account_id} does not exist")]
    AccountDoesNotExist { account_id: String },

    #[error("Access key {public_key} does not exist on account {account_id}")]
    AccessKeyDoesNotExist {
        account_id: String,
        public_key: String,
    },

    /// Contract code panicked or failed; `panic` is the node's text verbatim
    #[error("Function call {contract_id}.{} failed: {panic}", .method_name.as_deref().unwrap_or("?"))]
    FunctionCallError {
        contract_id: String,
        method_name: Option<String>,
        panic: String,
        logs: Vec<String>,
    },

    #[error("Invalid transaction: {message}")]
    InvalidTransaction {
        message: String,
        details: Option<Value>,
        shard_congested: bool,
        shard_stuck: bool,
    },

    /// Transaction nonce was not above the access key nonce
    #[error("Invalid nonce: tx nonce {tx_nonce}, access key nonce {ak_nonce}")]
    InvalidNonce { tx_nonce: u64, ak_nonce: u64 },

    /// Transport failure or non-2xx HTTP status
    #[error("Network error{}: {message}", .status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    Network {
        status_code: Option<u16>,
        message: String,
        retryable: bool,
    },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Node is not synced: {0}")]
    NodeNotSynced(String),

    #[error("Shard unavailable: {0}")]
    ShardUnavailable(String),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Unknown chunk: {0}")]
    UnknownChunk(String),

    #[error("Unknown epoch: {0}")]
    UnknownEpoch(String),

    #[error("Unknown receipt: {0}")]
    UnknownReceipt(String),

    /// Response did not have the expected shape
    #[error("Failed to parse RPC response: {0}")]
    Parse(String),

    /// Any other JSON-RPC error object
    #[error("RPC error {code} ({name}): {message}")]
    Rpc {
        code: i64,
        name: String,
        message: String,
    },
}

/// Result type for RPC operations
pub type RpcResult<T> = Result<T, RpcError>;

impl RpcError {
    /// Whether the same request may succeed if retried
    pub fn is_retryable(&self) -> bool {
        match self {
            // Retryable errors
            RpcError::InvalidNonce { .. } => true,
            RpcError::Timeout(_) => true,
            RpcError::InternalServerError(_) => true,
            RpcError::NodeNotSynced(_) => true,
            RpcError::ShardUnavailable(_) => true,
            RpcError::Network { retryable, .. } => *retryable,
            RpcError::InvalidTransaction {
                shard_congested,
                shard_stuck,
                ..
            } => *shard_congested || *shard_stuck,

            // Non-retryable errors
            RpcError::AccountDoesNotExist { .. } => false,
            RpcError::AccessKeyDoesNotExist { .. } => false,
            RpcError::FunctionCallError { .. } => false,
            RpcError::UnknownBlock(_) => false,
            RpcError::UnknownChunk(_) => false,
            RpcError::UnknownEpoch(_) => false,
            RpcError::UnknownReceipt(_) => false,
            RpcError::Parse(_) => false,
            RpcError::Rpc { .. } => false,
        }
    }

    /// Short label for metrics
    pub fn category(&self) -> &'static str {
        match self {
            RpcError::AccountDoesNotExist { .. } => "account_missing",
            RpcError::AccessKeyDoesNotExist { .. } => "access_key_missing",
            RpcError::FunctionCallError { .. } => "function_call",
            RpcError::InvalidTransaction { .. } => "invalid_transaction",
            RpcError::InvalidNonce { .. } => "invalid_nonce",
            RpcError::Network { .. } => "network",
            RpcError::Timeout(_) => "timeout",
            RpcError::InternalServerError(_) => "internal",
            RpcError::NodeNotSynced(_) => "not_synced",
            RpcError::ShardUnavailable(_) => "shard_unavailable",
            RpcError::UnknownBlock(_)
            | RpcError::UnknownChunk(_)
            | RpcError::UnknownEpoch(_)
            | RpcError::UnknownReceipt(_) => "unknown_reference",
            RpcError::Parse(_) => "parse",
            RpcError::Rpc { .. } => "rpc",
        }
    }

    /// Error for an HTTP response with a non-success status.
    ///
    /// 4xx means the request itself is wrong, except 408 and 429 which ask
    /// the client to come back later.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let client_error = (400..500).contains(&status_code);
        let retryable = !client_error || status_code == 408 || status_code == 429;
        RpcError::Network {
            status_code: Some(status_code),
            message: message.into(),
            retryable,
        }
    }

    /// Error for a request that never produced an HTTP response
    pub fn connection(message: impl Into<String>) -> Self {
        RpcError::Network {
            status_code: None,
            message: message.into(),
            retryable: true,
        }
    }

    /// Fill in the account/key an `AccessKeyDoesNotExist` refers to.
    ///
    /// The node's error payload carries the key but not always the account.
    pub fn for_access_key(self, account_id: &AccountId, public_key: &str) -> Self {
        match self {
            RpcError::AccessKeyDoesNotExist { .. } => RpcError::AccessKeyDoesNotExist {
                account_id: account_id.to_string(),
                public_key: public_key.to_string(),
            },
            RpcError::AccountDoesNotExist { account_id: found } if found.is_empty() => {
                RpcError::AccountDoesNotExist {
                    account_id: account_id.to_string(),
                }
            }
            other => other,
        }
    }

    /// Classify a JSON-RPC `error` object.
    ///
    /// The node reports the precise reason in `cause.name`; older nodes only
    /// set the top-level `name`.
    pub fn from_rpc_error(error: &Value) -> Self {
        let cause = error.get("cause");
        let cause_name = cause
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .or_else(|| error.get("name").and_then(Value::as_str))
            .unwrap_or("UNKNOWN");
        let info = cause.and_then(|c| c.get("info")).cloned().unwrap_or(Value::Null);
        let message = error
            .get("data")
            .map(value_text)
            .or_else(|| error.get("message").map(value_text))
            .unwrap_or_else(|| error.to_string());

        match cause_name {
            "UNKNOWN_ACCOUNT" => RpcError::AccountDoesNotExist {
                account_id: str_field(&info, "requested_account_id").unwrap_or_default(),
            },
            "UNKNOWN_ACCESS_KEY" => RpcError::AccessKeyDoesNotExist {
                account_id: str_field(&info, "requested_account_id").unwrap_or_default(),
                public_key: str_field(&info, "public_key").unwrap_or_default(),
            },
            "UNKNOWN_BLOCK" => RpcError::UnknownBlock(message),
            "UNKNOWN_CHUNK" => RpcError::UnknownChunk(message),
            "UNKNOWN_EPOCH" => RpcError::UnknownEpoch(message),
            "UNKNOWN_RECEIPT" => RpcError::UnknownReceipt(message),
            "NO_SYNCED_BLOCKS" | "NOT_SYNCED_YET" => RpcError::NodeNotSynced(message),
            "TIMEOUT_ERROR" => RpcError::Timeout(message),
            "INTERNAL_ERROR" => RpcError::InternalServerError(message),
            "UNAVAILABLE_SHARD" => RpcError::ShardUnavailable(message),
            "INVALID_TRANSACTION" => invalid_transaction(error, message),
            _ => RpcError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                name: cause_name.to_string(),
                message,
            },
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Depth-first search for the first object field named `key`
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// Build an invalid-transaction error from anywhere in `source`.
///
/// Nonce conflicts become `InvalidNonce`; congestion markers set the flags.
fn invalid_transaction(source: &Value, message: String) -> RpcError {
    if let Some(nonce) = find_key(source, "InvalidNonce") {
        return RpcError::InvalidNonce {
            tx_nonce: nonce.get("tx_nonce").and_then(Value::as_u64).unwrap_or(0),
            ak_nonce: nonce.get("ak_nonce").and_then(Value::as_u64).unwrap_or(0),
        };
    }
    RpcError::InvalidTransaction {
        message,
        details: Some(source.clone()),
        shard_congested: find_key(source, "ShardCongested").is_some(),
        shard_stuck: find_key(source, "ShardStuck").is_some(),
    }
}

/// Typed error for a failed outcome, attributed to the receipt that failed.
///
/// The transaction's `actions` name the method only when the failing receipt
/// is the one the transaction produced; a panic further down a cross-contract
/// chain reports its own executor and no method. Returns `None` unless the
/// outcome is a failure.
pub fn classify_outcome_failure(
    outcome: &FinalExecutionOutcome,
    actions: &[Action],
    receiver_id: &AccountId,
) -> Option<RpcError> {
    let failure = outcome.failure()?;
    let Some(receipt) = outcome.failing_receipt() else {
        return Some(classify_failure(failure, actions, receiver_id, Vec::new()));
    };

    let executor_id = &receipt.outcome.executor_id;
    let direct = match outcome.first_receipt_id() {
        Some(first) => *first == receipt.id,
        None => executor_id == receiver_id,
    };
    let actions: &[Action] = if direct { actions } else { &[] };
    Some(classify_failure(
        failure,
        actions,
        executor_id,
        receipt.outcome.logs.clone(),
    ))
}

/// Classify the `Failure` payload of an execution outcome.
///
/// `actions` are those of the failing receipt: the failing `index` is mapped
/// back to the function call that produced it so multi-action transactions
/// report the right method. `contract_id` is the failing receipt's executor
/// and `logs` its logs.
pub fn classify_failure(
    failure: &Value,
    actions: &[Action],
    contract_id: &AccountId,
    logs: Vec<String>,
) -> RpcError {
    if let Some(action_error) = failure.get("ActionError") {
        let index = action_error
            .get("index")
            .and_then(Value::as_u64)
            .map(|i| i as usize);
        let kind = action_error.get("kind").unwrap_or(&Value::Null);

        if let Some(call_error) = kind.get("FunctionCallError") {
            let method_name = index
                .and_then(|i| actions.get(i))
                .or_else(|| actions.iter().find(|a| a.method_name().is_some()))
                .and_then(Action::method_name)
                .map(str::to_string);
            return RpcError::FunctionCallError {
                contract_id: contract_id.to_string(),
                method_name,
                panic: panic_text(call_error),
                logs,
            };
        }

        if let Some(missing) = kind.get("AccountDoesNotExist") {
            return RpcError::AccountDoesNotExist {
                account_id: str_field(missing, "account_id")
                    .unwrap_or_else(|| contract_id.to_string()),
            };
        }

        let kind_name = kind
            .as_object()
            .and_then(|m| m.keys().next().cloned())
            .or_else(|| kind.as_str().map(str::to_string))
            .unwrap_or_else(|| "ActionError".to_string());
        return RpcError::InvalidTransaction {
            message: format!("action {} failed: {}", index.map_or("?".to_string(), |i| i.to_string()), kind_name),
            details: Some(failure.clone()),
            shard_congested: false,
            shard_stuck: false,
        };
    }

    if let Some(tx_error) = failure.get("InvalidTxError") {
        return invalid_transaction(tx_error, tx_error.to_string());
    }

    RpcError::InvalidTransaction {
        message: failure.to_string(),
        details: Some(failure.clone()),
        shard_congested: false,
        shard_stuck: false,
    }
}

/// Panic text of a `FunctionCallError`, verbatim where the node provides one
fn panic_text(call_error: &Value) -> String {
    if let Some(text) = call_error.get("ExecutionError").and_then(Value::as_str) {
        return text.to_string();
    }
    if let Some(msg) = call_error
        .get("HostError")
        .and_then(|h| h.get("GuestPanic"))
        .and_then(|g| g.get("panic_msg"))
        .and_then(Value::as_str)
    {
        return msg.to_string();
    }
    value_text(call_error)
}

/// Backoff policy for idempotent RPC reads
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Base delay in milliseconds
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,

    /// Jitter factor (0.0 - 1.0)
    pub jitter_factor: f64,

    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter_factor: 0.1,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt `attempt` (0-based), or
    /// `None` once attempts are exhausted
    pub fn calculate_delay(&self, attempt: u32) -> Option<std::time::Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let delay_ms = self.base_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64);

        // Jitter against synchronized retries
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * self.jitter_factor;
        let jittered_delay = (delay_ms * (1.0 + jitter)).max(0.0) as u64;

        Some(std::time::Duration::from_millis(jittered_delay))
    }

    /// More attempts, shorter delays
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 50,
            max_delay_ms: 2000,
            jitter_factor: 0.15,
            multiplier: 1.5,
        }
    }

    /// Fewer attempts, longer delays
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 200,
            max_delay_ms: 10000,
            jitter_factor: 0.05,
            multiplier: 3.0,
        }
    }

    /// Single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CryptoHash, Gas, NearToken};
    use serde_json::json;

    fn receiver() -> AccountId {
        "contract.near".parse().unwrap()
    }

    #[test]
    fn test_retryable_table() {
        assert!(RpcError::InvalidNonce { tx_nonce: 1, ak_nonce: 2 }.is_retryable());
        assert!(RpcError::Timeout("t".into()).is_retryable());
        assert!(RpcError::NodeNotSynced("n".into()).is_retryable());
        assert!(RpcError::ShardUnavailable("s".into()).is_retryable());
        assert!(RpcError::InternalServerError("i".into()).is_retryable());

        assert!(!RpcError::AccountDoesNotExist { account_id: "a.near".into() }.is_retryable());
        assert!(!RpcError::UnknownBlock("b".into()).is_retryable());
        assert!(!RpcError::FunctionCallError {
            contract_id: "c".into(),
            method_name: None,
            panic: "p".into(),
            logs: vec![],
        }
        .is_retryable());

        let congested = RpcError::InvalidTransaction {
            message: "m".into(),
            details: None,
            shard_congested: true,
            shard_stuck: false,
        };
        assert!(congested.is_retryable());
        let plain = RpcError::InvalidTransaction {
            message: "m".into(),
            details: None,
            shard_congested: false,
            shard_stuck: false,
        };
        assert!(!plain.is_retryable());
    }

    #[test]
    fn test_http_status_classification() {
        assert!(!RpcError::from_status(400, "bad").is_retryable());
        assert!(!RpcError::from_status(404, "missing").is_retryable());
        assert!(RpcError::from_status(408, "timeout").is_retryable());
        assert!(RpcError::from_status(429, "slow down").is_retryable());
        assert!(RpcError::from_status(503, "unavailable").is_retryable());
        assert!(RpcError::connection("refused").is_retryable());
    }

    #[test]
    fn test_from_rpc_error_cause_names() {
        let err = RpcError::from_rpc_error(&json!({
            "name": "HANDLER_ERROR",
            "cause": {"name": "UNKNOWN_ACCOUNT", "info": {"requested_account_id": "ghost.near"}},
            "code": -32000,
            "message": "Server error"
        }));
        assert_eq!(err, RpcError::AccountDoesNotExist { account_id: "ghost.near".into() });

        let err = RpcError::from_rpc_error(&json!({
            "name": "HANDLER_ERROR",
            "cause": {"name": "UNKNOWN_ACCESS_KEY", "info": {"public_key": "ed25519:abc"}}
        }));
        let account: AccountId = "alice.near".parse().unwrap();
        assert_eq!(
            err.for_access_key(&account, "ed25519:abc"),
            RpcError::AccessKeyDoesNotExist {
                account_id: "alice.near".into(),
                public_key: "ed25519:abc".into()
            }
        );

        for (name, expect_retry) in [
            ("TIMEOUT_ERROR", true),
            ("NO_SYNCED_BLOCKS", true),
            ("NOT_SYNCED_YET", true),
            ("UNAVAILABLE_SHARD", true),
            ("INTERNAL_ERROR", true),
            ("UNKNOWN_BLOCK", false),
            ("UNKNOWN_CHUNK", false),
            ("UNKNOWN_EPOCH", false),
            ("UNKNOWN_RECEIPT", false),
            ("PARSE_ERROR", false),
        ] {
            let err = RpcError::from_rpc_error(&json!({"cause": {"name": name}, "code": -32000}));
            assert_eq!(err.is_retryable(), expect_retry, "{}", name);
        }
    }

    #[test]
    fn test_invalid_transaction_nested_markers() {
        let err = RpcError::from_rpc_error(&json!({
            "name": "HANDLER_ERROR",
            "cause": {"name": "INVALID_TRANSACTION", "info": {}},
            "data": {"TxExecutionError": {"InvalidTxError": {"InvalidNonce": {"tx_nonce": 5, "ak_nonce": 9}}}}
        }));
        assert_eq!(err, RpcError::InvalidNonce { tx_nonce: 5, ak_nonce: 9 });

        let err = RpcError::from_rpc_error(&json!({
            "cause": {"name": "INVALID_TRANSACTION", "info": {"ShardCongested": {"shard_id": 3}}}
        }));
        match err {
            RpcError::InvalidTransaction { shard_congested, shard_stuck, .. } => {
                assert!(shard_congested);
                assert!(!shard_stuck);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_function_call_failure_uses_action_index() {
        let actions = vec![
            Action::transfer(NearToken::from_yocto(1)),
            Action::function_call("first", vec![], Gas::DEFAULT_CALL, NearToken::default()),
            Action::function_call("second", vec![], Gas::DEFAULT_CALL, NearToken::default()),
        ];
        let failure = json!({"ActionError": {"index": 2, "kind": {"FunctionCallError": {"ExecutionError": "Smart contract panicked: nope"}}}});
        let err = classify_failure(&failure, &actions, &receiver(), vec!["log".into()]);
        assert_eq!(
            err,
            RpcError::FunctionCallError {
                contract_id: "contract.near".into(),
                method_name: Some("second".into()),
                panic: "Smart contract panicked: nope".into(),
                logs: vec!["log".into()],
            }
        );
    }

    #[test]
    fn test_classify_guest_panic_and_other_kinds() {
        let actions = vec![Action::function_call("go", vec![], Gas::DEFAULT_CALL, NearToken::default())];
        let failure = json!({"ActionError": {"index": 0, "kind": {"FunctionCallError": {"HostError": {"GuestPanic": {"panic_msg": "oops"}}}}}});
        match classify_failure(&failure, &actions, &receiver(), vec![]) {
            RpcError::FunctionCallError { panic, .. } => assert_eq!(panic, "oops"),
            other => panic!("unexpected {:?}", other),
        }

        let missing = json!({"ActionError": {"index": 0, "kind": {"AccountDoesNotExist": {"account_id": "nobody.near"}}}});
        assert_eq!(
            classify_failure(&missing, &actions, &receiver(), vec![]),
            RpcError::AccountDoesNotExist { account_id: "nobody.near".into() }
        );

        let nonce = json!({"InvalidTxError": {"InvalidNonce": {"tx_nonce": 1, "ak_nonce": 1}}});
        assert!(matches!(
            classify_failure(&nonce, &actions, &receiver(), vec![]),
            RpcError::InvalidNonce { .. }
        ));

        let other = json!({"ActionError": {"index": 0, "kind": {"LackBalanceForState": {}}}});
        assert!(matches!(
            classify_failure(&other, &actions, &receiver(), vec![]),
            RpcError::InvalidTransaction { .. }
        ));
    }

    fn outcome_with_receipts(failure: &Value, receipts: Value) -> FinalExecutionOutcome {
        serde_json::from_value(json!({
            "status": {"Failure": failure},
            "transaction_outcome": {
                "id": CryptoHash::hash(b"tx").to_string(),
                "outcome": {"executor_id": "alice.near", "status": {"SuccessReceiptId": CryptoHash::hash(b"r1").to_string()}}
            },
            "receipts_outcome": receipts
        }))
        .unwrap()
    }

    #[test]
    fn test_downstream_panic_names_executing_contract() {
        let swap = vec![Action::function_call("swap", vec![], Gas::DEFAULT_CALL, NearToken::default())];
        let router: AccountId = "router.near".parse().unwrap();
        let failure = json!({"ActionError": {"index": 0, "kind": {"FunctionCallError": {"ExecutionError": "Smart contract panicked: insufficient balance"}}}});
        let outcome = outcome_with_receipts(
            &failure,
            json!([
                {"id": CryptoHash::hash(b"r1").to_string(), "outcome": {
                    "executor_id": "router.near", "logs": ["router log"],
                    "status": {"SuccessReceiptId": CryptoHash::hash(b"r2").to_string()}}},
                {"id": CryptoHash::hash(b"r2").to_string(), "outcome": {
                    "executor_id": "token.near", "logs": ["token log"],
                    "status": {"Failure": failure}}}
            ]),
        );

        assert_eq!(
            classify_outcome_failure(&outcome, &swap, &router),
            Some(RpcError::FunctionCallError {
                contract_id: "token.near".into(),
                method_name: None,
                panic: "Smart contract panicked: insufficient balance".into(),
                logs: vec!["token log".into()],
            })
        );
    }

    #[test]
    fn test_direct_receipt_panic_keeps_method() {
        let swap = vec![Action::function_call("swap", vec![], Gas::DEFAULT_CALL, NearToken::default())];
        let router: AccountId = "router.near".parse().unwrap();
        let failure = json!({"ActionError": {"index": 0, "kind": {"FunctionCallError": {"ExecutionError": "bad route"}}}});
        let outcome = outcome_with_receipts(
            &failure,
            json!([{"id": CryptoHash::hash(b"r1").to_string(), "outcome": {
                "executor_id": "router.near", "logs": ["router log"], "status": {"Failure": failure}}}]),
        );

        match classify_outcome_failure(&outcome, &swap, &router) {
            Some(RpcError::FunctionCallError { contract_id, method_name, logs, .. }) => {
                assert_eq!(contract_id, "router.near");
                assert_eq!(method_name.as_deref(), Some("swap"));
                assert_eq!(logs, vec!["router log".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let success: FinalExecutionOutcome =
            serde_json::from_value(json!({"status": {"SuccessValue": ""}})).unwrap();
        assert!(classify_outcome_failure(&success, &swap, &router).is_none());
    }

    #[test]
    fn test_retry_policy_delay() {
        let policy = RetryPolicy::default();

        let delay1 = policy.calculate_delay(0);
        assert!(delay1.is_some());

        let delay2 = policy.calculate_delay(1);
        assert!(delay2.unwrap() >= delay1.unwrap());

        assert!(policy.calculate_delay(10).is_none());
        assert!(RetryPolicy::none().calculate_delay(1).is_none());
    }

    #[test]
    fn test_retry_policy_variants() {
        let aggressive = RetryPolicy::aggressive();
        assert_eq!(aggressive.max_attempts, 5);
        assert_eq!(aggressive.base_delay_ms, 50);

        let conservative = RetryPolicy::conservative();
        assert_eq!(conservative.max_attempts, 2);
        assert_eq!(conservative.base_delay_ms, 200);
    }
}
