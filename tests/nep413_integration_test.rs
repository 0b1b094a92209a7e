//! Off-chain message signing from a derived key, verified offline and
//! against a mocked node

use mockito::{Matcher, Server};
use serde_json::json;

use near_submit::keys::KeyPair;
use near_submit::nep413::{
    sign_message, verify_signature, verify_signature_with_lookup, SignMessageParams,
    SignedMessage, VerifyOptions,
};
use near_submit::rpc_manager::{JsonRpcClient, RpcManagerConfig};
use near_submit::types::{AccountId, CryptoHash};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon \
                      abandon abandon abandon abandon abandon about";

fn account() -> AccountId {
    "alice.near".parse().unwrap()
}

fn signed_request() -> (SignMessageParams, SignedMessage) {
    let key = KeyPair::from_mnemonic(PHRASE, 0).unwrap();
    let params = SignMessageParams::new("Sign in to app.near", "app.near")
        .with_callback_url("https://app.near.org/callback")
        .with_state("csrf-123");
    let signed = sign_message(&key, &account(), &params).unwrap();
    (params, signed)
}

#[test]
fn test_signed_message_survives_json_transport() {
    let (params, signed) = signed_request();

    let params_json = serde_json::to_value(&params).unwrap();
    assert_eq!(params_json["callbackUrl"], "https://app.near.org/callback");
    let signed_json = serde_json::to_string(&signed).unwrap();
    assert!(signed_json.contains("\"accountId\":\"alice.near\""));
    assert!(signed_json.contains("\"state\":\"csrf-123\""));

    let params: SignMessageParams = serde_json::from_value(params_json).unwrap();
    let signed: SignedMessage = serde_json::from_str(&signed_json).unwrap();
    assert!(verify_signature(&signed, &params, &VerifyOptions::default()));
}

#[test]
fn test_changed_recipient_fails_verification() {
    let (mut params, signed) = signed_request();
    params.recipient = "evil.near".to_string();
    assert!(!verify_signature(&signed, &params, &VerifyOptions::default()));
}

#[test]
fn test_stale_nonce_is_rejected() {
    let key = KeyPair::from_mnemonic(PHRASE, 0).unwrap();
    let mut params = SignMessageParams::new("hello", "app.near");
    // One hour old
    let issued = (chrono::Utc::now().timestamp_millis() - 3_600_000) as u64;
    params.nonce[..8].copy_from_slice(&issued.to_be_bytes());
    let signed = sign_message(&key, &account(), &params).unwrap();

    assert!(!verify_signature(&signed, &params, &VerifyOptions::default()));
    let lenient = VerifyOptions {
        max_age: None,
        ..VerifyOptions::default()
    };
    assert!(verify_signature(&signed, &params, &lenient));
}

async fn node_with_permission(permission: serde_json::Value) -> mockito::ServerGuard {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "query",
            "params": {"request_type": "view_access_key", "account_id": "alice.near"}
        })))
        .with_status(200)
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": "1",
                "result": {
                    "nonce": 5,
                    "permission": permission,
                    "block_height": 10,
                    "block_hash": CryptoHash::hash(b"block").to_string()
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
}

#[tokio::test]
async fn test_online_verification_requires_full_access_key() {
    let (params, signed) = signed_request();

    let full = node_with_permission(json!("FullAccess")).await;
    let rpc = JsonRpcClient::new(&RpcManagerConfig::from_urls(&[full.url()])).unwrap();
    assert!(verify_signature_with_lookup(&signed, &params, &VerifyOptions::default(), &rpc).await);

    let limited = node_with_permission(json!({
        "FunctionCall": {"allowance": null, "receiver_id": "app.near", "method_names": []}
    }))
    .await;
    let rpc = JsonRpcClient::new(&RpcManagerConfig::from_urls(&[limited.url()])).unwrap();
    assert!(!verify_signature_with_lookup(&signed, &params, &VerifyOptions::default(), &rpc).await);

    let any_key = VerifyOptions {
        require_full_access: false,
        ..VerifyOptions::default()
    };
    assert!(verify_signature_with_lookup(&signed, &params, &any_key, &rpc).await);
}

#[tokio::test]
async fn test_online_verification_fails_for_unknown_key() {
    let (params, signed) = signed_request();

    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": "1",
                "error": {
                    "name": "HANDLER_ERROR",
                    "cause": {"name": "UNKNOWN_ACCESS_KEY", "info": {}},
                    "code": -32000,
                    "message": "Server error"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let rpc = JsonRpcClient::new(&RpcManagerConfig::from_urls(&[server.url()])).unwrap();
    assert!(!verify_signature_with_lookup(&signed, &params, &VerifyOptions::default(), &rpc).await);
}
