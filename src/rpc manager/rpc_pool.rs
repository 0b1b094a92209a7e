//! JSON-RPC transport with endpoint failover
//!
//! Requests go to the active endpoint. When it fails at the transport
//! level the next endpoint in configuration order is tried and becomes
//! active on success. Each endpoint has its own rate limiter.
//!
//! `send_tx` is not idempotent from the client's point of view: it only
//! fails over when the connection could not be established at all, so a
//! transaction is never submitted twice because of a slow answer.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::rpc_config::{ConfigError, RpcEndpointConfig, RpcManagerConfig};
use super::rpc_errors::{RpcError, RpcResult};
use super::rpc_types::{AccessKeyListView, AccessKeyView, BlockView, FinalExecutionOutcome, StatusResponse};
use super::RpcProvider;
use crate::keys::PublicKey;
use crate::metrics::Metrics;
use crate::tx_builder::transaction::SignedTransaction;
use crate::types::{AccountId, BlockReference, CryptoHash, WaitUntil};

/// One configured endpoint plus its counters
struct Endpoint {
    config: RpcEndpointConfig,
    limiter: DefaultDirectRateLimiter,
    requests: AtomicU64,
    failures: AtomicU64,
}

impl Endpoint {
    fn new(config: RpcEndpointConfig) -> Self {
        let rps = NonZeroU32::new(config.rate_limit_rps).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rps)),
            config,
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }
}

/// Snapshot of an endpoint's request counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStats {
    pub url: String,
    pub requests: u64,
    pub failures: u64,
    pub active: bool,
}

/// Failed attempt against one endpoint
struct CallFailure {
    error: RpcError,
    /// No connection was established, so the request never reached a node
    connect: bool,
}

impl From<RpcError> for CallFailure {
    fn from(error: RpcError) -> Self {
        Self {
            error,
            connect: false,
        }
    }
}

fn transport_failure(err: reqwest::Error) -> CallFailure {
    if err.is_timeout() {
        CallFailure {
            error: RpcError::Timeout(err.to_string()),
            connect: false,
        }
    } else {
        CallFailure {
            error: RpcError::connection(err.to_string()),
            connect: err.is_connect(),
        }
    }
}

/// Errors after which another endpoint may answer differently
fn endpoint_specific(error: &RpcError) -> bool {
    match error {
        RpcError::Network { retryable, .. } => *retryable,
        RpcError::Timeout(_) => true,
        RpcError::NodeNotSynced(_) => true,
        RpcError::InternalServerError(_) => true,
        _ => false,
    }
}

fn parse<T: DeserializeOwned>(method: &str, value: Value) -> RpcResult<T> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::Parse(format!("{} result: {}", method, e)))
}

/// HTTP JSON-RPC implementation of [`RpcProvider`]
pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoints: Vec<Endpoint>,
    active: AtomicUsize,
    next_id: AtomicU64,
    failover_send: bool,
    metrics: Option<Arc<Metrics>>,
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field(
                "endpoints",
                &self.endpoints.iter().map(|e| e.config.url.as_str()).collect::<Vec<_>>(),
            )
            .field("active", &self.active.load(Ordering::Relaxed))
            .field("failover_send", &self.failover_send)
            .finish_non_exhaustive()
    }
}

impl JsonRpcClient {
    pub fn new(config: &RpcManagerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::ValidationError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoints: config.endpoints.iter().cloned().map(Endpoint::new).collect(),
            active: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            failover_send: config.failover_send_on_connect_error,
            metrics: None,
        })
    }

    /// Single-endpoint client with default settings
    pub fn from_url(url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(&RpcManagerConfig::from_urls(&[url.into()]))
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// URL requests currently go to first
    pub fn active_endpoint(&self) -> &str {
        let index = self.active.load(Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[index].config.url
    }

    pub fn endpoint_stats(&self) -> Vec<EndpointStats> {
        let active = self.active.load(Ordering::Relaxed) % self.endpoints.len();
        self.endpoints
            .iter()
            .enumerate()
            .map(|(index, e)| EndpointStats {
                url: e.config.url.clone(),
                requests: e.requests.load(Ordering::Relaxed),
                failures: e.failures.load(Ordering::Relaxed),
                active: index == active,
            })
            .collect()
    }

    /// Call `method`, failing over between endpoints.
    ///
    /// Non-idempotent calls only fail over when the connection was refused.
    pub async fn call(&self, method: &str, params: Value, idempotent: bool) -> RpcResult<Value> {
        let count = self.endpoints.len();
        let start = self.active.load(Ordering::Relaxed) % count;
        let mut last_error = None;

        for offset in 0..count {
            let index = (start + offset) % count;
            let endpoint = &self.endpoints[index];

            match self.call_endpoint(endpoint, method, &params).await {
                Ok(value) => {
                    if index != start {
                        self.active.store(index, Ordering::Relaxed);
                        info!(
                            endpoint = %endpoint.config.url,
                            method,
                            "Switched active RPC endpoint"
                        );
                    }
                    return Ok(value);
                }
                Err(failure) => {
                    endpoint.failures.fetch_add(1, Ordering::Relaxed);
                    if let Some(metrics) = &self.metrics {
                        metrics.record_rpc_error(failure.error.category());
                    }

                    let may_failover = endpoint_specific(&failure.error)
                        && (idempotent || (failure.connect && self.failover_send));
                    if !may_failover {
                        return Err(failure.error);
                    }

                    warn!(
                        endpoint = %endpoint.config.url,
                        method,
                        error = %failure.error,
                        "RPC endpoint failed, trying next"
                    );
                    last_error = Some(failure.error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RpcError::connection("no RPC endpoints configured")))
    }

    async fn call_endpoint(
        &self,
        endpoint: &Endpoint,
        method: &str,
        params: &Value,
    ) -> Result<Value, CallFailure> {
        endpoint.limiter.until_ready().await;
        endpoint.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.record_rpc_request(method);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id.to_string(),
            "method": method,
            "params": params,
        });

        debug!(endpoint = %endpoint.config.url, method, id, "Sending RPC request");

        let mut request = self
            .http
            .post(&endpoint.config.url)
            .timeout(Duration::from_millis(endpoint.config.timeout_ms))
            .json(&payload);
        if let Some(key) = &endpoint.config.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) if status.is_success() => {
                return Err(RpcError::Parse(format!("{} invalid JSON: {}", method, e)).into())
            }
            Err(_) => return Err(RpcError::from_status(status.as_u16(), body).into()),
        };

        if let Some(error) = value.get("error") {
            return Err(RpcError::from_rpc_error(error).into());
        }
        if !status.is_success() {
            return Err(RpcError::from_status(status.as_u16(), body).into());
        }

        value
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::Parse(format!("{} response missing result", method)).into())
    }

    async fn query(&self, request_type: &str, reference: &BlockReference, fields: Value) -> RpcResult<Value> {
        let mut params = reference.to_params();
        if let (Some(target), Value::Object(extra)) = (params.as_object_mut(), fields) {
            target.insert("request_type".to_string(), Value::String(request_type.to_string()));
            target.extend(extra);
        }
        self.call("query", params, true).await
    }
}

#[async_trait]
impl RpcProvider for JsonRpcClient {
    async fn block(&self, reference: &BlockReference) -> RpcResult<BlockView> {
        let value = self.call("block", reference.to_params(), true).await?;
        parse("block", value)
    }

    async fn view_access_key(
        &self,
        account_id: &AccountId,
        public_key: &PublicKey,
        reference: &BlockReference,
    ) -> RpcResult<AccessKeyView> {
        let key_text = public_key.to_string();
        let value = self
            .query(
                "view_access_key",
                reference,
                json!({ "account_id": account_id, "public_key": key_text }),
            )
            .await
            .map_err(|e| e.for_access_key(account_id, &key_text))?;

        // Older nodes report a missing key inside an otherwise successful result
        if value.get("error").and_then(Value::as_str).is_some() {
            return Err(RpcError::AccessKeyDoesNotExist {
                account_id: account_id.to_string(),
                public_key: key_text,
            });
        }
        parse("view_access_key", value)
    }

    async fn view_access_key_list(
        &self,
        account_id: &AccountId,
        reference: &BlockReference,
    ) -> RpcResult<AccessKeyListView> {
        let value = self
            .query("view_access_key_list", reference, json!({ "account_id": account_id }))
            .await
            .map_err(|e| e.for_access_key(account_id, ""))?;
        parse("view_access_key_list", value)
    }

    async fn send_tx(
        &self,
        signed: &SignedTransaction,
        wait_until: WaitUntil,
    ) -> RpcResult<FinalExecutionOutcome> {
        let encoded = signed
            .to_base64()
            .map_err(|e| RpcError::Parse(format!("failed to encode transaction: {}", e)))?;
        let value = self
            .call(
                "send_tx",
                json!({ "signed_tx_base64": encoded, "wait_until": wait_until.as_str() }),
                false,
            )
            .await?;
        parse("send_tx", value)
    }

    async fn tx_status(
        &self,
        tx_hash: &CryptoHash,
        sender_id: &AccountId,
        wait_until: WaitUntil,
    ) -> RpcResult<FinalExecutionOutcome> {
        let value = self
            .call(
                "tx",
                json!({
                    "tx_hash": tx_hash.to_string(),
                    "sender_account_id": sender_id,
                    "wait_until": wait_until.as_str(),
                }),
                true,
            )
            .await?;
        parse("tx", value)
    }

    async fn status(&self) -> RpcResult<StatusResponse> {
        let value = self.call("status", json!([]), true).await?;
        parse("status", value)
    }
}
