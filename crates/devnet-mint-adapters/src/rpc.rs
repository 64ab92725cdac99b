use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use solana_program::hash::Hash;

use devnet_mint_core::{
    Commitment, Confirmation, NetworkPort, PortError, TxSignature, SIGNATURE_LEN,
};

use crate::MintAdapterConfig;

/// Ledger access over the cluster's JSON-RPC endpoint, with an in-memory
/// ledger for development runs without network access.
#[derive(Debug, Clone)]
pub struct SolanaRpcAdapter {
    mode: RpcMode,
    commitment: Commitment,
    confirm_poll_interval_ms: u64,
    confirm_max_attempts: u32,
    ledger: Arc<Mutex<InMemoryLedger>>,
}

#[derive(Debug, Clone)]
enum RpcMode {
    Disabled(String),
    InMemory,
    Http(HttpRuntime),
}

#[derive(Debug, Clone)]
struct HttpRuntime {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Default)]
struct InMemoryLedger {
    slot: u64,
    submitted: Vec<(TxSignature, u64)>,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    slot: u64,
    err: Option<Value>,
    confirmation_status: Option<String>,
}

impl Default for SolanaRpcAdapter {
    fn default() -> Self {
        Self::with_config(MintAdapterConfig::default())
    }
}

impl SolanaRpcAdapter {
    pub fn with_config(config: MintAdapterConfig) -> Self {
        let mode = if config.rpc_http_enabled {
            match build_client(config.rpc_timeout_ms) {
                Ok(client) => RpcMode::Http(HttpRuntime {
                    endpoint: config.rpc_endpoint().to_owned(),
                    client,
                }),
                Err(e) if config.strict_runtime_required() => RpcMode::Disabled(format!(
                    "failed to initialize rpc client in production profile: {e}"
                )),
                Err(e) => {
                    tracing::warn!(error = %e, "rpc client unavailable, using in-memory ledger");
                    RpcMode::InMemory
                }
            }
        } else if config.strict_runtime_required() {
            RpcMode::Disabled("rpc http runtime not enabled in production profile".to_owned())
        } else {
            RpcMode::InMemory
        };

        Self {
            mode,
            commitment: config.commitment,
            confirm_poll_interval_ms: config.confirm_poll_interval_ms,
            confirm_max_attempts: config.confirm_max_attempts.max(1),
            ledger: Arc::new(Mutex::new(InMemoryLedger::default())),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_config(MintAdapterConfig {
            rpc_http_enabled: false,
            ..MintAdapterConfig::default()
        })
    }

    pub fn is_http(&self) -> bool {
        matches!(self.mode, RpcMode::Http(_))
    }

    fn http(&self) -> Result<Option<&HttpRuntime>, PortError> {
        match &self.mode {
            RpcMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            RpcMode::InMemory => Ok(None),
            RpcMode::Http(rt) => Ok(Some(rt)),
        }
    }

    async fn rpc_call(
        &self,
        rt: &HttpRuntime,
        method: &str,
        params: Value,
    ) -> Result<Value, PortError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, endpoint = %rt.endpoint, "rpc request");
        let response = rt
            .client
            .post(&rt.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("rpc {method} request failed: {e}")))?;
        let status = response.status();
        let body: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("rpc {method} json decode failed: {e}")))?;
        if let Some(err) = body.error {
            return Err(PortError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!("rpc {method} status {status}")));
        }
        body.result
            .ok_or_else(|| PortError::Transport(format!("rpc {method} missing result")))
    }

    fn lock_ledger(&self) -> Result<std::sync::MutexGuard<'_, InMemoryLedger>, PortError> {
        self.ledger
            .lock()
            .map_err(|e| PortError::Transport(format!("ledger lock poisoned: {e}")))
    }
}

#[async_trait(?Send)]
impl NetworkPort for SolanaRpcAdapter {
    async fn latest_blockhash(&self) -> Result<Hash, PortError> {
        let Some(rt) = self.http()? else {
            let mut ledger = self.lock_ledger()?;
            ledger.slot = ledger.slot.saturating_add(1);
            let digest = Sha256::digest(ledger.slot.to_le_bytes());
            return Ok(Hash::new_from_array(digest.into()));
        };
        let result = self
            .rpc_call(
                rt,
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;
        let raw = result
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PortError::Transport("getLatestBlockhash: value.blockhash expected".to_owned())
            })?;
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid blockhash {raw}: {e}")))
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<TxSignature, PortError> {
        let Some(rt) = self.http()? else {
            let signature = wire
                .get(1..1 + SIGNATURE_LEN)
                .and_then(TxSignature::from_slice)
                .ok_or_else(|| PortError::Validation("transaction too short".to_owned()))?;
            let mut ledger = self.lock_ledger()?;
            ledger.slot = ledger.slot.saturating_add(1);
            let slot = ledger.slot;
            ledger.submitted.push((signature, slot));
            return Ok(signature);
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(wire);
        let result = self
            .rpc_call(
                rt,
                "sendTransaction",
                json!([encoded, {
                    "encoding": "base64",
                    "preflightCommitment": self.commitment.as_str(),
                }]),
            )
            .await?;
        let raw = result.as_str().ok_or_else(|| {
            PortError::Transport("sendTransaction must return a signature".to_owned())
        })?;
        raw.parse().map_err(PortError::Validation)
    }

    async fn confirm_transaction(
        &self,
        signature: &TxSignature,
    ) -> Result<Confirmation, PortError> {
        let Some(rt) = self.http()? else {
            let ledger = self.lock_ledger()?;
            return ledger
                .submitted
                .iter()
                .find(|(sig, _)| sig == signature)
                .map(|(sig, slot)| Confirmation {
                    signature: *sig,
                    slot: *slot,
                    commitment: self.commitment,
                })
                .ok_or_else(|| {
                    PortError::Validation(format!("transaction {signature} was never submitted"))
                });
        };

        for attempt in 1..=self.confirm_max_attempts {
            let result = self
                .rpc_call(
                    rt,
                    "getSignatureStatuses",
                    json!([[signature.to_string()], { "searchTransactionHistory": false }]),
                )
                .await?;
            let status = result
                .pointer("/value/0")
                .filter(|v| !v.is_null())
                .cloned()
                .map(serde_json::from_value::<SignatureStatus>)
                .transpose()
                .map_err(|e| {
                    PortError::Transport(format!("getSignatureStatuses decode failed: {e}"))
                })?;

            if let Some(status) = status {
                if let Some(err) = status.err.filter(|e| !e.is_null()) {
                    return Err(PortError::Validation(format!(
                        "transaction {signature} failed: {err}"
                    )));
                }
                let reached = status
                    .confirmation_status
                    .as_deref()
                    .and_then(|s| s.parse::<Commitment>().ok())
                    .is_some_and(|c| c >= self.commitment);
                if reached {
                    return Ok(Confirmation {
                        signature: *signature,
                        slot: status.slot,
                        commitment: self.commitment,
                    });
                }
            }
            tracing::debug!(attempt, signature = %signature, "awaiting confirmation");
            if attempt < self.confirm_max_attempts {
                sleep_ms(self.confirm_poll_interval_ms).await;
            }
        }
        Err(PortError::Timeout(format!(
            "transaction {signature} not {} after {} checks",
            self.commitment.as_str(),
            self.confirm_max_attempts
        )))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_client(timeout_ms: u64) -> Result<reqwest::Client, reqwest::Error> {
    // Native callers drive each request on a short-lived runtime, so idle
    // connections must not be kept past it.
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .pool_max_idle_per_host(0)
        .build()
}

#[cfg(target_arch = "wasm32")]
fn build_client(_timeout_ms: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().build()
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_ms(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep_ms(ms: u64) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().is_some_and(|window| {
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    &resolve,
                    ms.min(i32::MAX as u64) as i32,
                )
                .is_ok()
        });
        // without a timer the next poll runs immediately; the attempt bound still holds
        if !scheduled {
            let _ = resolve.call0(&wasm_bindgen::JsValue::UNDEFINED);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
