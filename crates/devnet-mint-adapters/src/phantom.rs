use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use solana_program::pubkey::Pubkey;

use devnet_mint_core::{
    ConnectOptions, ConnectResponse, DisplayEncoding, MessageSignature, PendingTransaction,
    PortError, ProviderEvent, ProviderEventKind, SignedTransaction, TxSignature,
    WalletProviderPort, SIGNATURE_LEN,
};

use crate::MintAdapterConfig;

const DETERMINISTIC_KEY_SEED: &[u8] = b"devnet-mint/deterministic-wallet/v1";
const USER_REJECTED: &str = "User rejected the request.";

/// Phantom-style wallet. In the browser it drives the injected
/// `window.solana` object; elsewhere it falls back to an in-process wallet
/// that mimics the provider's trust gating and notifications.
#[derive(Debug, Clone)]
pub struct PhantomAdapter {
    mode: ProviderMode,
    state: Arc<Mutex<WalletState>>,
    #[cfg(target_arch = "wasm32")]
    hooks: Arc<Mutex<BrowserHooks>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(target_arch = "wasm32")]
    Browser,
}

#[derive(Debug)]
struct WalletState {
    public_key: Pubkey,
    connected: bool,
    trusted: bool,
    reject_requests: bool,
    listeners: Vec<ProviderEventKind>,
    event_seq: u64,
    events: Vec<ProviderEvent>,
}

impl WalletState {
    fn new(trusted: bool) -> Self {
        let digest = Sha256::digest(DETERMINISTIC_KEY_SEED);
        Self {
            public_key: Pubkey::new_from_array(digest.into()),
            connected: false,
            trusted,
            reject_requests: false,
            listeners: Vec::new(),
            event_seq: 0,
            events: Vec::new(),
        }
    }

    /// Queues a notification if someone is listening for it.
    fn record(&mut self, kind: ProviderEventKind, public_key: Option<Pubkey>) {
        if !self.listeners.contains(&kind) {
            return;
        }
        self.event_seq = self.event_seq.saturating_add(1);
        self.events.push(ProviderEvent {
            sequence: self.event_seq,
            kind,
            public_key,
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
struct BrowserHooks {
    handlers: Vec<(
        ProviderEventKind,
        wasm_bindgen::closure::Closure<dyn FnMut(wasm_bindgen::JsValue)>,
    )>,
}

impl Default for PhantomAdapter {
    fn default() -> Self {
        Self::deterministic(&MintAdapterConfig::default())
    }
}

impl PhantomAdapter {
    /// In-process wallet, refused under the production profile.
    pub fn deterministic(config: &MintAdapterConfig) -> Self {
        let mode = if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "deterministic wallet is unavailable in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };
        Self::with_mode(mode, config.trusted_origin)
    }

    /// Wraps the injected browser provider. Callers check availability first.
    #[cfg(target_arch = "wasm32")]
    pub fn browser() -> Self {
        Self::with_mode(ProviderMode::Browser, false)
    }

    fn with_mode(mode: ProviderMode, trusted: bool) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(WalletState::new(trusted))),
            #[cfg(target_arch = "wasm32")]
            hooks: Arc::new(Mutex::new(BrowserHooks::default())),
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, WalletState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("wallet lock poisoned: {e}")))
    }

    /// Makes the deterministic wallet treat the page origin as approved or not.
    pub fn debug_set_trusted(&self, trusted: bool) -> Result<(), PortError> {
        self.lock_state()?.trusted = trusted;
        Ok(())
    }

    /// Makes the deterministic wallet decline every prompt, like a user
    /// pressing "Cancel".
    pub fn debug_reject_requests(&self, reject: bool) -> Result<(), PortError> {
        self.lock_state()?.reject_requests = reject;
        Ok(())
    }

    fn deterministic_signature(&self, signer: &Pubkey, payload: &[u8]) -> TxSignature {
        let mut first = Sha256::new();
        first.update(signer.as_ref());
        first.update(payload);
        let first = first.finalize();
        let second = Sha256::new().chain_update(first).chain_update(payload).finalize();
        let mut sig = [0u8; SIGNATURE_LEN];
        sig[..32].copy_from_slice(&first);
        sig[32..].copy_from_slice(&second);
        TxSignature(sig)
    }

    /// Connected key for a signing prompt, or the reason the prompt fails.
    fn approve_signing(&self) -> Result<Pubkey, PortError> {
        let g = self.lock_state()?;
        if !g.connected {
            return Err(PortError::NotConnected);
        }
        if g.reject_requests {
            return Err(PortError::Rejected(USER_REJECTED.to_owned()));
        }
        Ok(g.public_key)
    }

    fn deterministic_connect(&self, options: ConnectOptions) -> Result<ConnectResponse, PortError> {
        let mut g = self.lock_state()?;
        if options.only_if_trusted && !g.trusted {
            return Err(PortError::Untrusted);
        }
        if !options.only_if_trusted && g.reject_requests {
            return Err(PortError::Rejected(USER_REJECTED.to_owned()));
        }
        let key = g.public_key;
        g.trusted = true;
        if !g.connected {
            g.connected = true;
            g.record(ProviderEventKind::Connect, Some(key));
        }
        Ok(ConnectResponse { public_key: key })
    }

    fn deterministic_disconnect(&self) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        if g.connected {
            g.connected = false;
            g.record(ProviderEventKind::Disconnect, None);
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl WalletProviderPort for PhantomAdapter {
    fn public_key(&self) -> Option<Pubkey> {
        match &self.mode {
            ProviderMode::Disabled(_) => None,
            ProviderMode::Deterministic => self
                .lock_state()
                .ok()
                .filter(|g| g.connected)
                .map(|g| g.public_key),
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => browser::public_key(),
        }
    }

    fn is_connected(&self) -> bool {
        match &self.mode {
            ProviderMode::Disabled(_) => false,
            ProviderMode::Deterministic => self.lock_state().map(|g| g.connected).unwrap_or(false),
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser => browser::is_connected(),
        }
    }

    fn on(&self, event: ProviderEventKind) -> Result<(), PortError> {
        self.check_mode()?;
        {
            let mut g = self.lock_state()?;
            if g.listeners.contains(&event) {
                return Ok(());
            }
            g.listeners.push(event);
        }
        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            self.register_browser_hook(event)?;
        }
        tracing::debug!(event = event.as_str(), "provider listener registered");
        Ok(())
    }

    fn remove_all_listeners(&self) -> Result<(), PortError> {
        self.check_mode()?;
        self.lock_state()?.listeners.clear();
        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            self.release_browser_hooks()?;
        }
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError> {
        self.check_mode()?;
        Ok(std::mem::take(&mut self.lock_state()?.events))
    }

    async fn connect(&self, options: ConnectOptions) -> Result<ConnectResponse, PortError> {
        self.check_mode()?;
        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            return self.browser_connect(options).await;
        }
        self.deterministic_connect(options)
    }

    async fn disconnect(&self) -> Result<(), PortError> {
        self.check_mode()?;
        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            return self
                .wasm_request("disconnect", wasm_bindgen::JsValue::UNDEFINED)
                .await
                .map(|_| ());
        }
        self.deterministic_disconnect()
    }

    async fn sign_transaction(
        &self,
        tx: &PendingTransaction,
    ) -> Result<SignedTransaction, PortError> {
        self.check_mode()?;
        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            return self.browser_sign_transaction(tx).await;
        }
        let signer = self.approve_signing()?;
        let signature = self.deterministic_signature(&signer, &tx.message_bytes());
        Ok(SignedTransaction::from_signature(tx, signature))
    }

    async fn sign_all_transactions(
        &self,
        txs: &[PendingTransaction],
    ) -> Result<Vec<SignedTransaction>, PortError> {
        self.check_mode()?;
        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            return self.browser_sign_all_transactions(txs).await;
        }
        let signer = self.approve_signing()?;
        Ok(txs
            .iter()
            .map(|tx| {
                let signature = self.deterministic_signature(&signer, &tx.message_bytes());
                SignedTransaction::from_signature(tx, signature)
            })
            .collect())
    }

    async fn sign_message(
        &self,
        message: &[u8],
        display: DisplayEncoding,
    ) -> Result<MessageSignature, PortError> {
        self.check_mode()?;
        #[cfg(target_arch = "wasm32")]
        if matches!(self.mode, ProviderMode::Browser) {
            return self.browser_sign_message(message, display).await;
        }
        let encoding = display.as_str();
        tracing::debug!(len = message.len(), encoding, "signing message");
        let signer = self.approve_signing()?;
        Ok(MessageSignature {
            signature: self.deterministic_signature(&signer, message),
            public_key: signer,
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl PhantomAdapter {
    fn register_browser_hook(&self, kind: ProviderEventKind) -> Result<(), PortError> {
        use wasm_bindgen::{closure::Closure, JsCast, JsValue};

        let provider = browser::provider()?;
        let on_fn = browser::function(&provider, "on")
            .or_else(|| browser::function(&provider, "addListener"))
            .ok_or(PortError::NotImplemented(
                "provider does not expose on/addListener",
            ))?;

        let state = Arc::clone(&self.state);
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let key = match kind {
                ProviderEventKind::Connect => browser::js_text(&value)
                    .and_then(|s| s.parse::<Pubkey>().ok())
                    .or_else(browser::public_key),
                ProviderEventKind::Disconnect => None,
            };
            if let Ok(mut g) = state.lock() {
                g.record(kind, key);
            }
        });

        on_fn
            .call2(
                &provider,
                &JsValue::from_str(kind.as_str()),
                callback.as_ref().unchecked_ref(),
            )
            .map_err(|e| {
                PortError::Transport(format!("register {} failed: {e:?}", kind.as_str()))
            })?;

        self.hooks
            .lock()
            .map_err(|e| PortError::Transport(format!("provider hooks lock poisoned: {e}")))?
            .handlers
            .push((kind, callback));
        Ok(())
    }

    fn release_browser_hooks(&self) -> Result<(), PortError> {
        use wasm_bindgen::{JsCast, JsValue};

        let mut hooks = self
            .hooks
            .lock()
            .map_err(|e| PortError::Transport(format!("provider hooks lock poisoned: {e}")))?;
        let off_fn = browser::provider().ok().and_then(|provider| {
            browser::function(&provider, "removeListener")
                .or_else(|| browser::function(&provider, "off"))
                .map(|off| (provider, off))
        });

        // A closure the provider may still call must never be dropped.
        let mut failure = None;
        for (kind, callback) in hooks.handlers.drain(..) {
            let released = match &off_fn {
                Some((provider, off)) if failure.is_none() => off
                    .call2(
                        provider,
                        &JsValue::from_str(kind.as_str()),
                        callback.as_ref().unchecked_ref(),
                    )
                    .map_err(|e| {
                        PortError::Transport(format!("release {} failed: {e:?}", kind.as_str()))
                    }),
                Some(_) => Err(PortError::Transport(format!(
                    "release {} skipped after earlier failure",
                    kind.as_str()
                ))),
                None => Err(PortError::NotImplemented(
                    "provider does not expose removeListener/off",
                )),
            };
            if let Err(e) = released {
                callback.forget();
                failure.get_or_insert(e);
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn browser_connect(&self, options: ConnectOptions) -> Result<ConnectResponse, PortError> {
        let params = browser::json_params(&serde_json::json!({
            "onlyIfTrusted": options.only_if_trusted,
        }))?;
        let result = match self.wasm_request("connect", params).await {
            Err(PortError::Rejected(_)) if options.only_if_trusted => {
                return Err(PortError::Untrusted)
            }
            other => other?,
        };
        let key = browser::get_prop(&result, "publicKey")
            .ok()
            .and_then(|v| browser::js_text(&v))
            .or_else(|| browser::public_key().map(|k| k.to_string()))
            .ok_or_else(|| PortError::Transport("connect returned no publicKey".to_owned()))?;
        let public_key = key
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid publicKey: {e}")))?;
        Ok(ConnectResponse { public_key })
    }

    async fn browser_sign_transaction(
        &self,
        tx: &PendingTransaction,
    ) -> Result<SignedTransaction, PortError> {
        let params = browser::json_params(&serde_json::json!({
            "message": bs58::encode(tx.message_bytes()).into_string(),
        }))?;
        let result = self.wasm_request("signTransaction", params).await?;
        let signature = browser::signature_prop(&result, "signature")?;
        Ok(SignedTransaction::from_signature(tx, signature))
    }

    async fn browser_sign_all_transactions(
        &self,
        txs: &[PendingTransaction],
    ) -> Result<Vec<SignedTransaction>, PortError> {
        let messages: Vec<String> = txs
            .iter()
            .map(|tx| bs58::encode(tx.message_bytes()).into_string())
            .collect();
        let params = browser::json_params(&serde_json::json!({ "messages": messages }))?;
        let result = self.wasm_request("signAllTransactions", params).await?;
        let raw = browser::get_prop(&result, "signatures")?;
        if !js_sys::Array::is_array(&raw) {
            return Err(PortError::Transport(
                "signAllTransactions must return a signatures array".to_owned(),
            ));
        }
        let signatures = js_sys::Array::from(&raw);
        if signatures.length() as usize != txs.len() {
            return Err(PortError::Validation(format!(
                "expected {} signatures, got {}",
                txs.len(),
                signatures.length()
            )));
        }
        txs.iter()
            .zip(signatures.iter())
            .map(|(tx, sig)| {
                browser::signature_value(&sig).map(|s| SignedTransaction::from_signature(tx, s))
            })
            .collect()
    }

    async fn browser_sign_message(
        &self,
        message: &[u8],
        display: DisplayEncoding,
    ) -> Result<MessageSignature, PortError> {
        use wasm_bindgen::JsValue;

        let params = js_sys::Object::new();
        browser::set_prop(&params, "message", &js_sys::Uint8Array::from(message).into())?;
        browser::set_prop(&params, "display", &JsValue::from_str(display.as_str()))?;
        let result = self.wasm_request("signMessage", params.into()).await?;
        let signature = browser::signature_prop(&result, "signature")?;
        let public_key = browser::get_prop(&result, "publicKey")
            .ok()
            .and_then(|v| browser::js_text(&v))
            .and_then(|s| s.parse().ok())
            .or_else(browser::public_key)
            .ok_or(PortError::NotConnected)?;
        Ok(MessageSignature {
            signature,
            public_key,
        })
    }

    async fn wasm_request(
        &self,
        method: &str,
        params: wasm_bindgen::JsValue,
    ) -> Result<wasm_bindgen::JsValue, PortError> {
        use wasm_bindgen::{JsCast, JsValue};

        let provider = browser::provider()?;
        let request_fn = browser::function(&provider, "request").ok_or(
            PortError::NotImplemented("window.solana.request is unavailable"),
        )?;

        let request = js_sys::Object::new();
        browser::set_prop(&request, "method", &JsValue::from_str(method))?;
        if !params.is_undefined() {
            browser::set_prop(&request, "params", &params)?;
        }
        tracing::debug!(method, "wallet request");
        let promise_js = request_fn.call1(&provider, &request).map_err(|e| {
            PortError::Transport(format!("provider request dispatch failed: {e:?}"))
        })?;
        let promise = promise_js.dyn_into::<js_sys::Promise>().map_err(|_| {
            PortError::Transport("provider request did not return Promise".to_owned())
        })?;
        wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(browser::request_error)
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) mod browser {
    use serde::Serialize;
    use solana_program::pubkey::Pubkey;
    use wasm_bindgen::{JsCast, JsValue};

    use devnet_mint_core::{PortError, TxSignature};

    /// EIP-1193 style "user rejected" code, which Phantom reuses.
    const USER_REJECTED_CODE: f64 = 4001.0;

    pub fn available() -> bool {
        provider()
            .ok()
            .and_then(|p| get_prop(&p, "isPhantom").ok())
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn provider() -> Result<JsValue, PortError> {
        let window =
            web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
        let provider = get_prop(&window.into(), "solana")?;
        if provider.is_null() || provider.is_undefined() {
            return Err(PortError::NotImplemented("window.solana missing"));
        }
        Ok(provider)
    }

    pub fn get_prop(target: &JsValue, key: &str) -> Result<JsValue, PortError> {
        js_sys::Reflect::get(target, &JsValue::from_str(key)).map_err(|e| {
            PortError::Transport(format!("read provider property {key} failed: {e:?}"))
        })
    }

    pub fn set_prop(target: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), PortError> {
        js_sys::Reflect::set(target, &JsValue::from_str(key), value)
            .map(|_| ())
            .map_err(|e| PortError::Transport(format!("set request field {key} failed: {e:?}")))
    }

    pub fn function(target: &JsValue, key: &str) -> Option<js_sys::Function> {
        get_prop(target, key)
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
    }

    pub fn json_params(value: &serde_json::Value) -> Result<JsValue, PortError> {
        value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| PortError::Transport(format!("failed to encode wasm request: {e}")))
    }

    /// String form of a JS value; `PublicKey` objects stringify to base58.
    pub fn js_text(value: &JsValue) -> Option<String> {
        if value.is_null() || value.is_undefined() {
            return None;
        }
        if let Some(s) = value.as_string() {
            return Some(s);
        }
        let obj: &js_sys::Object = value.unchecked_ref();
        Some(String::from(obj.to_string()))
    }

    pub fn public_key() -> Option<Pubkey> {
        let provider = provider().ok()?;
        let key = get_prop(&provider, "publicKey").ok()?;
        js_text(&key)?.parse().ok()
    }

    pub fn is_connected() -> bool {
        provider()
            .ok()
            .and_then(|p| get_prop(&p, "isConnected").ok())
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn signature_prop(result: &JsValue, key: &str) -> Result<TxSignature, PortError> {
        signature_value(&get_prop(result, key)?)
    }

    pub fn signature_value(value: &JsValue) -> Result<TxSignature, PortError> {
        if value.is_instance_of::<js_sys::Uint8Array>() {
            let bytes = js_sys::Uint8Array::new(value).to_vec();
            return TxSignature::from_slice(&bytes).ok_or_else(|| {
                PortError::Validation(format!("signature must be 64 bytes, got {}", bytes.len()))
            });
        }
        let text = value
            .as_string()
            .ok_or_else(|| PortError::Transport("signature must be base58 or bytes".to_owned()))?;
        text.parse().map_err(PortError::Validation)
    }

    pub fn request_error(err: JsValue) -> PortError {
        let code = get_prop(&err, "code").ok().and_then(|v| v.as_f64());
        let message = get_prop(&err, "message")
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_else(|| format!("{err:?}"));
        match code {
            Some(c) if c == USER_REJECTED_CODE => PortError::Rejected(message),
            Some(c) => PortError::Rpc {
                code: c as i64,
                message,
            },
            None => PortError::Transport(format!("provider request rejected: {message}")),
        }
    }
}
