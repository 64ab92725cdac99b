use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{
    ConnectOptions, DisplayEncoding, PendingTransaction, ProviderEvent, ProviderEventKind,
};
use crate::ports::{NetworkPort, PortError, ProviderLocator, WalletProviderPort};
use crate::state::{AppAction, AppState, StateStore};

/// Runs the locator once and wires the session up when a provider exists.
/// `None` means the page shows its "no provider" state and never touches a wallet.
pub fn bootstrap<L, N>(locator: &L, network: N) -> Option<Orchestrator<L::Provider, N>>
where
    L: ProviderLocator,
    N: NetworkPort,
{
    match locator.locate() {
        Some(provider) => Some(Orchestrator::new(provider, network)),
        None => {
            tracing::info!("no wallet provider injected");
            None
        }
    }
}

/// Drives one wallet session. Every user-facing operation catches its own
/// failures and reports them through the activity log.
pub struct Orchestrator<W, N>
where
    W: WalletProviderPort,
    N: NetworkPort,
{
    pub provider: W,
    pub network: N,
    store: StateStore,
    subscribed: AtomicBool,
}

impl<W, N> Orchestrator<W, N>
where
    W: WalletProviderPort,
    N: NetworkPort,
{
    pub fn new(provider: W, network: N) -> Self {
        Self::with_store(provider, network, StateStore::default())
    }

    pub fn with_store(provider: W, network: N, store: StateStore) -> Self {
        Self {
            provider,
            network,
            store,
            subscribed: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.store.snapshot()
    }

    /// Registers the connect/disconnect listeners. Idempotent.
    pub fn subscribe(&self) -> Result<(), PortError> {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let registered = self
            .provider
            .on(ProviderEventKind::Connect)
            .and_then(|()| self.provider.on(ProviderEventKind::Disconnect));
        if let Err(e) = registered {
            // a partial registration must not outlive the failed subscribe
            if let Err(release) = self.provider.remove_all_listeners() {
                tracing::warn!(error = %release, "failed to release partial subscription");
            }
            self.subscribed.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    /// Component mount: subscribe, then try the silent connect.
    pub async fn mount(&self) {
        if let Err(e) = self.subscribe() {
            self.report_error(&e);
            return;
        }
        self.eager_connect().await;
    }

    /// Connect that never prompts: only succeeds for an origin the user
    /// already trusted. An untrusted origin is not a failure.
    pub async fn eager_connect(&self) {
        match self.provider.connect(ConnectOptions::trusted_only()).await {
            Ok(resp) => tracing::info!(public_key = %resp.public_key, "eager connect succeeded"),
            Err(PortError::Untrusted) => tracing::debug!("eager connect skipped: origin not trusted"),
            Err(e) => self.report_error(&e),
        }
    }

    /// Applies queued provider notifications. Returns how many were applied.
    pub fn poll_events(&self) -> usize {
        let events = match self.provider.drain_events() {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "failed to drain provider events");
                return 0;
            }
        };
        let count = events.len();
        for event in events {
            self.apply_event(event);
        }
        count
    }

    fn apply_event(&self, event: ProviderEvent) {
        tracing::debug!(sequence = event.sequence, kind = event.kind.as_str(), "provider event");
        match event.kind {
            ProviderEventKind::Connect => {
                let address = event
                    .public_key
                    .or_else(|| self.provider.public_key())
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "unknown".to_owned());
                self.store.dispatch(AppAction::Connected { address });
            }
            ProviderEventKind::Disconnect => self.store.dispatch(AppAction::Disconnected),
        }
    }

    /// Component teardown: release the subscription and disconnect.
    pub async fn teardown(&self) {
        if self.subscribed.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.provider.remove_all_listeners() {
                tracing::warn!(error = %e, "failed to release provider listeners");
            }
        }
        if let Err(e) = self.provider.disconnect().await {
            tracing::warn!(error = %e, "disconnect during teardown failed");
        }
    }

    /// Explicit "Connect" button; may prompt the user.
    pub async fn connect(&self) {
        match self.provider.connect(ConnectOptions::prompt()).await {
            Ok(resp) => match serde_json::to_string(&resp) {
                Ok(json) => self.store.log(json),
                Err(e) => self.report_error(&PortError::Validation(e.to_string())),
            },
            Err(e) => self.report_error(&e),
        }
    }

    /// Explicit "Disconnect" button. The disconnect notification logs success.
    pub async fn disconnect(&self) {
        if let Err(e) = self.provider.disconnect().await {
            self.report_error(&e);
        }
    }

    /// Builds the demo transfer for the connected key, or `None` without one.
    pub async fn create_transfer_transaction(
        &self,
    ) -> Result<Option<PendingTransaction>, PortError> {
        let Some(sender) = self.provider.public_key() else {
            return Ok(None);
        };
        self.store.log("Getting recent blockhash");
        let blockhash = self.network.latest_blockhash().await?;
        Ok(Some(PendingTransaction::transfer(sender, blockhash)))
    }

    /// Build, sign, submit, confirm.
    pub async fn send_transaction(&self) {
        if let Err(e) = self.try_send_transaction().await {
            self.report_error(&e);
        }
    }

    async fn try_send_transaction(&self) -> Result<(), PortError> {
        let Some(tx) = self.create_transfer_transaction().await? else {
            return Ok(());
        };
        let signed = self.provider.sign_transaction(&tx).await?;
        self.store.log(format!(
            "Got signature, submitting transaction {}",
            signed.signature
        ));
        let id = self.network.send_raw_transaction(&signed.wire).await?;
        self.store
            .log(format!("Submitted transaction {id}, awaiting confirmation"));
        let confirmation = self.network.confirm_transaction(&id).await?;
        tracing::info!(
            signature = %id,
            slot = confirmation.slot,
            commitment = confirmation.commitment.as_str(),
            "transaction confirmed"
        );
        self.store.log(format!("Transaction {id} confirmed"));
        Ok(())
    }

    /// Builds two transfers concurrently and asks the wallet to sign the
    /// first only, or both.
    pub async fn sign_multiple_transactions(&self, only_first: bool) {
        if let Err(e) = self.try_sign_multiple(only_first).await {
            self.report_error(&e);
        }
    }

    async fn try_sign_multiple(&self, only_first: bool) -> Result<(), PortError> {
        let (first, second) = futures::try_join!(
            self.create_transfer_transaction(),
            self.create_transfer_transaction()
        )?;
        let (Some(first), Some(second)) = (first, second) else {
            return Ok(());
        };
        let batch = if only_first {
            vec![first]
        } else {
            vec![first, second]
        };
        let signed = self.provider.sign_all_transactions(&batch).await?;
        let signatures = signed
            .iter()
            .map(|s| s.signature.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.store.log(format!(
            "Signed {} transaction(s): {signatures}",
            signed.len()
        ));
        Ok(())
    }

    pub async fn sign_message(&self, message: &str) {
        match self
            .provider
            .sign_message(message.as_bytes(), DisplayEncoding::Utf8)
            .await
        {
            Ok(sig) => self.store.log(format!("Message signed: {}", sig.signature)),
            Err(e) => self.report_error(&e),
        }
    }

    fn report_error(&self, err: &PortError) {
        tracing::warn!(error = %err, "wallet operation failed");
        self.store.log(format!("Error: {err}"));
    }
}
