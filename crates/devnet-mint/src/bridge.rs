//! Bridge between the egui shell and the mint workspace crates.
//! This must remain the only shell-facing boundary for wallet operations.

use std::sync::Arc;

use devnet_mint_adapters::{MintAdapterConfig, PhantomAdapter, PhantomLocator, SolanaRpcAdapter};
use devnet_mint_core::{AppState, Orchestrator, Pubkey, WalletProviderPort};

type MintOrchestrator = Orchestrator<PhantomAdapter, SolanaRpcAdapter>;

/// Default text for the message signing prompt.
pub const DEFAULT_SIGN_MESSAGE: &str =
    "To avoid digital dognappers, sign below to authenticate with CryptoCorgis.";

/// A user or lifecycle action, run off the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintAction {
    Mount,
    Connect,
    Disconnect,
    Mint,
    SignBatch { only_first: bool },
    SignMessage(String),
    Teardown,
}

impl MintAction {
    pub fn label(&self) -> &'static str {
        match self {
            MintAction::Mount => "mount",
            MintAction::Connect => "connect",
            MintAction::Disconnect => "disconnect",
            MintAction::Mint => "mint",
            MintAction::SignBatch { only_first: true } => "sign_first",
            MintAction::SignBatch { only_first: false } => "sign_batch",
            MintAction::SignMessage(_) => "sign_message",
            MintAction::Teardown => "teardown",
        }
    }
}

#[derive(Clone)]
pub struct MintBridge {
    orchestrator: Arc<MintOrchestrator>,
}

impl MintBridge {
    /// Locates the wallet once. `None` when no provider is injected.
    pub fn bootstrap(config: &MintAdapterConfig) -> Option<Self> {
        let locator = PhantomLocator::new(config.clone());
        let network = SolanaRpcAdapter::with_config(config.clone());
        devnet_mint_core::bootstrap(&locator, network).map(|orchestrator| Self {
            orchestrator: Arc::new(orchestrator),
        })
    }

    pub fn state(&self) -> AppState {
        self.orchestrator.state()
    }

    pub fn public_key(&self) -> Option<Pubkey> {
        self.orchestrator.provider.public_key()
    }

    pub fn provider_connected(&self) -> bool {
        self.orchestrator.provider.is_connected()
    }

    pub fn poll_events(&self) -> usize {
        self.orchestrator.poll_events()
    }

    pub async fn run(&self, action: MintAction) {
        tracing::debug!(action = action.label(), "running action");
        let orch = &self.orchestrator;
        match action {
            MintAction::Mount => orch.mount().await,
            MintAction::Connect => orch.connect().await,
            MintAction::Disconnect => orch.disconnect().await,
            MintAction::Mint => orch.send_transaction().await,
            MintAction::SignBatch { only_first } => orch.sign_multiple_transactions(only_first).await,
            MintAction::SignMessage(text) => orch.sign_message(&text).await,
            MintAction::Teardown => orch.teardown().await,
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn trusted_bridge() -> MintBridge {
        let config = MintAdapterConfig {
            trusted_origin: true,
            ..MintAdapterConfig::default()
        };
        MintBridge::bootstrap(&config).expect("development wallet")
    }

    #[tokio::test]
    async fn mount_connects_trusted_wallet() {
        let bridge = trusted_bridge();
        assert!(bridge.public_key().is_none());
        bridge.run(MintAction::Mount).await;
        assert_eq!(bridge.poll_events(), 1);
        assert!(bridge.provider_connected());
        assert!(bridge.state().connected);
    }

    #[tokio::test]
    async fn teardown_disconnects_without_logging() {
        let bridge = trusted_bridge();
        bridge.run(MintAction::Mount).await;
        bridge.poll_events();
        bridge.run(MintAction::Teardown).await;
        assert!(!bridge.provider_connected());
        assert_eq!(bridge.poll_events(), 0);
        assert_eq!(bridge.state().logs.len(), 1);
    }

    #[tokio::test]
    async fn sign_message_action_logs_signature() {
        let bridge = trusted_bridge();
        bridge.run(MintAction::Mount).await;
        bridge
            .run(MintAction::SignMessage(DEFAULT_SIGN_MESSAGE.to_owned()))
            .await;
        let logs = bridge.state().logs;
        let last = logs.last().expect("log line");
        assert!(last.as_str().starts_with("Message signed: "));
    }

    #[test]
    fn action_labels_are_distinct() {
        let first = MintAction::SignBatch { only_first: true };
        let both = MintAction::SignBatch { only_first: false };
        assert_ne!(first.label(), both.label());
    }
}
