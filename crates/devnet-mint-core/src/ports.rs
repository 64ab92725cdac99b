use async_trait::async_trait;
use solana_program::hash::Hash;
use solana_program::pubkey::Pubkey;
use thiserror::Error;

use crate::domain::{
    Confirmation, ConnectOptions, ConnectResponse, DisplayEncoding, MessageSignature,
    PendingTransaction, ProviderEvent, ProviderEventKind, SignedTransaction, TxSignature,
};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("request rejected by wallet: {0}")]
    Rejected(String),
    #[error("origin is not trusted by the wallet")]
    Untrusted,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("timed out: {0}")]
    Timeout(String),
}

/// Injected wallet provider. Notifications are recorded by the adapter for
/// every kind registered with [`WalletProviderPort::on`] and pulled with
/// [`WalletProviderPort::drain_events`].
#[async_trait(?Send)]
pub trait WalletProviderPort {
    fn public_key(&self) -> Option<Pubkey>;
    fn is_connected(&self) -> bool;
    fn on(&self, event: ProviderEventKind) -> Result<(), PortError>;
    fn remove_all_listeners(&self) -> Result<(), PortError>;
    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError>;

    async fn connect(&self, options: ConnectOptions) -> Result<ConnectResponse, PortError>;
    async fn disconnect(&self) -> Result<(), PortError>;
    async fn sign_transaction(
        &self,
        tx: &PendingTransaction,
    ) -> Result<SignedTransaction, PortError>;
    async fn sign_all_transactions(
        &self,
        txs: &[PendingTransaction],
    ) -> Result<Vec<SignedTransaction>, PortError>;
    async fn sign_message(
        &self,
        message: &[u8],
        display: DisplayEncoding,
    ) -> Result<MessageSignature, PortError>;
}

#[async_trait(?Send)]
pub trait NetworkPort {
    async fn latest_blockhash(&self) -> Result<Hash, PortError>;
    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<TxSignature, PortError>;
    async fn confirm_transaction(&self, signature: &TxSignature)
        -> Result<Confirmation, PortError>;
}

/// One-shot lookup of the injected provider, run once per application load.
pub trait ProviderLocator {
    type Provider: WalletProviderPort;

    /// Returns the provider, or `None` after sending the user to the install page.
    fn locate(&self) -> Option<Self::Provider>;
}
