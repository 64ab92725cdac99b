pub mod domain;
pub mod orchestrator;
pub mod ports;
pub mod state;

pub use domain::{
    Commitment, Confirmation, ConnectOptions, ConnectResponse, DisplayEncoding, LogEntry,
    MessageSignature, PendingTransaction, ProviderEvent, ProviderEventKind, SignedTransaction,
    TxSignature, SIGNATURE_LEN, TRANSFER_LAMPORTS, TRANSFER_RECIPIENT,
};
pub use orchestrator::{bootstrap, Orchestrator};
pub use ports::{NetworkPort, PortError, ProviderLocator, WalletProviderPort};
pub use state::{reduce, AppAction, AppState, StateStore};

pub use solana_program::hash::Hash;
pub use solana_program::pubkey::Pubkey;
