#![allow(dead_code)]

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use devnet_mint_core::{
    Commitment, Confirmation, ConnectOptions, ConnectResponse, DisplayEncoding, Hash,
    MessageSignature, NetworkPort, Orchestrator, PendingTransaction, PortError, ProviderEvent,
    ProviderEventKind, ProviderLocator, Pubkey, SignedTransaction, TxSignature,
    WalletProviderPort, SIGNATURE_LEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Succeed,
    Reject,
    Untrusted,
}

#[derive(Debug, Default)]
pub struct WalletCalls {
    pub public_key: Option<Pubkey>,
    pub listeners: Vec<ProviderEventKind>,
    pub events: Vec<ProviderEvent>,
    pub connect_options: Vec<ConnectOptions>,
    pub disconnects: usize,
    pub signed: usize,
    pub batch_sizes: Vec<usize>,
    pub messages: Vec<Vec<u8>>,
    pub connect: Behavior,
    pub sign: Behavior,
    /// Listener kind whose registration fails.
    pub refuse_listener: Option<ProviderEventKind>,
}

/// Scripted wallet that records every call.
#[derive(Debug, Clone, Default)]
pub struct StubWallet {
    pub calls: Arc<Mutex<WalletCalls>>,
}

impl StubWallet {
    pub fn with_key() -> Self {
        let wallet = Self::default();
        wallet.calls.lock().expect("lock").public_key = Some(owner_key());
        wallet
    }

    pub fn set_sign(&self, behavior: Behavior) {
        self.calls.lock().expect("lock").sign = behavior;
    }

    pub fn set_connect(&self, behavior: Behavior) {
        self.calls.lock().expect("lock").connect = behavior;
    }

    pub fn emit(&self, kind: ProviderEventKind) {
        let mut g = self.calls.lock().expect("lock");
        if !g.listeners.contains(&kind) {
            return;
        }
        let sequence = g.events.len() as u64 + 1;
        let public_key = g.public_key;
        g.events.push(ProviderEvent {
            sequence,
            kind,
            public_key,
        });
    }

    fn behavior_error(behavior: Behavior) -> Option<PortError> {
        match behavior {
            Behavior::Succeed => None,
            Behavior::Reject => Some(PortError::Rejected("User rejected the request.".to_owned())),
            Behavior::Untrusted => Some(PortError::Untrusted),
        }
    }
}

#[async_trait(?Send)]
impl WalletProviderPort for StubWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.calls.lock().expect("lock").public_key
    }

    fn is_connected(&self) -> bool {
        self.public_key().is_some()
    }

    fn on(&self, event: ProviderEventKind) -> Result<(), PortError> {
        let mut g = self.calls.lock().expect("lock");
        if g.refuse_listener == Some(event) {
            return Err(PortError::Transport(format!("cannot listen for {}", event.as_str())));
        }
        g.listeners.push(event);
        Ok(())
    }

    fn remove_all_listeners(&self) -> Result<(), PortError> {
        self.calls.lock().expect("lock").listeners.clear();
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError> {
        Ok(std::mem::take(&mut self.calls.lock().expect("lock").events))
    }

    async fn connect(&self, options: ConnectOptions) -> Result<ConnectResponse, PortError> {
        let behavior = {
            let mut g = self.calls.lock().expect("lock");
            g.connect_options.push(options);
            g.connect
        };
        if let Some(err) = Self::behavior_error(behavior) {
            return Err(err);
        }
        let key = owner_key();
        self.calls.lock().expect("lock").public_key = Some(key);
        self.emit(ProviderEventKind::Connect);
        Ok(ConnectResponse { public_key: key })
    }

    async fn disconnect(&self) -> Result<(), PortError> {
        {
            let mut g = self.calls.lock().expect("lock");
            g.disconnects += 1;
            g.public_key = None;
        }
        self.emit(ProviderEventKind::Disconnect);
        Ok(())
    }

    async fn sign_transaction(
        &self,
        tx: &PendingTransaction,
    ) -> Result<SignedTransaction, PortError> {
        let behavior = self.calls.lock().expect("lock").sign;
        if let Some(err) = Self::behavior_error(behavior) {
            return Err(err);
        }
        self.calls.lock().expect("lock").signed += 1;
        Ok(SignedTransaction::from_signature(tx, stub_signature()))
    }

    async fn sign_all_transactions(
        &self,
        txs: &[PendingTransaction],
    ) -> Result<Vec<SignedTransaction>, PortError> {
        let behavior = {
            let mut g = self.calls.lock().expect("lock");
            g.batch_sizes.push(txs.len());
            g.sign
        };
        if let Some(err) = Self::behavior_error(behavior) {
            return Err(err);
        }
        Ok(txs
            .iter()
            .map(|tx| SignedTransaction::from_signature(tx, stub_signature()))
            .collect())
    }

    async fn sign_message(
        &self,
        message: &[u8],
        _display: DisplayEncoding,
    ) -> Result<MessageSignature, PortError> {
        let behavior = {
            let mut g = self.calls.lock().expect("lock");
            g.messages.push(message.to_vec());
            g.sign
        };
        if let Some(err) = Self::behavior_error(behavior) {
            return Err(err);
        }
        Ok(MessageSignature {
            signature: stub_signature(),
            public_key: owner_key(),
        })
    }
}

#[derive(Debug, Default)]
pub struct NetworkCalls {
    pub blockhash_fetches: usize,
    pub submitted: Vec<Vec<u8>>,
    pub confirmed: Vec<TxSignature>,
    pub fail_blockhash: bool,
    pub fail_submit: bool,
}

/// Ledger stub that echoes the wire signature back as the transaction id.
#[derive(Debug, Clone, Default)]
pub struct StubNetwork {
    pub calls: Arc<Mutex<NetworkCalls>>,
}

#[async_trait(?Send)]
impl NetworkPort for StubNetwork {
    async fn latest_blockhash(&self) -> Result<Hash, PortError> {
        let mut g = self.calls.lock().expect("lock");
        if g.fail_blockhash {
            return Err(PortError::Transport("blockhash unavailable".to_owned()));
        }
        g.blockhash_fetches += 1;
        Ok(Hash::new_from_array([g.blockhash_fetches as u8; 32]))
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<TxSignature, PortError> {
        let mut g = self.calls.lock().expect("lock");
        if g.fail_submit {
            return Err(PortError::Rpc {
                code: -32002,
                message: "Transaction simulation failed".to_owned(),
            });
        }
        g.submitted.push(wire.to_vec());
        TxSignature::from_slice(&wire[1..1 + SIGNATURE_LEN])
            .ok_or_else(|| PortError::Validation("short wire".to_owned()))
    }

    async fn confirm_transaction(
        &self,
        signature: &TxSignature,
    ) -> Result<Confirmation, PortError> {
        self.calls.lock().expect("lock").confirmed.push(*signature);
        Ok(Confirmation {
            signature: *signature,
            slot: 42,
            commitment: Commitment::Confirmed,
        })
    }
}

/// Locator that hands out its wallet at most once and counts lookups.
#[derive(Debug, Default)]
pub struct StubLocator {
    pub wallet: Option<StubWallet>,
    pub lookups: Cell<usize>,
}

impl ProviderLocator for StubLocator {
    type Provider = StubWallet;

    fn locate(&self) -> Option<StubWallet> {
        self.lookups.set(self.lookups.get() + 1);
        self.wallet.clone()
    }
}

pub type TestOrchestrator = Orchestrator<StubWallet, StubNetwork>;

pub fn new_orchestrator() -> TestOrchestrator {
    Orchestrator::new(StubWallet::with_key(), StubNetwork::default())
}

pub fn owner_key() -> Pubkey {
    Pubkey::new_from_array([0x11; 32])
}

pub fn stub_signature() -> TxSignature {
    TxSignature([0xAB; SIGNATURE_LEN])
}

pub fn log_lines(orch: &TestOrchestrator) -> Vec<String> {
    orch.state().logs.into_iter().map(|l| l.0).collect()
}
