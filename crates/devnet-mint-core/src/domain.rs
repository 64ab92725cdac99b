use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use solana_program::hash::Hash;
use solana_program::message::Message;
use solana_program::native_token::LAMPORTS_PER_SOL;
use solana_program::pubkey;
use solana_program::pubkey::Pubkey;
#[allow(deprecated)]
use solana_program::system_instruction;

/// Fixed destination of every demo transfer.
pub const TRANSFER_RECIPIENT: Pubkey = pubkey!("ETe7iiFy9JAucFifCnkEywG629YvmcQUeJrD6kHGn6SB");

/// One SOL, expressed in lamports.
pub const TRANSFER_LAMPORTS: u64 = LAMPORTS_PER_SOL;

pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    pub only_if_trusted: bool,
}

impl ConnectOptions {
    pub fn trusted_only() -> Self {
        Self {
            only_if_trusted: true,
        }
    }

    pub fn prompt() -> Self {
        Self {
            only_if_trusted: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    #[serde(serialize_with = "serialize_base58")]
    pub public_key: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayEncoding {
    #[default]
    Utf8,
    Hex,
}

impl DisplayEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayEncoding::Utf8 => "utf8",
            DisplayEncoding::Hex => "hex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level: {other}")),
        }
    }
}

/// Ed25519 signature as returned by the wallet. The first signature of a
/// transaction doubles as its id on the network.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxSignature(pub [u8; SIGNATURE_LEN]);

impl TxSignature {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; SIGNATURE_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

impl fmt::Display for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxSignature({self})")
    }
}

impl FromStr for TxSignature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| format!("invalid base58 signature: {e}"))?;
        Self::from_slice(&bytes)
            .ok_or_else(|| format!("signature must be {SIGNATURE_LEN} bytes, got {}", bytes.len()))
    }
}

/// Unsigned transfer built fresh for every submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub lamports: u64,
    pub fee_payer: Pubkey,
    pub recent_blockhash: Hash,
}

impl PendingTransaction {
    /// Demo transfer of [`TRANSFER_LAMPORTS`] to [`TRANSFER_RECIPIENT`], paid by the sender.
    pub fn transfer(sender: Pubkey, recent_blockhash: Hash) -> Self {
        Self {
            sender,
            recipient: TRANSFER_RECIPIENT,
            lamports: TRANSFER_LAMPORTS,
            fee_payer: sender,
            recent_blockhash,
        }
    }

    #[allow(deprecated)]
    pub fn message(&self) -> Message {
        let ix = system_instruction::transfer(&self.sender, &self.recipient, self.lamports);
        let mut message = Message::new(&[ix], Some(&self.fee_payer));
        message.recent_blockhash = self.recent_blockhash;
        message
    }

    /// Bytes the wallet signs.
    pub fn message_bytes(&self) -> Vec<u8> {
        self.message().serialize()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub signature: TxSignature,
    pub wire: Vec<u8>,
}

impl SignedTransaction {
    /// Attaches the fee payer's signature. The transfer has a single required
    /// signer, so the compact-u16 signature count is the single byte `1`.
    pub fn from_signature(tx: &PendingTransaction, signature: TxSignature) -> Self {
        let message = tx.message_bytes();
        let mut wire = Vec::with_capacity(1 + SIGNATURE_LEN + message.len());
        wire.push(1);
        wire.extend_from_slice(signature.as_bytes());
        wire.extend_from_slice(&message);
        Self { signature, wire }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSignature {
    pub signature: TxSignature,
    pub public_key: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub signature: TxSignature,
    pub slot: u64,
    pub commitment: Commitment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    Connect,
    Disconnect,
}

impl ProviderEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderEventKind::Connect => "connect",
            ProviderEventKind::Disconnect => "disconnect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
    pub public_key: Option<Pubkey>,
}

/// One rendered line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntry(pub String);

impl LogEntry {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LogEntry {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LogEntry {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

fn serialize_base58<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&key.to_string())
}
