//! Error types for the messaging layer.

use thiserror::Error;

use crate::cipher::CipherError;
use crate::script::ScriptError;

/// Errors surfaced by messengers, ledgers, and the codecs beneath them.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The relay could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The relay answered with an application-level failure.
    #[error("relay rejected request: {0}")]
    Relay(String),

    /// Transport authentication failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A counterparty identity key was empty or malformed.
    #[error("invalid identity key: {0}")]
    InvalidIdentity(String),

    /// The referenced output is not in the ledger.
    #[error("unknown token {txid}:{vout}")]
    UnknownToken { txid: String, vout: u32 },

    /// The output exists but is not locked to this wallet's key.
    #[error("not the owner of token {txid}:{vout}")]
    NotTokenOwner { txid: String, vout: u32 },

    /// The output was already spent.
    #[error("token {txid}:{vout} is already spent")]
    TokenSpent { txid: String, vout: u32 },

    /// Ledger-side failure outside the token lifecycle.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding failed.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// A carrier script could not be encoded or decoded.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// Payload encryption or decryption failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// A shared lock was poisoned by a panicking holder.
    #[error("mutex poisoned")]
    MutexPoisoned,
}
