//! Core traits and types for tokenized messaging.
//!
//! A tokenized message travels as an encrypted, spendable ledger output:
//! the sender seals a payload for its recipient, wraps it in a carrier
//! locking script, and queues the output at a store-and-forward relay; the
//! recipient fetches it into a local basket, opens it at leisure, and
//! spends it to delete. This crate defines the contracts that stack is
//! built from:
//!
//! - [`TokenMessenger`] - send, receive, and redeem tokens through a relay
//! - [`OutputLedger`] - query and maintain basketed ledger outputs
//! - [`PayloadCipher`] - seal payloads under a protocol [`KeyScope`]
//! - [`ScriptCodec`] - encode data fields into carrier locking scripts
//!
//! plus the wire types those contracts speak and two concrete pieces every
//! stack needs: [`CarrierCodec`] for the standard push-then-drop script and
//! [`SecretBoxCipher`] for scope-derived symmetric encryption.
//!
//! # Example
//!
//! ```rust
//! use messaging_core::{CarrierCodec, ScriptCodec};
//!
//! let codec = CarrierCodec;
//! let script = codec
//!     .encode(b"02aabb", &[b"protocol-addr".to_vec(), b"ciphertext".to_vec()])
//!     .unwrap();
//! let decoded = codec.decode(&script).unwrap();
//! assert_eq!(decoded.field(1).unwrap(), b"ciphertext");
//! ```

mod cipher;
mod config;
mod error;
mod ledger;
mod messenger;
mod script;
mod token;

pub use cipher::{
    CipherError, Counterparty, KeyScope, NoopCipher, PayloadCipher, SecretBoxCipher,
};
pub use config::MessagingConfig;
pub use error::MessagingError;
pub use ledger::{LedgerOutput, OutputLedger, OutputQuery, TokenEnvelope};
pub use messenger::TokenMessenger;
pub use script::{CarrierCodec, DecodedScript, ScriptCodec, ScriptError};
pub use token::{
    IdentityKey, IncomingToken, OutgoingToken, SendReceipt, SpendableToken, TokenPayload,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
