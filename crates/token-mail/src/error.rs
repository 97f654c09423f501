//! Error types for the email client.

use messaging_core::{CipherError, MessagingError, ScriptError};
use thiserror::Error;

/// Errors surfaced by [`EmailClient`](crate::EmailClient) operations.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failure in the underlying messaging layer.
    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),

    /// A send was attempted without a recipient.
    #[error("missing recipient")]
    MissingRecipient,

    /// A decrypted payload was missing required fields or unparseable.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A token's carrier script could not be decoded.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// A token payload could not be opened.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding failed.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),
}
