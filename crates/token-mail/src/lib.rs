//! Email over tokenized messaging.
//!
//! Each email travels as an encrypted, spendable ledger output relayed
//! through a store-and-forward inbox. Sending seals the email for its
//! recipient and queues the token; checking pulls queued tokens into the
//! local basket; reading opens basketed tokens without consuming them;
//! deleting spends (or unbaskets) the token, which is what removal means
//! for tokenized mail.
//!
//! - [`EmailClient::send_email`] - seal and queue an email
//! - [`EmailClient::check_email`] - fetch pending tokens into the basket
//! - [`EmailClient::read_email`] - list basketed email, newest first
//! - [`EmailClient::delete_email`] - spend or unbasket one token
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use mock_wallet::{MemoryWallet, RelayHub};
//! use token_mail::{EmailClient, EmailConfig, EmailMessage};
//!
//! let hub = RelayHub::new();
//! let config = EmailConfig::default();
//! let wallet = MemoryWallet::new("02aabb".into(), hub, config.messaging());
//! let client = EmailClient::new(
//!     config,
//!     wallet.clone(),
//!     Arc::new(wallet.ledger()),
//!     wallet.cipher(),
//! );
//!
//! client
//!     .send_email(EmailMessage::new("03ccdd", "Hi", "Hello over tokens!"))
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::EmailClient;
pub use config::{
    EmailConfig, DEFAULT_RELAY_URL, EMAIL_BASKET, EMAIL_KEY_ID, EMAIL_MESSAGE_BOX,
    EMAIL_PROTOCOL_ADDRESS, EMAIL_PROTOCOL_ID, EMAIL_TOKEN_VALUE, TAG_OUTGOING,
};
pub use error::EmailError;
pub use types::{
    CustomInstructions, DecryptedEmail, EmailMessage, EmailPayload, EmailRecord, UnreadableEmail,
    UNREADABLE_NOTE,
};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #[test]
    fn version_is_set() {
        assert!(!super::version().is_empty());
    }
}
