//! The messenger trait: the token lifecycle from send to redeem.

use async_trait::async_trait;

use crate::error::MessagingError;
use crate::token::{IncomingToken, OutgoingToken, SendReceipt, SpendableToken};

/// A client for exchanging tokenized messages through a store-and-forward
/// relay.
///
/// Implementations own token construction, relay transport, and on-chain
/// output management. The trait is object-safe and can be used with
/// `Box<dyn TokenMessenger>`.
#[async_trait]
pub trait TokenMessenger: Send + Sync {
    /// Seal a token for its recipient and queue it at the relay.
    ///
    /// The sender's own copy of the output is basketed under the configured
    /// basket, carrying the given tags.
    async fn send_token(
        &self,
        token: OutgoingToken,
        tags: &[String],
    ) -> Result<SendReceipt, MessagingError>;

    /// Fetch pending messages from the relay inbox, basket each accepted
    /// token locally, and acknowledge them at the relay.
    ///
    /// Returns the tokens accepted by this call; an empty list means the
    /// inbox was empty.
    async fn receive_tokens(&self) -> Result<Vec<IncomingToken>, MessagingError>;

    /// Spend a basketed token, removing it from circulation.
    ///
    /// Fails with [`MessagingError::NotTokenOwner`] when the output is not
    /// locked to this wallet's key.
    async fn redeem_token(&self, token: &SpendableToken) -> Result<(), MessagingError>;
}
