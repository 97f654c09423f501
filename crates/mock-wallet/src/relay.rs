//! In-memory store-and-forward relay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use messaging_core::{IdentityKey, MessagingError, TokenEnvelope};
use rand_core::{OsRng, RngCore};
use tracing::debug;
use uuid::Uuid;

/// A token in flight: everything the recipient needs to basket the output.
#[derive(Debug, Clone)]
pub struct TokenTransfer {
    pub txid: String,
    pub vout: u32,
    pub satoshis: u64,
    /// Locking script, hex encoded.
    pub locking_script: String,
    pub envelope: TokenEnvelope,
}

/// One message waiting in a relay inbox.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub message_id: String,
    pub sender: IdentityKey,
    pub recipient: IdentityKey,
    pub message_box: String,
    pub transfer: TokenTransfer,
    pub queued_at: DateTime<Utc>,
}

/// Shared store-and-forward queues, one per (recipient, message box) pair.
///
/// Every wallet attached to the same hub shares the hub's root key, so a
/// payload sealed by one wallet can be opened by its counterparty. Clones
/// share the underlying queues.
#[derive(Clone)]
pub struct RelayHub {
    queues: Arc<Mutex<HashMap<(IdentityKey, String), Vec<QueuedMessage>>>>,
    root_key: [u8; 32],
}

impl RelayHub {
    /// Hub with a fresh random root key.
    pub fn new() -> Self {
        let mut root_key = [0u8; 32];
        OsRng.fill_bytes(&mut root_key);
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            root_key,
        }
    }

    /// The root key every attached wallet derives its subkeys from.
    pub fn root_key(&self) -> [u8; 32] {
        self.root_key
    }

    /// Queue a message for its recipient. Returns the message id.
    pub fn post(&self, message: QueuedMessage) -> Result<String, MessagingError> {
        let message_id = message.message_id.clone();
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| MessagingError::MutexPoisoned)?;
        debug!(
            recipient = %message.recipient,
            message_box = %message.message_box,
            message_id = %message_id,
            "queued relay message"
        );
        queues
            .entry((message.recipient.clone(), message.message_box.clone()))
            .or_default()
            .push(message);
        Ok(message_id)
    }

    /// Remove and return everything queued for one inbox, oldest first.
    pub fn drain(
        &self,
        recipient: &IdentityKey,
        message_box: &str,
    ) -> Result<Vec<QueuedMessage>, MessagingError> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| MessagingError::MutexPoisoned)?;
        Ok(queues
            .remove(&(recipient.clone(), message_box.to_string()))
            .unwrap_or_default())
    }

    /// Messages currently waiting in one inbox, without removing them.
    pub fn pending(
        &self,
        recipient: &IdentityKey,
        message_box: &str,
    ) -> Result<Vec<QueuedMessage>, MessagingError> {
        let queues = self
            .queues
            .lock()
            .map_err(|_| MessagingError::MutexPoisoned)?;
        Ok(queues
            .get(&(recipient.clone(), message_box.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh relay message id.
pub(crate) fn next_message_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_for(recipient: &str, message_box: &str) -> QueuedMessage {
        QueuedMessage {
            message_id: next_message_id(),
            sender: IdentityKey::new("02aa"),
            recipient: IdentityKey::new(recipient),
            message_box: message_box.to_string(),
            transfer: TokenTransfer {
                txid: "00".repeat(32),
                vout: 0,
                satoshis: 1,
                locking_script: "ac".to_string(),
                envelope: TokenEnvelope {
                    raw_tx: "beef".to_string(),
                    inputs: None,
                    proof: None,
                },
            },
            queued_at: Utc::now(),
        }
    }

    #[test]
    fn drain_empties_only_the_requested_inbox() {
        let hub = RelayHub::new();
        hub.post(message_for("03bb", "email_inbox")).unwrap();
        hub.post(message_for("03bb", "email_inbox")).unwrap();
        hub.post(message_for("04cc", "email_inbox")).unwrap();

        let bob = IdentityKey::new("03bb");
        let carol = IdentityKey::new("04cc");
        assert_eq!(hub.pending(&bob, "email_inbox").unwrap().len(), 2);
        assert_eq!(hub.drain(&bob, "email_inbox").unwrap().len(), 2);
        assert!(hub.drain(&bob, "email_inbox").unwrap().is_empty());
        assert_eq!(hub.pending(&carol, "email_inbox").unwrap().len(), 1);
    }

    #[test]
    fn inboxes_are_keyed_by_message_box() {
        let hub = RelayHub::new();
        hub.post(message_for("03bb", "email_inbox")).unwrap();
        hub.post(message_for("03bb", "other_box")).unwrap();

        let bob = IdentityKey::new("03bb");
        assert_eq!(hub.drain(&bob, "email_inbox").unwrap().len(), 1);
        assert_eq!(hub.drain(&bob, "other_box").unwrap().len(), 1);
    }

    #[test]
    fn clones_share_queues_and_root_key() {
        let hub = RelayHub::new();
        let clone = hub.clone();
        assert_eq!(hub.root_key(), clone.root_key());

        hub.post(message_for("03bb", "email_inbox")).unwrap();
        let bob = IdentityKey::new("03bb");
        assert_eq!(clone.pending(&bob, "email_inbox").unwrap().len(), 1);
    }
}
