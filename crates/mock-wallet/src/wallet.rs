//! In-memory token messenger.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use messaging_core::{
    CarrierCodec, Counterparty, IdentityKey, IncomingToken, KeyScope, LedgerOutput,
    MessagingConfig, MessagingError, OutgoingToken, PayloadCipher, ScriptCodec, SecretBoxCipher,
    SendReceipt, SpendableToken, TokenEnvelope, TokenMessenger, TokenPayload,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::ledger::{MemoryLedger, StoredOutput};
use crate::relay::{next_message_id, QueuedMessage, RelayHub, TokenTransfer};

/// A complete in-memory wallet for one identity: messenger, ledger, and
/// cipher in one place.
///
/// Wallets attached to the same [`RelayHub`] can message each other without
/// anything leaving the process. Clones share the underlying state.
#[derive(Clone)]
pub struct MemoryWallet {
    identity: IdentityKey,
    hub: RelayHub,
    ledger: MemoryLedger,
    cipher: Arc<SecretBoxCipher>,
    codec: Arc<dyn ScriptCodec>,
    config: MessagingConfig,
}

impl MemoryWallet {
    /// Attach a wallet for `identity` to a hub.
    pub fn new(identity: IdentityKey, hub: RelayHub, config: MessagingConfig) -> Self {
        let cipher = Arc::new(SecretBoxCipher::new(identity.clone(), hub.root_key()));
        Self {
            identity,
            hub,
            ledger: MemoryLedger::new(),
            cipher,
            codec: Arc::new(CarrierCodec),
            config,
        }
    }

    pub fn identity(&self) -> &IdentityKey {
        &self.identity
    }

    /// The wallet's output ledger, for wiring into clients.
    pub fn ledger(&self) -> MemoryLedger {
        self.ledger.clone()
    }

    /// The wallet's payload cipher, for wiring into clients.
    pub fn cipher(&self) -> Arc<SecretBoxCipher> {
        self.cipher.clone()
    }

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    fn scope(&self, counterparty: Counterparty) -> KeyScope {
        KeyScope::new(&self.config.protocol_id, self.config.key_id, counterparty)
    }

    fn fabricate_txid(&self, seed: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.identity.as_str().as_bytes());
        hasher.update(seed);
        hex::encode(hasher.finalize())
    }

    fn carrier_script(
        &self,
        lock_key: &IdentityKey,
        ciphertext: &[u8],
    ) -> Result<String, MessagingError> {
        let fields = vec![
            self.config.protocol_address.as_bytes().to_vec(),
            ciphertext.to_vec(),
        ];
        let script = self.codec.encode(lock_key.as_str().as_bytes(), &fields)?;
        Ok(hex::encode(script))
    }

    fn mock_envelope(
        &self,
        script_hex: &str,
        satoshis: u64,
    ) -> Result<TokenEnvelope, MessagingError> {
        let raw_tx = hex::encode(serde_json::to_vec(&serde_json::json!({
            "outputs": [{ "script": script_hex, "satoshis": satoshis }]
        }))?);
        Ok(TokenEnvelope {
            raw_tx,
            inputs: None,
            proof: None,
        })
    }
}

#[async_trait]
impl TokenMessenger for MemoryWallet {
    async fn send_token(
        &self,
        token: OutgoingToken,
        tags: &[String],
    ) -> Result<SendReceipt, MessagingError> {
        let payload = TokenPayload::from(&token);
        let plaintext = serde_json::to_vec(&payload)?;
        let scope = self.scope(Counterparty::Identity(token.recipient.clone()));
        let ciphertext = self.cipher.encrypt(&plaintext, &scope).await?;
        let script_hex = self.carrier_script(&token.recipient, &ciphertext)?;

        let message_id = next_message_id();
        let txid = self.fabricate_txid(message_id.as_bytes());
        let envelope = self.mock_envelope(&script_hex, self.config.token_value)?;

        self.hub.post(QueuedMessage {
            message_id: message_id.clone(),
            sender: self.identity.clone(),
            recipient: token.recipient.clone(),
            message_box: token.message_box.clone(),
            transfer: TokenTransfer {
                txid: txid.clone(),
                vout: 0,
                satoshis: self.config.token_value,
                locking_script: script_hex.clone(),
                envelope: envelope.clone(),
            },
            queued_at: Utc::now(),
        })?;

        // The sender keeps a copy of the output, tagged and annotated with
        // the recipient so later reads know which counterparty opens it.
        // The output itself is locked to the recipient, not to this wallet.
        let custom_instructions =
            serde_json::json!({ "recipient": token.recipient }).to_string();
        self.ledger.insert(StoredOutput {
            basket: self.config.basket.clone(),
            tags: tags.to_vec(),
            spendable: true,
            owned: false,
            output: LedgerOutput {
                envelope: Some(envelope),
                output_script: script_hex,
                txid: txid.clone(),
                vout: 0,
                amount: self.config.token_value,
                custom_instructions: Some(custom_instructions),
            },
        })?;

        info!(recipient = %token.recipient, txid = %txid, "queued token for delivery");
        Ok(SendReceipt { message_id, txid })
    }

    async fn receive_tokens(&self) -> Result<Vec<IncomingToken>, MessagingError> {
        let queued = self.hub.drain(&self.identity, &self.config.message_box)?;
        let mut received = Vec::with_capacity(queued.len());
        for message in queued {
            // Open the transport seal (pair scope with the sender) and
            // re-seal to the self scope, so later reads need no knowledge
            // of who sent the token.
            let script = hex::decode(&message.transfer.locking_script)?;
            let decoded = self.codec.decode(&script)?;
            let ciphertext = decoded.field(1)?;

            let pair_scope = self.scope(Counterparty::Identity(message.sender.clone()));
            let plaintext = self.cipher.decrypt(ciphertext, &pair_scope).await?;
            let self_scope = self.scope(Counterparty::SelfKey);
            let resealed = self.cipher.encrypt(&plaintext, &self_scope).await?;

            let script_hex = self.carrier_script(&self.identity, &resealed)?;
            let envelope = self.mock_envelope(&script_hex, message.transfer.satoshis)?;
            self.ledger.insert(StoredOutput {
                basket: self.config.basket.clone(),
                tags: Vec::new(),
                spendable: true,
                owned: true,
                output: LedgerOutput {
                    envelope: Some(envelope),
                    output_script: script_hex,
                    txid: message.transfer.txid.clone(),
                    vout: message.transfer.vout,
                    amount: message.transfer.satoshis,
                    custom_instructions: None,
                },
            })?;

            debug!(
                sender = %message.sender,
                txid = %message.transfer.txid,
                "accepted incoming token"
            );
            received.push(IncomingToken {
                message_id: message.message_id,
                sender: message.sender,
                message_box: message.message_box,
                txid: message.transfer.txid,
                vout: message.transfer.vout,
                amount: message.transfer.satoshis,
            });
        }
        Ok(received)
    }

    async fn redeem_token(&self, token: &SpendableToken) -> Result<(), MessagingError> {
        match self.ledger.ownership(&token.txid, token.output_index)? {
            None => Err(MessagingError::UnknownToken {
                txid: token.txid.clone(),
                vout: token.output_index,
            }),
            Some(false) => Err(MessagingError::NotTokenOwner {
                txid: token.txid.clone(),
                vout: token.output_index,
            }),
            Some(true) => {
                if self.ledger.mark_spent(&token.txid, token.output_index)? {
                    debug!(txid = %token.txid, vout = token.output_index, "redeemed token");
                    Ok(())
                } else {
                    Err(MessagingError::TokenSpent {
                        txid: token.txid.clone(),
                        vout: token.output_index,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging_core::{OutputLedger, OutputQuery};

    fn test_config() -> MessagingConfig {
        MessagingConfig {
            relay_url: "http://localhost:0".to_string(),
            client_private_key: None,
            token_value: 1,
            protocol_id: "email".to_string(),
            key_id: 1,
            basket: "email".to_string(),
            message_box: "email_inbox".to_string(),
            protocol_address: "1XKdoVfVTrtNu243T44sNFVEpeTmeYitK".to_string(),
        }
    }

    fn outgoing(recipient: &str) -> OutgoingToken {
        OutgoingToken::new(
            recipient,
            "email_inbox",
            serde_json::json!({"subject": "hi", "body": "there", "dateSent": "2026-01-01T00:00:00Z"}),
        )
    }

    fn spendable(token: &IncomingToken) -> SpendableToken {
        SpendableToken {
            envelope: None,
            locking_script: String::new(),
            txid: token.txid.clone(),
            output_index: token.vout,
            satoshis: token.amount,
            custom_instructions: None,
        }
    }

    #[tokio::test]
    async fn send_queues_and_baskets_a_tagged_copy() {
        let hub = RelayHub::new();
        let alice = MemoryWallet::new(IdentityKey::new("02aa"), hub.clone(), test_config());

        let receipt = alice
            .send_token(outgoing("03bb"), &["email_outgoing".to_string()])
            .await
            .unwrap();
        assert!(!receipt.txid.is_empty());

        let bob_key = IdentityKey::new("03bb");
        let queued = hub.pending(&bob_key, "email_inbox").unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].sender, IdentityKey::new("02aa"));

        let copies = alice
            .ledger()
            .list_outputs(
                &OutputQuery::new("email")
                    .spendable_only()
                    .with_tag("email_outgoing"),
            )
            .await
            .unwrap();
        assert_eq!(copies.len(), 1);
        let instructions = copies[0].custom_instructions.as_deref().unwrap();
        assert!(instructions.contains("03bb"));
    }

    #[tokio::test]
    async fn receive_baskets_owned_tokens_and_acks_the_relay() {
        let hub = RelayHub::new();
        let alice = MemoryWallet::new(IdentityKey::new("02aa"), hub.clone(), test_config());
        let bob = MemoryWallet::new(IdentityKey::new("03bb"), hub.clone(), test_config());

        alice.send_token(outgoing("03bb"), &[]).await.unwrap();
        let received = bob.receive_tokens().await.unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].sender, IdentityKey::new("02aa"));

        // Acknowledged: a second receive finds nothing.
        assert!(bob.receive_tokens().await.unwrap().is_empty());

        let basketed = bob
            .ledger()
            .list_outputs(&OutputQuery::new("email").spendable_only())
            .await
            .unwrap();
        assert_eq!(basketed.len(), 1);
        assert!(basketed[0].custom_instructions.is_none());
    }

    #[tokio::test]
    async fn redeem_distinguishes_owner_from_sender() {
        let hub = RelayHub::new();
        let alice = MemoryWallet::new(IdentityKey::new("02aa"), hub.clone(), test_config());
        let bob = MemoryWallet::new(IdentityKey::new("03bb"), hub.clone(), test_config());

        let receipt = alice.send_token(outgoing("03bb"), &[]).await.unwrap();
        let received = bob.receive_tokens().await.unwrap();

        // Bob owns his basketed copy and can spend it.
        bob.redeem_token(&spendable(&received[0])).await.unwrap();

        // Alice's copy is locked to Bob; she cannot spend it.
        let alices_copy = SpendableToken {
            envelope: None,
            locking_script: String::new(),
            txid: receipt.txid,
            output_index: 0,
            satoshis: 1,
            custom_instructions: None,
        };
        assert!(matches!(
            alice.redeem_token(&alices_copy).await,
            Err(MessagingError::NotTokenOwner { .. })
        ));
    }

    #[tokio::test]
    async fn redeem_rejects_unknown_and_spent_tokens() {
        let hub = RelayHub::new();
        let alice = MemoryWallet::new(IdentityKey::new("02aa"), hub.clone(), test_config());
        let bob = MemoryWallet::new(IdentityKey::new("03bb"), hub, test_config());

        alice.send_token(outgoing("03bb"), &[]).await.unwrap();
        let received = bob.receive_tokens().await.unwrap();
        let token = spendable(&received[0]);

        bob.redeem_token(&token).await.unwrap();
        assert!(matches!(
            bob.redeem_token(&token).await,
            Err(MessagingError::TokenSpent { .. })
        ));

        let unknown = SpendableToken {
            txid: "ff".repeat(32),
            ..token
        };
        assert!(matches!(
            bob.redeem_token(&unknown).await,
            Err(MessagingError::UnknownToken { .. })
        ));
    }
}
