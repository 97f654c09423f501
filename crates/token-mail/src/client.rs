//! The email client: send, check, read, and delete.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use messaging_core::{
    CarrierCodec, Counterparty, IncomingToken, KeyScope, LedgerOutput, MessagingConfig,
    MessagingError, OutgoingToken, OutputLedger, OutputQuery, PayloadCipher, ScriptCodec,
    SendReceipt, SpendableToken, TokenMessenger, TokenPayload,
};
use tracing::{debug, info, warn};

use crate::config::{EmailConfig, TAG_OUTGOING};
use crate::error::EmailError;
use crate::types::{
    CustomInstructions, DecryptedEmail, EmailMessage, EmailPayload, EmailRecord, UnreadableEmail,
    UNREADABLE_NOTE,
};

/// Client for email carried as encrypted tokens.
///
/// Composed over a [`TokenMessenger`] for relay traffic and the token
/// lifecycle, an [`OutputLedger`] for basket queries, and a
/// [`PayloadCipher`] for opening sealed payloads. The email protocol
/// constants are fixed at construction; callers only ever see
/// [`EmailMessage`] and [`EmailRecord`].
pub struct EmailClient<M: TokenMessenger> {
    messenger: M,
    ledger: Arc<dyn OutputLedger>,
    cipher: Arc<dyn PayloadCipher>,
    codec: Arc<dyn ScriptCodec>,
    config: MessagingConfig,
}

impl<M: TokenMessenger> EmailClient<M> {
    /// Create a client over the given collaborators.
    pub fn new(
        config: EmailConfig,
        messenger: M,
        ledger: Arc<dyn OutputLedger>,
        cipher: Arc<dyn PayloadCipher>,
    ) -> Self {
        Self {
            messenger,
            ledger,
            cipher,
            codec: Arc::new(CarrierCodec),
            config: config.messaging(),
        }
    }

    /// Replace the script codec. Defaults to [`CarrierCodec`].
    pub fn with_codec(mut self, codec: Arc<dyn ScriptCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// The resolved messaging configuration.
    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    /// The messenger this client sends through.
    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Queue an email for delivery to its recipient.
    ///
    /// The payload is stamped with the current time, sealed for the
    /// recipient, and queued at the relay. The sender's own copy of the
    /// token lands in the email basket tagged [`TAG_OUTGOING`]. Transport
    /// failures propagate; nothing is retried or queued locally.
    pub async fn send_email(&self, message: EmailMessage) -> Result<SendReceipt, EmailError> {
        if message.recipient.is_empty() {
            return Err(EmailError::MissingRecipient);
        }

        let payload = EmailPayload {
            subject: message.subject,
            body: message.body,
            date_sent: Utc::now(),
        };
        let token = OutgoingToken::new(
            message.recipient,
            self.config.message_box.clone(),
            serde_json::to_value(&payload)?,
        );

        let receipt = self
            .messenger
            .send_token(token, &[TAG_OUTGOING.to_string()])
            .await?;
        info!(message_id = %receipt.message_id, txid = %receipt.txid, "email queued for delivery");
        Ok(receipt)
    }

    /// Fetch pending emails from the relay into the local basket.
    ///
    /// Returns the tokens accepted by this call; an empty list means
    /// nothing was waiting. The emails themselves are listed with
    /// [`read_email`](Self::read_email).
    pub async fn check_email(&self) -> Result<Vec<IncomingToken>, EmailError> {
        let tokens = self.messenger.receive_tokens().await?;
        debug!(count = tokens.len(), "checked relay inbox");
        Ok(tokens)
    }

    /// List the emails in the basket, newest first.
    ///
    /// With `outgoing` set, only sent email (tagged [`TAG_OUTGOING`]) is
    /// returned; otherwise every spendable email token is listed. Each
    /// output is opened independently; one that cannot be opened degrades
    /// to [`EmailRecord::Unreadable`] instead of failing the listing.
    pub async fn read_email(&self, outgoing: bool) -> Result<Vec<EmailRecord>, EmailError> {
        let mut query = OutputQuery::new(&self.config.basket)
            .spendable_only()
            .include_envelope();
        if outgoing {
            query = query.with_tag(TAG_OUTGOING);
        }

        let outputs = self.ledger.list_outputs(&query).await?;
        let mut records =
            join_all(outputs.into_iter().map(|output| self.open_output(output))).await;
        // The ledger lists oldest first.
        records.reverse();
        Ok(records)
    }

    /// Delete an email by spending or unbasketing its token.
    ///
    /// Tokens locked to this wallet are redeemed. The sender's copy of an
    /// outgoing email is locked to the recipient and cannot be spent here,
    /// so it is unbasketed instead. Every other failure is returned to the
    /// caller, never swallowed.
    pub async fn delete_email(&self, token: &SpendableToken) -> Result<(), EmailError> {
        match self.messenger.redeem_token(token).await {
            Ok(()) => {
                debug!(txid = %token.txid, vout = token.output_index, "email token redeemed");
                Ok(())
            }
            Err(MessagingError::NotTokenOwner { .. }) => {
                debug!(
                    txid = %token.txid,
                    vout = token.output_index,
                    "token not ours to spend, unbasketing"
                );
                self.ledger
                    .unbasket_output(&token.txid, token.output_index, &self.config.basket)
                    .await
                    .map_err(EmailError::from)
            }
            Err(err) => {
                warn!(
                    txid = %token.txid,
                    vout = token.output_index,
                    error = %err,
                    "failed to delete email"
                );
                Err(err.into())
            }
        }
    }

    /// Open one output, degrading any failure into an unreadable record.
    async fn open_output(&self, output: LedgerOutput) -> EmailRecord {
        match self.try_open(&output).await {
            Ok(email) => EmailRecord::Email(email),
            Err(err) => {
                warn!(
                    txid = %output.txid,
                    vout = output.vout,
                    error = %err,
                    "unable to open email token"
                );
                EmailRecord::Unreadable(UnreadableEmail {
                    output,
                    note: UNREADABLE_NOTE.to_string(),
                })
            }
        }
    }

    async fn try_open(&self, output: &LedgerOutput) -> Result<DecryptedEmail, EmailError> {
        let token = SpendableToken {
            envelope: output.envelope.clone(),
            locking_script: output.output_script.clone(),
            txid: output.txid.clone(),
            output_index: output.vout,
            satoshis: output.amount,
            custom_instructions: output.custom_instructions.clone(),
        };

        // Custom instructions name the counterparty the payload was sealed
        // for; without them the token was re-sealed to this wallet alone.
        let counterparty = match &output.custom_instructions {
            Some(raw) => {
                let instructions: CustomInstructions = serde_json::from_str(raw)
                    .map_err(|e| EmailError::MalformedPayload(format!("custom instructions: {e}")))?;
                Counterparty::Identity(instructions.recipient)
            }
            None => Counterparty::SelfKey,
        };

        let script = hex::decode(&output.output_script)?;
        let decoded = self.codec.decode(&script)?;
        let ciphertext = decoded.field(1)?;

        let scope = KeyScope::new(
            self.config.protocol_id.clone(),
            self.config.key_id,
            counterparty,
        );
        let plaintext = self.cipher.decrypt(ciphertext, &scope).await?;

        let sealed: TokenPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| EmailError::MalformedPayload(format!("token payload: {e}")))?;
        let payload: EmailPayload = serde_json::from_value(sealed.body)
            .map_err(|e| EmailError::MalformedPayload(format!("email body: {e}")))?;

        Ok(DecryptedEmail {
            token,
            subject: payload.subject,
            body: payload.body,
            date_sent: payload.date_sent,
        })
    }
}

impl<M: TokenMessenger> fmt::Debug for EmailClient<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailClient")
            .field("config", &self.config)
            .finish()
    }
}
