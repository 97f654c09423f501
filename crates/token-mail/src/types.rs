//! Email message and record types.

use chrono::{DateTime, Utc};
use messaging_core::{IdentityKey, LedgerOutput, SpendableToken};
use serde::{Deserialize, Serialize};

/// Note attached to records whose token could not be opened.
pub const UNREADABLE_NOTE: &str = "[error] Unable to decrypt email!";

/// An email to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Public identity key of the recipient.
    pub recipient: IdentityKey,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(
        recipient: impl Into<IdentityKey>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// The email content sealed into a token.
///
/// All three fields are required; parsing a payload without them fails
/// rather than producing a partial email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub subject: String,
    pub body: String,
    pub date_sent: DateTime<Utc>,
}

/// Per-output metadata naming the counterparty that opens the payload.
///
/// Attached to the sender's copy of an outgoing token; received tokens are
/// re-sealed to the wallet itself and carry no instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomInstructions {
    pub recipient: IdentityKey,
}

/// A successfully opened email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedEmail {
    /// The backing token, ready to hand to delete.
    pub token: SpendableToken,
    pub subject: String,
    pub body: String,
    pub date_sent: DateTime<Utc>,
}

/// An output that could not be opened: the raw output plus a fixed note.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadableEmail {
    #[serde(flatten)]
    pub output: LedgerOutput,
    pub note: String,
}

/// One entry of an inbox listing.
///
/// Listings never drop entries: an output that fails to open degrades to
/// [`EmailRecord::Unreadable`] instead of disappearing or failing the
/// whole listing.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EmailRecord {
    Email(DecryptedEmail),
    Unreadable(UnreadableEmail),
}

impl EmailRecord {
    /// The backing token, when the record was opened.
    pub fn token(&self) -> Option<&SpendableToken> {
        match self {
            EmailRecord::Email(email) => Some(&email.token),
            EmailRecord::Unreadable(_) => None,
        }
    }

    /// Whether this record carries readable email content.
    pub fn is_readable(&self) -> bool {
        matches!(self, EmailRecord::Email(_))
    }
}
