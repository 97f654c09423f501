//! Token wire types shared by messengers and the protocols built on them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MessagingError;
use crate::ledger::TokenEnvelope;

/// Public identity key of one messaging participant.
///
/// Keys are opaque strings (compressed public keys in practice); ordering is
/// lexicographic so both ends of an exchange agree on a canonical pair order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wrap a key without validating it.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Parse a key, rejecting empty or non-alphanumeric input.
    pub fn parse(value: &str) -> Result<Self, MessagingError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MessagingError::InvalidIdentity("empty key".to_string()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MessagingError::InvalidIdentity(format!(
                "non-alphanumeric character in {trimmed:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IdentityKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A message handed to a messenger for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingToken {
    /// Identity key the token is locked and sealed to.
    pub recipient: IdentityKey,
    /// Relay inbox the token is queued in.
    pub message_box: String,
    /// Protocol-defined content, sealed verbatim into the token.
    pub body: serde_json::Value,
}

impl OutgoingToken {
    pub fn new(
        recipient: impl Into<IdentityKey>,
        message_box: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            message_box: message_box.into(),
            body,
        }
    }
}

/// The plaintext sealed into a token's carrier script.
///
/// Carries the routing fields alongside the body so an opened token is
/// self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    pub recipient: IdentityKey,
    pub message_box: String,
    pub body: serde_json::Value,
}

impl From<&OutgoingToken> for TokenPayload {
    fn from(token: &OutgoingToken) -> Self {
        Self {
            recipient: token.recipient.clone(),
            message_box: token.message_box.clone(),
            body: token.body.clone(),
        }
    }
}

/// Acknowledgment returned once the relay has accepted a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    /// Relay-assigned id of the queued message.
    pub message_id: String,
    /// Transaction carrying the token output.
    pub txid: String,
}

/// A token fetched from the relay and basketed locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingToken {
    pub message_id: String,
    pub sender: IdentityKey,
    pub message_box: String,
    pub txid: String,
    pub vout: u32,
    /// Face value in satoshis.
    pub amount: u64,
}

/// A basketed token assembled from a ledger output, ready to redeem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendableToken {
    /// SPV envelope for the carrying transaction, when the ledger returned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<TokenEnvelope>,
    /// Locking script, hex encoded.
    pub locking_script: String,
    pub txid: String,
    pub output_index: u32,
    pub satoshis: u64,
    /// Raw JSON metadata attached when the output was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_alphanumeric_keys() {
        let key = IdentityKey::parse("  02aabbccdd  ").unwrap();
        assert_eq!(key.as_str(), "02aabbccdd");
    }

    #[test]
    fn parse_rejects_empty_and_symbols() {
        assert!(IdentityKey::parse("").is_err());
        assert!(IdentityKey::parse("   ").is_err());
        assert!(IdentityKey::parse("02aa:bb").is_err());
    }

    #[test]
    fn identity_keys_order_lexicographically() {
        let low = IdentityKey::new("02aa");
        let high = IdentityKey::new("03bb");
        assert!(low < high);
    }

    #[test]
    fn token_payload_uses_camel_case_keys() {
        let token = OutgoingToken::new("03bb", "email_inbox", serde_json::json!({"n": 1}));
        let payload = TokenPayload::from(&token);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["recipient"], "03bb");
        assert_eq!(json["messageBox"], "email_inbox");
        assert_eq!(json["body"]["n"], 1);
    }

    #[test]
    fn spendable_token_omits_absent_fields() {
        let token = SpendableToken {
            envelope: None,
            locking_script: "ac".to_string(),
            txid: "00".repeat(32),
            output_index: 0,
            satoshis: 1,
            custom_instructions: None,
        };
        let json = serde_json::to_value(&token).unwrap();
        assert!(json.get("envelope").is_none());
        assert!(json.get("customInstructions").is_none());
        assert_eq!(json["outputIndex"], 0);
    }
}
