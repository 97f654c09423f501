//! Email protocol constants and client configuration.

use messaging_core::MessagingConfig;
use secrecy::SecretString;

/// Default relay host, pointed at the staging environment.
pub const DEFAULT_RELAY_URL: &str = "https://staging-peerserv.babbage.systems";

/// Protocol id mixed into every email key derivation.
pub const EMAIL_PROTOCOL_ID: &str = "email";

/// Protocol key id for email.
pub const EMAIL_KEY_ID: u32 = 1;

/// Basket that holds email tokens.
pub const EMAIL_BASKET: &str = "email";

/// Relay inbox email messages are boxed to.
pub const EMAIL_MESSAGE_BOX: &str = "email_inbox";

/// Face value, in satoshis, of each email token.
pub const EMAIL_TOKEN_VALUE: u64 = 1;

/// Fixed address identifying the email protocol inside carrier scripts.
pub const EMAIL_PROTOCOL_ADDRESS: &str = "1XKdoVfVTrtNu243T44sNFVEpeTmeYitK";

/// Tag distinguishing sent from received email tokens.
pub const TAG_OUTGOING: &str = "email_outgoing";

/// Configuration for an email client.
///
/// Everything protocol-level is fixed by the constants above; only the
/// deployment-specific fields are configurable.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Relay host to queue and fetch messages at.
    pub relay_url: String,
    /// Raw client private key for transport authentication. When absent,
    /// the messenger's ambient signing provider is used.
    pub client_private_key: Option<SecretString>,
}

impl EmailConfig {
    /// Configuration against a specific relay host.
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            relay_url: relay_url.into(),
            client_private_key: None,
        }
    }

    /// Authenticate with an explicit raw private key.
    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.client_private_key = Some(SecretString::from(key.into()));
        self
    }

    /// The full messaging configuration with the email constants filled in.
    pub fn messaging(&self) -> MessagingConfig {
        MessagingConfig {
            relay_url: self.relay_url.clone(),
            client_private_key: self.client_private_key.clone(),
            token_value: EMAIL_TOKEN_VALUE,
            protocol_id: EMAIL_PROTOCOL_ID.to_string(),
            key_id: EMAIL_KEY_ID,
            basket: EMAIL_BASKET.to_string(),
            message_box: EMAIL_MESSAGE_BOX.to_string(),
            protocol_address: EMAIL_PROTOCOL_ADDRESS.to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_URL)
    }
}
