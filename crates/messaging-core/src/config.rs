//! Messenger configuration.

use secrecy::SecretString;

/// Configuration for a token messenger bound to one protocol.
///
/// Protocols fill this in with their fixed constants; the relay URL and
/// client key are the only deployment-specific fields.
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Base URL of the store-and-forward relay.
    pub relay_url: String,
    /// Raw client private key for transport authentication. When absent,
    /// messengers fall back to their ambient signing provider.
    pub client_private_key: Option<SecretString>,
    /// Face value, in satoshis, carried by each token output.
    pub token_value: u64,
    /// Protocol id mixed into every key derivation.
    pub protocol_id: String,
    /// Protocol key id mixed into every key derivation.
    pub key_id: u32,
    /// Basket that holds this protocol's outputs.
    pub basket: String,
    /// Relay inbox this protocol's messages are boxed to.
    pub message_box: String,
    /// Fixed address identifying the protocol inside carrier scripts.
    pub protocol_address: String,
}
