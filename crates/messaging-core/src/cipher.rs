//! Payload encryption keyed by protocol scope and counterparty.
//!
//! Every payload is sealed under a subkey derived from the wallet's root
//! key, the protocol id and key id, and the counterparty of the exchange.
//! Both ends of a pair derive the same subkey; any other scope derives a
//! different one, so a token sealed for one reader stays sealed for
//! everyone else.

use std::env;

use async_trait::async_trait;
use base64::Engine;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::{Key, Nonce, XSalsa20Poly1305};

use crate::token::IdentityKey;

const SECRETBOX_KEY_LEN: usize = 32;
const SECRETBOX_NONCE_LEN: usize = 24;
const SCOPE_DOMAIN: &[u8] = b"messaging-scope-v1";

/// Errors raised while sealing or opening payloads.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("cipher key not configured")]
    MissingKey,

    #[error("invalid cipher key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("ciphertext too short: {0} bytes")]
    InvalidCiphertextLength(usize),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("encryption or decryption failure")]
    Aead,
}

/// The other party of a key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Counterparty {
    /// Seal for this wallet alone.
    SelfKey,
    /// Seal for an exchange with another identity.
    Identity(IdentityKey),
}

/// Everything a cipher needs to derive one payload subkey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScope {
    pub protocol_id: String,
    pub key_id: u32,
    pub counterparty: Counterparty,
}

impl KeyScope {
    pub fn new(protocol_id: impl Into<String>, key_id: u32, counterparty: Counterparty) -> Self {
        Self {
            protocol_id: protocol_id.into(),
            key_id,
            counterparty,
        }
    }
}

/// Seals and opens token payloads under a protocol scope.
///
/// Object-safe so clients can hold `Arc<dyn PayloadCipher>`.
#[async_trait]
pub trait PayloadCipher: Send + Sync {
    async fn encrypt(&self, plaintext: &[u8], scope: &KeyScope) -> Result<Vec<u8>, CipherError>;
    async fn decrypt(&self, ciphertext: &[u8], scope: &KeyScope) -> Result<Vec<u8>, CipherError>;
}

/// Passthrough cipher for structural tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCipher;

#[async_trait]
impl PayloadCipher for NoopCipher {
    async fn encrypt(&self, plaintext: &[u8], _scope: &KeyScope) -> Result<Vec<u8>, CipherError> {
        Ok(plaintext.to_vec())
    }

    async fn decrypt(&self, ciphertext: &[u8], _scope: &KeyScope) -> Result<Vec<u8>, CipherError> {
        Ok(ciphertext.to_vec())
    }
}

/// XSalsa20-Poly1305 payload cipher with per-scope subkeys.
///
/// The wire format is a random 24-byte nonce followed by the sealed box.
/// Subkeys hash the root key together with the scope; for a pair scope the
/// two identities are sorted first so sender and recipient derive the same
/// key without coordinating.
#[derive(Debug, Clone)]
pub struct SecretBoxCipher {
    identity: IdentityKey,
    root_key: [u8; SECRETBOX_KEY_LEN],
}

impl SecretBoxCipher {
    /// Cipher for `identity` over a raw 32-byte root key.
    pub fn new(identity: IdentityKey, root_key: [u8; SECRETBOX_KEY_LEN]) -> Self {
        Self { identity, root_key }
    }

    /// Read the root key from an environment variable.
    ///
    /// Accepts `hex:`-prefixed hex, bare hex, or base64.
    pub fn from_env(identity: IdentityKey, var: &str) -> Result<Self, CipherError> {
        let value = env::var(var).map_err(|_| CipherError::MissingKey)?;
        Self::from_key_str(identity, &value)
    }

    /// Parse the root key from a string in any supported encoding.
    pub fn from_key_str(identity: IdentityKey, value: &str) -> Result<Self, CipherError> {
        Ok(Self::new(identity, decode_key(value)?))
    }

    /// The identity this cipher derives self and pair scopes from.
    pub fn identity(&self) -> &IdentityKey {
        &self.identity
    }

    fn subkey(&self, scope: &KeyScope) -> [u8; SECRETBOX_KEY_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(SCOPE_DOMAIN);
        hasher.update(self.root_key);
        hasher.update(scope.protocol_id.as_bytes());
        hasher.update(scope.key_id.to_le_bytes());
        match &scope.counterparty {
            Counterparty::SelfKey => {
                hasher.update(b"self:");
                hasher.update(self.identity.as_str().as_bytes());
            }
            Counterparty::Identity(other) => {
                let (low, high) = if self.identity <= *other {
                    (&self.identity, other)
                } else {
                    (other, &self.identity)
                };
                hasher.update(b"pair:");
                hasher.update(low.as_str().as_bytes());
                hasher.update(b":");
                hasher.update(high.as_str().as_bytes());
            }
        }
        let key: [u8; SECRETBOX_KEY_LEN] = hasher.finalize().into();
        key
    }
}

#[async_trait]
impl PayloadCipher for SecretBoxCipher {
    async fn encrypt(&self, plaintext: &[u8], scope: &KeyScope) -> Result<Vec<u8>, CipherError> {
        let key = self.subkey(scope);
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&key));
        let mut nonce_bytes = [0u8; SECRETBOX_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| CipherError::Aead)?;

        let mut out = Vec::with_capacity(SECRETBOX_NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    async fn decrypt(&self, ciphertext: &[u8], scope: &KeyScope) -> Result<Vec<u8>, CipherError> {
        if ciphertext.len() < SECRETBOX_NONCE_LEN {
            return Err(CipherError::InvalidCiphertextLength(ciphertext.len()));
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(SECRETBOX_NONCE_LEN);
        let key = self.subkey(scope);
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&key));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CipherError::Aead)
    }
}

fn decode_key(value: &str) -> Result<[u8; SECRETBOX_KEY_LEN], CipherError> {
    let raw = value.trim();
    let bytes = match raw.strip_prefix("hex:") {
        Some(hex_str) => hex::decode(hex_str)?,
        None if looks_like_hex(raw) => hex::decode(raw)?,
        None => base64::engine::general_purpose::STANDARD.decode(raw)?,
    };
    if bytes.len() != SECRETBOX_KEY_LEN {
        return Err(CipherError::InvalidKeyLength(bytes.len()));
    }
    let mut key = [0u8; SECRETBOX_KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

fn looks_like_hex(value: &str) -> bool {
    value.len() == SECRETBOX_KEY_LEN * 2 && value.chars().all(|c| c.is_ascii_hexdigit())
}
