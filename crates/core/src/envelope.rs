//! Authenticated envelope codec.
//!
//! Grants travel between the issuer and this gateway as
//! `base64(nonce ‖ ciphertext ‖ tag)` under AES-256-GCM with a single
//! process-wide secret. A fresh random nonce is drawn for every seal;
//! opening authenticates and decrypts in one step, and every failure
//! mode collapses into [`Error::InvalidEnvelope`] so callers cannot
//! distinguish a truncated token from a forged one.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::grant::Grant;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Shortest possible envelope: a nonce and a tag around an empty payload.
pub const MIN_ENVELOPE_LEN: usize = NONCE_LEN + TAG_LEN;

/// Required secret length (AES-256).
pub const SECRET_LEN: usize = 32;

/// Process-wide symmetric secret shared with the grant issuer.
///
/// Constructed once at startup from configuration and handed to the
/// request path by value; there is no global key state.
#[derive(Clone)]
pub struct GatewaySecret([u8; SECRET_LEN]);

impl GatewaySecret {
    pub fn new(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a secret from raw UTF-8 key material, which must be
    /// exactly 32 bytes long.
    pub fn from_material(material: &str) -> Result<Self> {
        let bytes = material.as_bytes();
        if bytes.len() != SECRET_LEN {
            return Err(Error::InvalidSecret(format!(
                "expected {} bytes of key material, got {}",
                SECRET_LEN,
                bytes.len()
            )));
        }
        let mut key = [0u8; SECRET_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    fn cipher(&self) -> Aes256Gcm {
        let key = Key::<Aes256Gcm>::from_slice(&self.0);
        Aes256Gcm::new(key)
    }
}

impl std::fmt::Debug for GatewaySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GatewaySecret").field(&"[redacted]").finish()
    }
}

/// Seals raw bytes into an envelope.
pub fn seal_bytes(secret: &GatewaySecret, plaintext: &[u8]) -> Result<String> {
    let cipher = secret.cipher();
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| Error::Crypto("AES-GCM encryption failed".to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(out))
}

/// Seals a UTF-8 string into an envelope.
pub fn seal_str(secret: &GatewaySecret, plaintext: &str) -> Result<String> {
    seal_bytes(secret, plaintext.as_bytes())
}

/// Serializes `value` as JSON and seals it.
pub fn seal_json<T: Serialize>(secret: &GatewaySecret, value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
    seal_bytes(secret, &json)
}

/// Opens an envelope, returning the authenticated plaintext.
pub fn open(secret: &GatewaySecret, envelope: &str) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(envelope)
        .map_err(|_| Error::InvalidEnvelope)?;
    if raw.len() < MIN_ENVELOPE_LEN {
        return Err(Error::InvalidEnvelope);
    }

    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    secret
        .cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::InvalidEnvelope)
}

/// Opens an envelope and parses the payload as a [`Grant`].
///
/// A payload that decrypts but does not parse is rejected the same way
/// as one that fails authentication; a grant is never partially trusted.
pub fn open_grant(secret: &GatewaySecret, envelope: &str) -> Result<Grant> {
    let plaintext = open(secret, envelope)?;
    serde_json::from_slice(&plaintext).map_err(|_| Error::InvalidEnvelope)
}
