//! Sealed blobs.
//!
//! A blob is `base64(nonce || ciphertext || tag)` under ChaCha20-Poly1305,
//! with a fresh random nonce per seal. Each store file is one blob.

use crate::error::{CryptoError, CryptoResult};
use crate::key::MasterKey;
use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

fn cipher(key: &MasterKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(key.as_bytes().into())
}

/// Seals `plaintext` under `key`.
pub fn seal(key: &MasterKey, plaintext: &[u8]) -> CryptoResult<String> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher(key)
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(blob))
}

/// Opens a blob produced by [`seal`]. Surrounding whitespace is ignored.
///
/// # Errors
///
/// [`CryptoError::Decryption`] for bad base64, a truncated blob, the wrong
/// key or any tampering.
pub fn unseal(key: &MasterKey, sealed: &str) -> CryptoResult<Vec<u8>> {
    let blob = STANDARD
        .decode(sealed.trim())
        .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption("data too short".to_string()));
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}

pub fn seal_str(key: &MasterKey, plaintext: &str) -> CryptoResult<String> {
    seal(key, plaintext.as_bytes())
}

pub fn unseal_str(key: &MasterKey, sealed: &str) -> CryptoResult<String> {
    String::from_utf8(unseal(key, sealed)?)
        .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {e}")))
}
