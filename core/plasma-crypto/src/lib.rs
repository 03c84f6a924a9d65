//! At-rest encryption for the Plasma license store.
//!
//! A single 32-byte master key lives in a local secret file. Every
//! persisted mapping is sealed independently with ChaCha20-Poly1305 under
//! that key and stored as base64 text.

mod cipher;
mod error;
mod key;

pub use cipher::{NONCE_SIZE, TAG_SIZE, seal, seal_str, unseal, unseal_str};
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, KeyOrigin, MasterKey, write_private};
