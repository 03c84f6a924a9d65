//! Master key management.
//!
//! The master key is 32 random bytes stored base64-encoded in a secret
//! file that only the owner can read.

use crate::error::{CryptoError, CryptoResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Whether [`MasterKey::load_or_create`] found an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Read from an existing key file.
    Loaded,
    /// Freshly generated and written to disk.
    Created,
}

/// The symmetric key sealing every persisted mapping, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Generates a new random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Encodes the key as base64 for the key file.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// Decodes a key previously produced by [`MasterKey::encode`].
    pub fn decode(encoded: &str) -> CryptoResult<Self> {
        let mut raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::KeyFile(format!("invalid base64: {e}")))?;

        if raw.len() != KEY_SIZE {
            let actual = raw.len();
            raw.zeroize();
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual,
            });
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&raw);
        raw.zeroize();
        Ok(Self { bytes })
    }

    /// Loads the key at `path`, or generates one and writes it with
    /// owner-only permissions if the file does not exist.
    pub fn load_or_create(path: &Path) -> CryptoResult<(Self, KeyOrigin)> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                debug!("Loaded master key from {:?}", path);
                Ok((Self::decode(&contents)?, KeyOrigin::Loaded))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("No master key at {:?}, generating a new one", path);
                let key = Self::generate();
                write_private(path, key.encode().as_bytes())?;
                Ok((key, KeyOrigin::Created))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Writes `contents` to `path` through a sibling temp file and a rename,
/// creating parent directories as needed. The file is restricted to the
/// owner on Unix.
pub fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, contents)?;
    restrict_to_owner(tmp)?;
    fs::rename(tmp, path)
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}
