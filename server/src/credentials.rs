//! The API token file.

use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Random bytes behind a generated token.
pub const TOKEN_BYTES: usize = 32;

/// Creates a fresh URL-safe API token.
pub fn generate_api_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Reads the API token from `path`, creating one on first run.
///
/// The second value is true when the token was just generated.
pub fn load_or_generate_api_token(path: &Path) -> Result<(String, bool)> {
    if path.exists() {
        info!("Loading API token from {:?}", path);
        let token = fs::read_to_string(path).context("Failed to read API token file")?;
        let token = token.trim();
        if token.is_empty() {
            bail!("API token file {:?} is empty", path);
        }
        Ok((token.to_string(), false))
    } else {
        warn!("Generating new API token at {:?}", path);
        let token = generate_api_token();
        plasma_crypto::write_private(path, token.as_bytes())
            .context("Failed to write API token file")?;
        Ok((token, true))
    }
}
