use crate::error::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use std::fs;
use std::path::Path;

const KEY_BYTES: usize = 32;

/// Key handed to the front end for client-side encryption of API keys.
/// Created on first start and reused afterwards.
pub fn load_or_create_key(path: &Path) -> Result<String> {
    if path.exists() {
        let key = fs::read_to_string(path)?;
        return Ok(key.trim().to_string());
    }

    let key = generate_key();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &key)?;
    tracing::info!(path = %path.display(), "Generated new encryption key");
    Ok(key)
}

fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
