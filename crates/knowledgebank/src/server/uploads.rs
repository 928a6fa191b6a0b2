//! Storage of uploaded files.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Upper bound on `stem_N` candidates tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Reduce a client-supplied file name to a safe basename.
///
/// Both `/` and `\` count as separators. Returns `None` when nothing usable
/// remains.
#[must_use]
pub fn basename(client_name: &str) -> Option<&str> {
    let name = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => None,
        name if name.chars().any(char::is_control) => None,
        name => Some(name),
    }
}

/// Split a file name into stem and extension (with its dot).
///
/// A leading dot belongs to the stem, so `.env` has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

/// The `attempt`-th candidate name: the name itself, then `stem_1.ext`, ...
fn candidate(name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    format!("{stem}_{attempt}{ext}")
}

/// Write `bytes` into `dir` under the first free candidate name.
///
/// Returns the name the file was stored under. Creation is exclusive, so two
/// concurrent uploads of the same name never overwrite each other.
///
/// # Errors
///
/// Returns an error if the name is unusable or the file cannot be written.
pub async fn save(dir: &Path, client_name: &str, bytes: &[u8]) -> Result<String> {
    let name = basename(client_name)
        .ok_or_else(|| Error::invalid_upload(format!("unusable file name: {client_name:?}")))?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let stored = candidate(name, attempt);
        let path = dir.join(&stored);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        debug!(file = %stored, size = bytes.len(), "Stored upload");
        return Ok(stored);
    }

    Err(Error::internal(format!("no free file name for {name}")))
}
