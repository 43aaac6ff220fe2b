use std::fs::OpenOptions;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use docreg_crypto::SigningKey;
use tracing::info;

use crate::error::{ServerError, ServerResult};

/// Read a hex-encoded signing key.
pub fn load_key(path: &Path) -> ServerResult<SigningKey> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ServerError::Key(format!("{}: {e}", path.display())))?;
    SigningKey::from_hex(raw.trim()).map_err(|e| ServerError::Key(format!("{}: {e}", path.display())))
}

/// Write `key` as hex, creating parent directories. Refuses to overwrite.
///
/// On unix the file is created readable by its owner only.
pub fn save_key(path: &Path, key: &SigningKey) -> ServerResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => ServerError::Key(format!("{} already exists", path.display())),
        _ => ServerError::Io(e),
    })?;
    file.write_all(format!("{}\n", key.to_hex()).as_bytes())?;
    file.sync_all()?;
    Ok(())
}

/// Load the key at `path`, generating and saving a fresh one if absent.
pub fn load_or_generate(path: &Path) -> ServerResult<SigningKey> {
    if path.exists() {
        return load_key(path);
    }
    let key = SigningKey::generate();
    save_key(path, &key)?;
    info!(path = %path.display(), owner = %key.owner_id(), "generated service key");
    Ok(key)
}
