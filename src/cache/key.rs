/// Command key derivation
///
/// A command key is the SHA-256 digest of the exact command bytes, hex-encoded.
/// It doubles as the cache file name, so it must stay stable across releases.
use sha2::{Digest, Sha256};
use std::fmt;

/// Filesystem-safe identifier of a command string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandKey(String);

impl CommandKey {
    /// Derive the key for a command (after its words were joined). The text
    /// need not be UTF-8.
    pub fn derive(command: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(command.as_ref());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
