//! SSH public key loading for instance metadata.
//!
//! The key is read fresh on every workflow run rather than cached at process
//! start, so replacing the file on disk takes effect on the next scheduler
//! invocation.

use thiserror::Error;

use crate::files::{expand_tilde, read_to_string_ambient};

/// Errors raised while loading the SSH public key.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SshKeyError {
    /// Raised when the configured path is empty or only whitespace.
    #[error("SSH public key path must not be empty")]
    PathEmpty,
    /// Raised when reading the key file fails.
    #[error("failed to read SSH public key `{path}`: {message}")]
    FileRead {
        /// Expanded path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when the key file is empty or only whitespace.
    #[error("SSH public key file `{path}` is empty")]
    FileEmpty {
        /// Expanded path of the empty file.
        path: String,
    },
}

/// Reads the SSH public key at `path`, expanding a leading `~/`.
///
/// The returned text preserves the file content; emptiness is checked on the
/// trimmed text only.
///
/// # Errors
///
/// Returns [`SshKeyError`] when the path is empty, the file cannot be read,
/// or the file holds no key material.
pub fn load_public_key(path: &str) -> Result<String, SshKeyError> {
    if path.trim().is_empty() {
        return Err(SshKeyError::PathEmpty);
    }

    let expanded = expand_tilde(path);
    let content = read_to_string_ambient(&expanded).map_err(|message| SshKeyError::FileRead {
        path: expanded.clone(),
        message,
    })?;

    if content.trim().is_empty() {
        return Err(SshKeyError::FileEmpty { path: expanded });
    }

    Ok(content)
}
