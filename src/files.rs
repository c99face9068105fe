//! Shared helpers for reading configuration-referenced files.
//!
//! Paths that arrive via configuration may carry a leading `~/` and may be
//! absolute or relative. This module centralises tilde expansion and the
//! capability-scoped reads so the SSH key and credentials loaders behave
//! identically.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Expands a leading `~/` prefix to the user's home directory.
///
/// If the `HOME` environment variable is not set, the input is returned
/// unchanged. Callers surface the expanded path in their error messages, so
/// an unexpanded `~` stays visible when expansion was not possible.
#[must_use]
pub(crate) fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

/// Reads a file to a string through an ambient-authority directory handle.
///
/// Absolute paths open the parent directory and read the file name inside it;
/// relative paths are resolved against the current working directory.
pub(crate) fn read_to_string_ambient(path: &str) -> Result<String, String> {
    let (dir_path, file_path) = split_for_open(Utf8Path::new(path))?;
    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}

fn split_for_open(path: &Utf8Path) -> Result<(&Utf8Path, &Utf8Path), String> {
    if !path.is_absolute() {
        return Ok((Utf8Path::new("."), path));
    }

    let parent = path
        .parent()
        .ok_or_else(|| format!("path has no parent directory: {path}"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("path has no file name: {path}"))?;
    Ok((parent, Utf8Path::new(file_name)))
}
