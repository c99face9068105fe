//! API signing credentials loaded from the provider's CLI configuration file.
//!
//! The file uses INI syntax: one `[PROFILE]` section per identity, with
//! `key = value` entries naming the user, tenancy, key fingerprint, home
//! region, and the path of the RSA private key used to sign requests.

use std::collections::BTreeMap;
use std::fmt;

use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use thiserror::Error;

use crate::files::{expand_tilde, read_to_string_ambient};

/// Errors raised while loading signing credentials.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CredentialsError {
    /// Raised when the credentials file cannot be read.
    #[error("failed to read credentials file `{path}`: {message}")]
    FileRead {
        /// Path of the credentials file.
        path: String,
        /// Underlying I/O failure.
        message: String,
    },
    /// Raised when the requested profile section is absent.
    #[error("profile [{profile}] not found in `{path}`")]
    MissingProfile {
        /// Name of the requested profile.
        profile: String,
        /// Path of the credentials file.
        path: String,
    },
    /// Raised when a profile lacks one of the required keys.
    #[error("profile [{profile}] is missing required key `{key}`")]
    MissingKey {
        /// Name of the profile being loaded.
        profile: String,
        /// Name of the absent key.
        key: String,
    },
    /// Raised when the private key file cannot be read.
    #[error("failed to read private key `{path}`: {message}")]
    KeyRead {
        /// Path of the private key file.
        path: String,
        /// Underlying I/O failure.
        message: String,
    },
    /// Raised when the private key file is not a usable RSA key.
    #[error("failed to parse private key `{path}`: {message}")]
    KeyParse {
        /// Path of the private key file.
        path: String,
        /// Parser diagnostics for both attempted encodings.
        message: String,
    },
}

/// Signing identity for one tenancy user.
#[derive(Clone)]
pub struct Credentials {
    /// OCID of the user the requests are signed as.
    pub user: String,
    /// Fingerprint of the API key registered for the user.
    pub fingerprint: String,
    /// OCID of the tenancy the user belongs to.
    pub tenancy: String,
    /// Home region identifier, e.g. `ap-osaka-1`.
    pub region: String,
    private_key: RsaPrivateKey,
}

impl Credentials {
    /// Loads the named profile from a credentials file.
    ///
    /// The file path may start with `~/`, which expands to the current
    /// user's home directory. The referenced private key is read and parsed
    /// eagerly so that a bad key surfaces at start-up rather than on the
    /// first signed request.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError`] when the file or key cannot be read,
    /// the profile is absent, or a required key is missing.
    pub fn load(path: &str, profile: &str) -> Result<Self, CredentialsError> {
        let expanded = expand_tilde(path);
        let content =
            read_to_string_ambient(&expanded).map_err(|message| CredentialsError::FileRead {
                path: expanded.clone(),
                message,
            })?;
        let values =
            profile_values(&content, profile).ok_or_else(|| CredentialsError::MissingProfile {
                profile: profile.to_owned(),
                path: expanded.clone(),
            })?;

        let user = require_key(&values, profile, "user")?;
        let fingerprint = require_key(&values, profile, "fingerprint")?;
        let tenancy = require_key(&values, profile, "tenancy")?;
        let region = require_key(&values, profile, "region")?;
        let key_file = require_key(&values, profile, "key_file")?;

        let key_path = expand_tilde(&key_file);
        let pem = read_to_string_ambient(&key_path).map_err(|message| CredentialsError::KeyRead {
            path: key_path.clone(),
            message,
        })?;
        let private_key =
            parse_private_key(&pem).map_err(|message| CredentialsError::KeyParse {
                path: key_path,
                message,
            })?;

        Ok(Self {
            user,
            fingerprint,
            tenancy,
            region,
            private_key,
        })
    }

    /// Returns the `keyId` used in signed request headers.
    #[must_use]
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }

    pub(crate) const fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("fingerprint", &self.fingerprint)
            .field("tenancy", &self.tenancy)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Collects the `key = value` entries of one INI section.
///
/// Returns `None` when the section header never appears. Blank lines and
/// lines starting with `#` or `;` are ignored.
fn profile_values(content: &str, profile: &str) -> Option<BTreeMap<String, String>> {
    let mut in_profile = false;
    let mut found = false;
    let mut values = BTreeMap::new();

    for line in content.lines() {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') || entry.starts_with(';') {
            continue;
        }
        if let Some(section) = entry
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            in_profile = section.trim() == profile;
            found = found || in_profile;
            continue;
        }
        if in_profile && let Some((key, value)) = entry.split_once('=') {
            values.insert(key.trim().to_owned(), value.trim().to_owned());
        }
    }

    found.then_some(values)
}

fn require_key(
    values: &BTreeMap<String, String>,
    profile: &str,
    key: &str,
) -> Result<String, CredentialsError> {
    values
        .get(key)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| CredentialsError::MissingKey {
            profile: profile.to_owned(),
            key: key.to_owned(),
        })
}

/// Parses an RSA private key in either PKCS#8 or PKCS#1 PEM encoding.
fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, String> {
    RsaPrivateKey::from_pkcs8_pem(pem).or_else(|pkcs8_error| {
        RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|pkcs1_error| format!("not PKCS#8 ({pkcs8_error}) or PKCS#1 ({pkcs1_error})"))
    })
}
