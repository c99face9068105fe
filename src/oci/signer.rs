//! HTTP request signing for the provider API.
//!
//! Requests carry a `Signature` authorization header over a fixed list of
//! headers: `date (request-target) host` for bodyless requests, extended
//! with `content-length content-type x-content-sha256` when a JSON body is
//! present. The signature is RSA PKCS#1 v1.5 over SHA-256, base64-encoded.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use reqwest::Method;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::credentials::Credentials;

const SIGNATURE_VERSION: &str = "1";
const SIGNING_ALGORITHM: &str = "rsa-sha256";
const HEADERS_BASE: &str = "date (request-target) host";
const HEADERS_WITH_BODY: &str = "date (request-target) host content-length content-type x-content-sha256";
/// RFC 7231 fixed-date format; `chrono` renders the names in English
/// regardless of locale.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub(super) const CONTENT_TYPE_JSON: &str = "application/json";

/// Raised when the RSA signing operation itself fails.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("failed to sign request: {0}")]
pub(super) struct SignError(String);

/// Headers produced by signing one request.
pub(super) struct SignedHeaders {
    /// Value for the `date` header, also covered by the signature.
    pub(super) date: String,
    /// Value for the `authorization` header.
    pub(super) authorization: String,
    /// Value for `x-content-sha256`; present only when a body was signed.
    pub(super) content_sha256: Option<String>,
}

struct BodyDigest {
    length: usize,
    sha256_base64: String,
}

/// Signs one request and returns the headers to attach to it.
///
/// `path_and_query` must be the exact path (with query string) sent on the
/// wire, and `body` the exact bytes, because both are covered by the
/// signature.
pub(super) fn sign_request(
    credentials: &Credentials,
    method: &Method,
    host: &str,
    path_and_query: &str,
    body: Option<&[u8]>,
) -> Result<SignedHeaders, SignError> {
    let date = Utc::now().format(HTTP_DATE_FORMAT).to_string();
    let digest = body.map(digest_body);
    let method_lowercase = method.as_str().to_ascii_lowercase();
    let (payload, header_list) =
        signing_string(&method_lowercase, host, path_and_query, &date, digest.as_ref());

    let signing_key = SigningKey::<Sha256>::new(credentials.private_key().clone());
    let signature = signing_key
        .try_sign(payload.as_bytes())
        .map_err(|err| SignError(err.to_string()))?;
    let authorization = authorization_header(
        &credentials.key_id(),
        header_list,
        &STANDARD.encode(signature.to_bytes()),
    );

    Ok(SignedHeaders {
        date,
        authorization,
        content_sha256: digest.map(|body_digest| body_digest.sha256_base64),
    })
}

fn digest_body(body: &[u8]) -> BodyDigest {
    BodyDigest {
        length: body.len(),
        sha256_base64: STANDARD.encode(Sha256::digest(body)),
    }
}

/// Assembles the canonical signing string and names the header list it
/// covers. Line order must match the header list exactly.
fn signing_string(
    method_lowercase: &str,
    host: &str,
    path_and_query: &str,
    date: &str,
    digest: Option<&BodyDigest>,
) -> (String, &'static str) {
    let mut lines = vec![
        format!("date: {date}"),
        format!("(request-target): {method_lowercase} {path_and_query}"),
        format!("host: {host}"),
    ];
    let Some(body_digest) = digest else {
        return (lines.join("\n"), HEADERS_BASE);
    };
    lines.push(format!("content-length: {}", body_digest.length));
    lines.push(format!("content-type: {CONTENT_TYPE_JSON}"));
    lines.push(format!("x-content-sha256: {}", body_digest.sha256_base64));
    (lines.join("\n"), HEADERS_WITH_BODY)
}

fn authorization_header(key_id: &str, header_list: &str, signature: &str) -> String {
    format!(
        "Signature version=\"{SIGNATURE_VERSION}\",keyId=\"{key_id}\",\
         algorithm=\"{SIGNING_ALGORITHM}\",headers=\"{header_list}\",\
         signature=\"{signature}\""
    )
}
