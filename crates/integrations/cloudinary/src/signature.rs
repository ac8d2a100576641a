//! Request signing.
//!
//! The signature is the hex digest of every signable parameter, sorted by key
//! and joined as `k1=v1&k2=v2`, with the API secret appended. Cloudinary
//! accounts verify SHA-1 unless switched to SHA-256.

use std::collections::BTreeMap;

use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Digest used for request signatures. Must match the account setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

/// Parameters that are sent but never signed.
pub const UNSIGNED_PARAMS: &[&str] = &[
    "file",
    "api_key",
    "signature",
    "resource_type",
    "cloud_name",
];

/// The string that gets hashed, without the secret.
///
/// Unsigned parameters and empty values are skipped. Keys come out in
/// lexicographic order because `params` is a `BTreeMap`.
pub fn string_to_sign(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !UNSIGNED_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign `params` with `secret`.
pub fn sign(
    params: &BTreeMap<String, String>,
    secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let payload = string_to_sign(params);
    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&payload, secret),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&payload, secret),
    }
}

fn hex_digest<D: Digest>(payload: &str, secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
