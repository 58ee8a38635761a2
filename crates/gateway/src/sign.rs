//! Parameter canonicalization and HMAC-SHA-512 signing.
//!
//! Outbound requests and inbound callbacks are signed over the same
//! canonical form: parameters sorted lexicographically by key and
//! URL-encoded as `key=value&key=value...`.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::GatewayError;

type HmacSha512 = Hmac<Sha512>;

/// The signature parameter appended to outbound URLs and extracted from
/// inbound callbacks.
pub const SECURE_HASH_PARAM: &str = "vnp_SecureHash";

/// Legacy hash-type parameter; never part of the signed payload.
pub const SECURE_HASH_TYPE_PARAM: &str = "vnp_SecureHashType";

/// Builds the canonical URL-encoded query string from sorted parameters.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Computes the hex-encoded HMAC-SHA-512 secure hash over the canonical
/// form of `params`.
pub fn secure_hash(
    params: &BTreeMap<String, String>,
    secret: &str,
) -> Result<String, GatewayError> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::Configuration("unusable signing secret".to_string()))?;
    mac.update(canonical_query(params).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies an inbound callback's signature.
///
/// The secure-hash parameters are removed, the rest re-sorted and
/// re-signed exactly like an outbound request, and the result compared in
/// constant time against the hash the gateway sent. Any mismatch fails
/// closed as [`GatewayError::InvalidSignature`].
pub fn verify_signature(
    params: &HashMap<String, String>,
    secret: &str,
) -> Result<(), GatewayError> {
    let provided = params
        .get(SECURE_HASH_PARAM)
        .ok_or(GatewayError::InvalidSignature)?;
    let provided_bytes = hex::decode(provided).map_err(|_| GatewayError::InvalidSignature)?;

    let signed: BTreeMap<String, String> = params
        .iter()
        .filter(|(k, _)| k.as_str() != SECURE_HASH_PARAM && k.as_str() != SECURE_HASH_TYPE_PARAM)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::Configuration("unusable signing secret".to_string()))?;
    mac.update(canonical_query(&signed).as_bytes());
    mac.verify_slice(&provided_bytes)
        .map_err(|_| GatewayError::InvalidSignature)
}

/// Normalizes a client IP for the `vnp_IpAddr` parameter: takes the first
/// address of a forwarded-for chain, strips the IPv6-mapped-IPv4 prefix,
/// and maps IPv6 loopback to `127.0.0.1`.
pub fn normalize_ip(raw: &str) -> String {
    let first = raw.split(',').next().unwrap_or(raw).trim();
    let stripped = first.strip_prefix("::ffff:").unwrap_or(first);
    match stripped {
        "" | "::1" => "127.0.0.1".to_string(),
        other => other.to_string(),
    }
}

/// Formats a timestamp as the gateway's `YYYYMMDDHHmmss` creation date.
pub fn format_create_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}
