//! Alibaba Cloud RPC request signing (signature version 1.0)

use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use ring::hmac;
use std::collections::BTreeMap;

use crate::secrets::SecretString;

/// RFC 3986 unreserved characters stay as-is, everything else is %XX encoded
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const SIGNATURE_VERSION: &str = "1.0";

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, RFC3986).to_string()
}

/// `k=v&k=v` over the parameters sorted by name, both sides percent-encoded
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs RPC-style requests with an access key secret
pub struct RpcSigner {
    access_key_secret: SecretString,
}

impl RpcSigner {
    pub fn new(access_key_secret: SecretString) -> Self {
        Self { access_key_secret }
    }

    pub fn string_to_sign(method: &str, params: &BTreeMap<String, String>) -> String {
        format!(
            "{}&{}&{}",
            method,
            percent_encode("/"),
            percent_encode(&canonical_query(params))
        )
    }

    /// Base64 HMAC-SHA1 of the string-to-sign, keyed with `secret&`
    pub fn sign(&self, method: &str, params: &BTreeMap<String, String>) -> String {
        let key_material = format!("{}&", self.access_key_secret.expose());
        let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key_material.as_bytes());
        let tag = hmac::sign(&key, Self::string_to_sign(method, params).as_bytes());
        base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
    }

    /// Full query string: canonical parameters plus the trailing `Signature`
    pub fn signed_query(&self, method: &str, params: &BTreeMap<String, String>) -> String {
        let signature = self.sign(method, params);
        format!(
            "{}&Signature={}",
            canonical_query(params),
            percent_encode(&signature)
        )
    }
}
