//! Validation of `POST /ali/add` submissions
//!
//! Checks run in a fixed order and the first failure wins: method, body
//! length, JSON object decoding, token, port, then IP resolution and
//! classification. Only an absent or empty `ip` falls back to the caller's
//! address; a blank one is an invalid IP.
//! The token check precedes anything IP related, so unauthenticated
//! callers learn nothing about address handling.

use axum::http::{HeaderMap, Method};
use constant_time_eq::constant_time_eq;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

use super::responses::RequestError;
use crate::firewall::{is_public, AllowRequest, RuleKind};

/// JSON body of an allow-list submission. Absent fields decode as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddRequestPayload {
    pub ip: String,
    pub port: u16,
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
    pub region: String,
    pub remark: String,
    /// Free text from the caller, only logged
    pub message: String,
    pub protocol: String,
    pub instance: String,
}

/// Validate a raw submission into a normalized [`AllowRequest`]
pub fn validate_add_request(
    method: &Method,
    body: &[u8],
    headers: &HeaderMap,
    remote_addr: Option<SocketAddr>,
    expected_token: &str,
) -> Result<AllowRequest, RequestError> {
    if method != Method::POST {
        return Err(RequestError::MethodNotAllowed);
    }

    if body.is_empty() {
        return Err(RequestError::EmptyBody);
    }

    // Serde would also accept a positional array for a struct
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| RequestError::MalformedPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(RequestError::MalformedPayload(
            "expected a JSON object".to_string(),
        ));
    }
    let payload: AddRequestPayload = serde_json::from_value(value)
        .map_err(|e| RequestError::MalformedPayload(e.to_string()))?;

    if expected_token.is_empty()
        || !constant_time_eq(payload.token.as_bytes(), expected_token.as_bytes())
    {
        return Err(RequestError::Unauthorized);
    }

    if payload.port == 0 {
        return Err(RequestError::MalformedPayload(
            "port must be between 1 and 65535".to_string(),
        ));
    }

    let raw_ip = if payload.ip.is_empty() {
        resolve_client_ip(headers, remote_addr)
    } else {
        payload.ip.clone()
    };
    let raw_ip = raw_ip.trim();

    let ip: IpAddr = raw_ip
        .parse()
        .map_err(|_| RequestError::InvalidIp(raw_ip.to_string()))?;
    let ip = ip.to_canonical();

    if !is_public(ip) {
        return Err(RequestError::NonPublicIp(ip.to_string()));
    }

    if !payload.message.is_empty() {
        debug!(message = %payload.message, "Client message");
    }

    Ok(AllowRequest {
        ip: ip.to_string(),
        port: payload.port,
        protocol: payload.protocol,
        kind: RuleKind::from_wire(&payload.kind),
        region: payload.region,
        instance: payload.instance,
        remark: payload.remark,
    })
}

/// Caller address when the payload names none.
///
/// Precedence: first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// peer address of the connection. The result may still be unparseable.
pub fn resolve_client_ip(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    if let Some(forwarded_for) = header_value(headers, "x-forwarded-for") {
        // X-Forwarded-For can contain multiple IPs, the first is the original client
        if let Some(first_ip) = forwarded_for.split(',').next() {
            return first_ip.trim().to_string();
        }
    }

    if let Some(real_ip) = header_value(headers, "x-real-ip") {
        return real_ip.to_string();
    }

    remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const TOKEN: &str = "shared-token";

    fn body(json: &str) -> Vec<u8> {
        json.as_bytes().to_vec()
    }

    fn remote(addr: &str) -> Option<SocketAddr> {
        Some(addr.parse().unwrap())
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    fn validate(json: &str) -> Result<AllowRequest, RequestError> {
        validate_add_request(
            &Method::POST,
            &body(json),
            &HeaderMap::new(),
            remote("8.8.8.8:5000"),
            TOKEN,
        )
    }

    #[test]
    fn test_valid_request() {
        let request = validate(
            r#"{"ip":" 1.2.3.4 ","port":22,"type":"update","token":"shared-token",
                "region":"cn-shanghai","remark":"home","message":"hi",
                "protocol":"TCP","instance":"i-abc"}"#,
        )
        .unwrap();

        assert_eq!(request.ip, "1.2.3.4");
        assert_eq!(request.port, 22);
        assert_eq!(request.kind, RuleKind::Update);
        assert_eq!(request.protocol, "TCP");
        assert_eq!(request.region, "cn-shanghai");
        assert_eq!(request.instance, "i-abc");
        assert_eq!(request.remark, "home");
    }

    #[test]
    fn test_non_post_rejected_first() {
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let result = validate_add_request(&method, b"", &HeaderMap::new(), None, TOKEN);
            assert_eq!(result.unwrap_err(), RequestError::MethodNotAllowed);
        }
    }

    #[test]
    fn test_empty_body() {
        let result = validate_add_request(&Method::POST, b"", &HeaderMap::new(), None, TOKEN);
        assert_eq!(result.unwrap_err(), RequestError::EmptyBody);
    }

    #[test]
    fn test_malformed_payload_carries_decode_error() {
        match validate("{not json").unwrap_err() {
            RequestError::MalformedPayload(message) => assert!(!message.is_empty()),
            other => panic!("unexpected error: {:?}", other),
        }

        // Wrong type for a known field
        assert!(matches!(
            validate(r#"{"port":"22","token":"shared-token"}"#),
            Err(RequestError::MalformedPayload(_))
        ));

        // Out of range port
        assert!(matches!(
            validate(r#"{"port":70000,"token":"shared-token"}"#),
            Err(RequestError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        for json in [
            r#"["1.2.3.4",22,"update","shared-token","cn","home","","tcp","i-1"]"#,
            "null",
            "22",
            r#""shared-token""#,
        ] {
            assert!(
                matches!(validate(json), Err(RequestError::MalformedPayload(_))),
                "{} should be rejected",
                json
            );
        }
    }

    #[test]
    fn test_zero_port_rejected_after_token() {
        assert!(matches!(
            validate(r#"{"ip":"1.2.3.4","token":"shared-token","protocol":"tcp"}"#),
            Err(RequestError::MalformedPayload(_))
        ));
        assert_eq!(
            validate(r#"{"ip":"1.2.3.4","token":"wrong"}"#).unwrap_err(),
            RequestError::Unauthorized
        );
    }

    #[test]
    fn test_wrong_token_beats_invalid_ip() {
        let result = validate(r#"{"ip":"not-an-ip","port":22,"token":"wrong"}"#);
        assert_eq!(result.unwrap_err(), RequestError::Unauthorized);

        let result = validate(r#"{"ip":"10.0.0.1","port":22}"#);
        assert_eq!(result.unwrap_err(), RequestError::Unauthorized);
    }

    #[test]
    fn test_empty_configured_token_never_matches() {
        let result = validate_add_request(
            &Method::POST,
            &body(r#"{"ip":"1.2.3.4","port":22,"token":""}"#),
            &HeaderMap::new(),
            None,
            "",
        );
        assert_eq!(result.unwrap_err(), RequestError::Unauthorized);
    }

    #[test]
    fn test_invalid_ip() {
        let result = validate(r#"{"ip":"999.1.1.1","port":22,"token":"shared-token"}"#);
        assert_eq!(
            result.unwrap_err(),
            RequestError::InvalidIp("999.1.1.1".to_string())
        );
    }

    #[test]
    fn test_non_public_ip() {
        for ip in ["10.1.2.3", "192.168.1.1", "100.64.0.1", "127.0.0.1", "fe80::1"] {
            let json = format!(r#"{{"ip":"{}","port":22,"token":"shared-token"}}"#, ip);
            assert!(
                matches!(validate(&json), Err(RequestError::NonPublicIp(_))),
                "{} should be rejected",
                ip
            );
        }
    }

    #[test]
    fn test_ipv6_is_canonicalized() {
        let request =
            validate(r#"{"ip":"2001:4860:4860:0:0:0:0:8888","port":22,"token":"shared-token"}"#)
                .unwrap();
        assert_eq!(request.ip, "2001:4860:4860::8888");

        let request =
            validate(r#"{"ip":"::ffff:8.8.4.4","port":22,"token":"shared-token"}"#).unwrap();
        assert_eq!(request.ip, "8.8.4.4");
    }

    #[test]
    fn test_type_other_than_update_is_create() {
        let request = validate(r#"{"ip":"1.2.3.4","port":22,"token":"shared-token"}"#).unwrap();
        assert_eq!(request.kind, RuleKind::Create);

        let request =
            validate(r#"{"ip":"1.2.3.4","port":22,"type":"add","token":"shared-token"}"#)
                .unwrap();
        assert_eq!(request.kind, RuleKind::Create);
    }

    #[test]
    fn test_blank_ip_does_not_fall_back() {
        let result = validate_add_request(
            &Method::POST,
            &body(r#"{"ip":"   ","port":22,"token":"shared-token"}"#),
            &headers(&[("x-real-ip", "8.8.8.8")]),
            remote("8.8.8.8:5000"),
            TOKEN,
        );
        assert_eq!(result.unwrap_err(), RequestError::InvalidIp(String::new()));
    }

    #[test]
    fn test_json_keys_are_case_sensitive() {
        let result = validate(r#"{"IP":"1.2.3.4","Port":22,"Token":"shared-token"}"#);
        assert_eq!(result.unwrap_err(), RequestError::Unauthorized);
    }

    #[test]
    fn test_ip_falls_back_to_forwarded_for() {
        let result = validate_add_request(
            &Method::POST,
            &body(r#"{"port":22,"token":"shared-token"}"#),
            &headers(&[
                ("x-forwarded-for", " 9.9.9.9 , 10.0.0.1"),
                ("x-real-ip", "1.1.1.1"),
            ]),
            remote("8.8.8.8:5000"),
            TOKEN,
        );
        assert_eq!(result.unwrap().ip, "9.9.9.9");
    }

    #[test]
    fn test_resolve_client_ip_precedence() {
        let peer = remote("8.8.8.8:5000");

        assert_eq!(
            resolve_client_ip(&headers(&[("x-forwarded-for", "9.9.9.9, 10.0.0.1")]), peer),
            "9.9.9.9"
        );
        assert_eq!(
            resolve_client_ip(&headers(&[("x-real-ip", "1.1.1.1")]), peer),
            "1.1.1.1"
        );
        assert_eq!(resolve_client_ip(&HeaderMap::new(), peer), "8.8.8.8");
        assert_eq!(
            resolve_client_ip(&HeaderMap::new(), remote("[2001:db8::1]:443")),
            "2001:db8::1"
        );
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None), "");

        // Empty headers are skipped
        assert_eq!(
            resolve_client_ip(
                &headers(&[("x-forwarded-for", ""), ("x-real-ip", "1.1.1.1")]),
                peer
            ),
            "1.1.1.1"
        );
    }

    #[test]
    fn test_loopback_peer_without_ip_is_non_public() {
        let result = validate_add_request(
            &Method::POST,
            &body(r#"{"port":22,"token":"shared-token"}"#),
            &HeaderMap::new(),
            remote("127.0.0.1:40000"),
            TOKEN,
        );
        assert_eq!(
            result.unwrap_err(),
            RequestError::NonPublicIp("127.0.0.1".to_string())
        );
    }

    #[test]
    fn test_missing_peer_without_ip_is_invalid() {
        let result = validate_add_request(
            &Method::POST,
            &body(r#"{"port":22,"token":"shared-token"}"#),
            &HeaderMap::new(),
            None,
            TOKEN,
        );
        assert_eq!(result.unwrap_err(), RequestError::InvalidIp(String::new()));
    }
}
