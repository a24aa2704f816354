//! Request rejection reasons and their plain-text HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::firewall::ProviderError;

/// Why an allow-list request did not succeed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Length Required")]
    EmptyBody,

    #[error("Failed to read request body")]
    UnreadableBody,

    #[error("{0}")]
    MalformedPayload(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("invalid IP address: {0}")]
    InvalidIp(String),

    #[error("{0} is not a public IP address; pass the ip field explicitly")]
    NonPublicIp(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::EmptyBody => StatusCode::LENGTH_REQUIRED,
            RequestError::UnreadableBody => StatusCode::BAD_REQUEST,
            RequestError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            RequestError::Unauthorized => StatusCode::UNAUTHORIZED,
            RequestError::InvalidIp(_) => StatusCode::BAD_REQUEST,
            RequestError::NonPublicIp(_) => StatusCode::BAD_REQUEST,
            RequestError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label
    pub fn label(&self) -> &'static str {
        match self {
            RequestError::Provider(_) => "provider_error",
            _ => "rejected",
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RequestError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            RequestError::EmptyBody.status_code(),
            StatusCode::LENGTH_REQUIRED
        );
        assert_eq!(
            RequestError::MalformedPayload("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RequestError::InvalidIp("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::NonPublicIp("10.0.0.1".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RequestError::Provider(ProviderError::new("down")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            RequestError::InvalidIp("nope".to_string()).to_string(),
            "invalid IP address: nope"
        );
        assert!(RequestError::NonPublicIp("10.0.0.1".to_string())
            .to_string()
            .starts_with("10.0.0.1 is not a public IP address"));
        assert_eq!(
            RequestError::from(ProviderError::new("check the instance id")).to_string(),
            "check the instance id"
        );
    }

    #[tokio::test]
    async fn test_into_response_is_plain_text() {
        use http_body_util::BodyExt;

        let response = RequestError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Unauthorized");
    }
}
