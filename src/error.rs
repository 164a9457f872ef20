use axum::response::{Html, IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

use crate::pages;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("invalid state parameter")]
    InvalidState,
    #[error("authorization code not found")]
    MissingCode,
    #[error("authorization denied by provider: {0}")]
    AuthorizationDenied(String),
    #[error("error when trying to exchange code for token")]
    TokenExchangeFailed,
    #[error("invalid id_token")]
    InvalidIdToken,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("failed to reach google api")]
    UpstreamUnreachable,
    #[error("error response google api: status code: {status} body: {body}")]
    UpstreamError { status: u16, body: String },
    #[error("unexpected response shape from google api")]
    UnexpectedUpstreamShape,
    #[error("missing or invalid configuration: {0}")]
    MissingConfiguration(String),
    #[error("Failed to generate CSRF token")]
    GenToken,
    #[error("Failed to parse url")]
    URL,
    #[error("Failed to discover provider metadata")]
    Discovery,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidState
            | Error::MissingCode
            | Error::AuthorizationDenied(_)
            | Error::TokenExchangeFailed
            | Error::UnexpectedUpstreamShape => StatusCode::BAD_REQUEST,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            // out-of-range codes from upstream
            Error::UpstreamError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::InvalidIdToken
            | Error::UpstreamUnreachable
            | Error::MissingConfiguration(_)
            | Error::GenToken
            | Error::URL
            | Error::Discovery => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Error::Unauthenticated => (status, Html(pages::LOGIN_REQUIRED)).into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::Error;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidState.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::TokenExchangeFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::InvalidIdToken.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Error::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::UpstreamUnreachable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::UnexpectedUpstreamShape.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_status_pass_through() {
        let err = Error::UpstreamError {
            status: 403,
            body: r#"{"error":"forbidden"}"#.to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn test_upstream_invalid_status_falls_back() {
        let err = Error::UpstreamError {
            status: 42,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
