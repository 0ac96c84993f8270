// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! [`AuthError`] is what token verification returns; callers never see the
//! underlying `jsonwebtoken` error kinds. [`TokenError`] covers issuance and
//! renewal, where bad input and token-type misuse must reach the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::claims::TokenType;

/// Verification failure. Only the verifier produces these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Token is not a well-formed JWT or its claims do not deserialize
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature does not match the public key
    #[error("Token signature is invalid")]
    SignatureInvalid,
    /// Token `exp` is in the past
    #[error("Token has expired")]
    Expired,
    /// Any other rejection (issuer, audience, algorithm, ...)
    #[error("Token was rejected: {0}")]
    Generic(String),
}

/// Rejection from the [`Auth`](super::Auth) extractor: no principal was
/// established for a route that requires one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Authentication is required")]
pub struct AuthRequired;

impl IntoResponse for AuthRequired {
    fn into_response(self) -> Response {
        error_response(StatusCode::UNAUTHORIZED, self.to_string(), "unauthenticated")
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

fn error_response(status: StatusCode, message: String, code: &str) -> Response {
    let body = Json(ErrorBody {
        error: message,
        error_code: code.to_string(),
    });
    (status, body).into_response()
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken => "malformed_token",
            AuthError::SignatureInvalid => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::Generic(_) => "invalid_token",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string(), self.error_code())
    }
}

/// Issuance and renewal failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// A required input is missing or blank
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    /// A token of the wrong kind was presented
    #[error("Expected a {expected} token but got a {actual} token")]
    InvalidTokenType {
        expected: TokenType,
        actual: TokenType,
    },
    /// The token subject has no matching user identity
    #[error("No user found for subject '{0}'")]
    UnknownSubject(String),
    /// Signing failed (key material problem)
    #[error("Failed to sign token: {0}")]
    Signing(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl TokenError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::InvalidInput(_) => "invalid_input",
            TokenError::InvalidTokenType { .. } => "invalid_token_type",
            TokenError::UnknownSubject(_) => "user_not_found",
            TokenError::Signing(_) => "signing_failed",
            TokenError::Auth(e) => e.error_code(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenError::InvalidInput(_) | TokenError::InvalidTokenType { .. } => {
                StatusCode::BAD_REQUEST
            }
            TokenError::UnknownSubject(_) => StatusCode::NOT_FOUND,
            TokenError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TokenError::Auth(e) => e.status_code(),
        }
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string(), self.error_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_principal_returns_401() {
        let response = AuthRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "unauthenticated");
    }

    #[tokio::test]
    async fn wrong_token_type_returns_400() {
        let err = TokenError::InvalidTokenType {
            expected: TokenType::Refresh,
            actual: TokenType::Access,
        };
        assert_eq!(err.to_string(), "Expected a REFRESH token but got a ACCESS token");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "invalid_token_type");
    }

    #[tokio::test]
    async fn verifier_errors_return_401_with_their_code() {
        let response = AuthError::SignatureInvalid.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "invalid_signature");
    }

    #[test]
    fn wrapped_auth_error_keeps_its_code() {
        let err = TokenError::from(AuthError::Expired);
        assert_eq!(err.error_code(), "token_expired");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unknown_subject_is_not_found() {
        assert_eq!(
            TokenError::UnknownSubject("1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
