// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated principal.
//!
//! These only read what the authentication middleware attached; they never
//! verify tokens themselves.
//!
//! ```rust,ignore
//! async fn protected(Auth(user): Auth) -> impl IntoResponse {
//!     // rejected with 401 before reaching here if no principal
//! }
//!
//! async fn public(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
//!     // user: Option<AuthenticatedUser>
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::AuthRequired;
use super::AuthenticatedUser;

/// Requires an authenticated principal; rejects with 401 otherwise.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or(AuthRequired)
    }
}

/// Principal if the middleware established one.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenType;
    use axum::http::Request;

    fn empty_parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            subject: "12345678".to_string(),
            authorities: vec!["ROLE_USER".to_string()],
            token_type: TokenType::Access,
            expires_at: 0,
        }
    }

    #[tokio::test]
    async fn auth_rejects_without_principal() {
        let mut parts = empty_parts();
        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.err(), Some(AuthRequired));
    }

    #[tokio::test]
    async fn auth_reads_principal_from_extensions() {
        let mut parts = empty_parts();
        parts.extensions.insert(user());

        let Auth(found) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.subject, "12345678");
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_user() {
        let mut parts = empty_parts();
        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn optional_auth_returns_user() {
        let mut parts = empty_parts();
        parts.extensions.insert(user());
        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, Some(user()));
    }
}
