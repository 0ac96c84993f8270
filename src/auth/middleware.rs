// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! The middleware only *establishes* identity. It never rejects a request:
//!
//! 1. Paths on the bypass list skip authentication entirely
//! 2. No `Authorization: Bearer ...` header → continue anonymously
//! 3. Verification failure → log, continue anonymously
//! 4. Success → an [`AuthenticatedUser`] is inserted into the request
//!    extensions for this request only
//!
//! Rejecting anonymous requests on protected routes is left to the
//! [`Auth`](super::Auth) extractor.
//!
//! ```rust,ignore
//! let authenticator = Authenticator::new(verifier, settings.bypass_paths.clone());
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(authenticator, authenticate));
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, info, warn};

use super::claims::AuthenticatedUser;
use super::verifier::{extract_bearer_token, VerifyToken, BEARER_PREFIX};
use crate::config::BypassPaths;

/// Middleware state: the verifier plus the bypass list.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<dyn VerifyToken>,
    bypass_paths: Arc<BypassPaths>,
}

impl Authenticator {
    pub fn new(verifier: Arc<dyn VerifyToken>, bypass_paths: BypassPaths) -> Self {
        Self {
            verifier,
            bypass_paths: Arc::new(bypass_paths),
        }
    }

    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_paths.is_bypassed(path)
    }

    /// Resolve the request's principal, if any.
    ///
    /// Total: a panic anywhere in extraction or verification is caught and
    /// treated as "no principal".
    pub fn resolve(&self, headers: &HeaderMap, path: &str) -> Option<AuthenticatedUser> {
        match catch_unwind(AssertUnwindSafe(|| self.try_resolve(headers, path))) {
            Ok(user) => user,
            Err(_) => {
                error!(path, "Unexpected failure while authenticating request, continuing unauthenticated");
                None
            }
        }
    }

    fn try_resolve(&self, headers: &HeaderMap, path: &str) -> Option<AuthenticatedUser> {
        let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
        if !header.starts_with(BEARER_PREFIX) {
            return None;
        }

        let token = match extract_bearer_token(header) {
            Ok(token) => token,
            Err(e) => {
                warn!(path, error = %e, "Ignoring unusable bearer credential");
                return None;
            }
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(path, error = %e, error_code = e.error_code(), "Token verification failed, continuing unauthenticated");
                return None;
            }
        };

        if !claims.is_access_token() {
            warn!(path, subject = %claims.sub, "Refresh token presented as bearer credential, continuing unauthenticated");
            return None;
        }

        let user = AuthenticatedUser::from_claims(claims);
        info!(path, subject = %user.subject, "Request authenticated");
        Some(user)
    }
}

/// Authentication middleware function.
pub async fn authenticate(
    State(authenticator): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if authenticator.is_bypassed(&path) {
        debug!(path = %path, "Authentication bypassed");
        return next.run(request).await;
    }

    if let Some(user) = authenticator.resolve(request.headers(), &path) {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Claims;
    use crate::auth::error::AuthError;
    use crate::auth::extractor::OptionalAuth;
    use crate::test_support::{sample_identity, tamper_signature, test_token_service};
    use axum::{body::{to_bytes, Body}, http::StatusCode, routing::get, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Counts calls and delegates to the real verifier.
    struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl CountingVerifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl VerifyToken for CountingVerifier {
        fn verify(&self, token: &str) -> Result<Claims, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            test_token_service().verifier().verify(token)
        }
    }

    struct PanickingVerifier;

    impl VerifyToken for PanickingVerifier {
        fn verify(&self, _token: &str) -> Result<Claims, AuthError> {
            panic!("verifier bug");
        }
    }

    async fn whoami(OptionalAuth(user): OptionalAuth) -> String {
        user.map(|u| u.subject).unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(verifier: Arc<dyn VerifyToken>) -> Router {
        let authenticator = Authenticator::new(verifier, BypassPaths::default());
        Router::new()
            .route("/api/items", get(whoami))
            .route("/oauth2/authorization/discord", get(whoami))
            .layer(axum::middleware::from_fn_with_state(authenticator, authenticate))
    }

    async fn call(app: Router, path: &str, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri(path);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn no_header_continues_anonymously() {
        let verifier = CountingVerifier::new();
        let (status, body) = call(app(verifier.clone()), "/api/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn valid_access_token_attaches_principal() {
        let token = test_token_service()
            .issuer()
            .issue_access_token(&sample_identity())
            .unwrap();
        let verifier = CountingVerifier::new();
        let (status, body) = call(
            app(verifier.clone()),
            "/api/items",
            Some(&format!("Bearer {token}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "12345678");
        assert_eq!(verifier.calls(), 1);
    }

    #[tokio::test]
    async fn bypassed_path_never_verifies() {
        let verifier = CountingVerifier::new();
        let (status, body) = call(
            app(verifier.clone()),
            "/oauth2/authorization/discord",
            Some("Bearer definitely.not.valid"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_token_continues_anonymously() {
        let token = test_token_service()
            .issuer()
            .issue_access_token(&sample_identity())
            .unwrap();
        let verifier = CountingVerifier::new();
        let (status, body) = call(
            app(verifier.clone()),
            "/api/items",
            Some(&format!("Bearer {}", tamper_signature(&token))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
        assert_eq!(verifier.calls(), 1);
    }

    #[tokio::test]
    async fn empty_bearer_continues_anonymously() {
        let verifier = CountingVerifier::new();
        let (status, body) = call(app(verifier.clone()), "/api/items", Some("Bearer ")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn other_schemes_are_ignored() {
        let verifier = CountingVerifier::new();
        for value in ["bearer abc", "Basic dXNlcjpwYXNz", "Token abc"] {
            let (status, body) = call(app(verifier.clone()), "/api/items", Some(value)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "anonymous");
        }
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn refresh_token_does_not_authenticate() {
        let token = test_token_service()
            .issuer()
            .issue_refresh_token(&sample_identity())
            .unwrap();
        let (status, body) = call(
            app(CountingVerifier::new()),
            "/api/items",
            Some(&format!("Bearer {token}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn verifier_panic_degrades_to_anonymous() {
        let (status, body) = call(
            app(Arc::new(PanickingVerifier)),
            "/api/items",
            Some("Bearer a.b.c"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[test]
    fn principal_is_not_shared_between_resolutions() {
        let authenticator = Authenticator::new(CountingVerifier::new(), BypassPaths::default());
        let token = test_token_service()
            .issuer()
            .issue_access_token(&sample_identity())
            .unwrap();

        let mut with_token = HeaderMap::new();
        with_token.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        assert!(authenticator.resolve(&with_token, "/api/items").is_some());
        assert!(authenticator.resolve(&HeaderMap::new(), "/api/items").is_none());
    }
}
