// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth endpoints: status, token refresh and public key discovery.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::keys::PublicJwkSet;
use crate::auth::OptionalAuth;
use crate::error::ApiError;
use crate::models::{AuthStatusResponse, RefreshRequest, RefreshResponse};
use crate::state::AppState;

/// Report whether the request carries an authenticated principal.
#[utoipa::path(
    get,
    path = "/api/auth/status",
    tag = "Auth",
    responses(
        (status = 200, description = "Authentication status", body = AuthStatusResponse)
    )
)]
pub async fn auth_status(OptionalAuth(user): OptionalAuth) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        authenticated: user.is_some(),
    })
}

/// Exchange a refresh token for a new access token.
///
/// Only REFRESH tokens are accepted; the new access token carries the
/// user's current profile from the user directory.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 400, description = "Body unreadable, blank token or not a refresh token"),
        (status = 401, description = "Refresh token failed verification"),
        (status = 404, description = "No user for the token subject"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::bad_request(rejection.body_text()).into_response(),
    };

    match state.tokens.refresh(&request.refresh_token, state.users.as_ref()) {
        Ok(access_token) => Json(RefreshResponse { access_token }).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, error_code = e.error_code(), "Token refresh rejected");
            e.into_response()
        }
    }
}

/// Publish the token verification key as a JWK Set.
#[utoipa::path(
    get,
    path = "/.well-known/jwks.json",
    tag = "Auth",
    responses(
        (status = 200, description = "Public signing keys", body = PublicJwkSet)
    )
)]
pub async fn jwks(State(state): State<AppState>) -> Json<PublicJwkSet> {
    Json(state.tokens.keys().jwk_set())
}
