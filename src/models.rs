// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the auth endpoints. Field names are
//! camelCase on the wire to match the token claim names.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /api/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token previously issued alongside an access token.
    pub refresh_token: String,
}

/// Response of `POST /api/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Newly issued access token.
    pub access_token: String,
}

/// Response of `GET /api/auth/status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}
