// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token renewal and the [`TokenService`] facade.
//!
//! ## Refresh Flow
//!
//! 1. Client posts its refresh token
//! 2. The token is verified like any other
//! 3. Its `tokenType` must be `REFRESH`; an access token is refused and
//!    never silently treated as a refresh token
//! 4. The subject is resolved to a fresh identity via the [`UserDirectory`]
//! 5. A new access token is issued from that identity

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::claims::{Claims, TokenType};
use super::directory::UserDirectory;
use super::error::TokenError;
use super::identity::UserIdentity;
use super::issuer::TokenIssuer;
use super::keys::KeyPair;
use super::verifier::TokenVerifier;
use crate::config::AuthSettings;

/// Issue a new access token from verified refresh claims.
///
/// The caller must have verified `refresh_claims` and looked up `identity`
/// by its subject.
pub fn renew(
    issuer: &TokenIssuer,
    refresh_claims: &Claims,
    identity: &UserIdentity,
) -> Result<String, TokenError> {
    ensure_refresh(refresh_claims)?;
    issuer.issue_access_token(identity)
}

fn ensure_refresh(claims: &Claims) -> Result<(), TokenError> {
    if !claims.is_refresh_token() {
        return Err(TokenError::InvalidTokenType {
            expected: TokenType::Refresh,
            actual: claims.token_type,
        });
    }
    Ok(())
}

/// Token pair handed out after a successful identity-provider login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `Bearer`
    pub token_type: String,
}

/// Issuer, verifier and key pair built from one set of settings.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: Arc<KeyPair>,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl TokenService {
    pub fn new(keys: Arc<KeyPair>, settings: &AuthSettings) -> Result<Self, TokenError> {
        Ok(Self {
            issuer: TokenIssuer::new(keys.clone(), settings)?,
            verifier: TokenVerifier::new(keys.clone(), settings),
            keys,
        })
    }

    pub fn keys(&self) -> &KeyPair {
        &self.keys
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Issue both tokens for a freshly logged-in user.
    pub fn issue_token_pair(&self, identity: &UserIdentity) -> Result<TokenPair, TokenError> {
        let pair = TokenPair {
            access_token: self.issuer.issue_access_token(identity)?,
            refresh_token: self.issuer.issue_refresh_token(identity)?,
            token_type: "Bearer".to_string(),
        };
        info!(subject = %identity.subject, "Issued token pair");
        Ok(pair)
    }

    pub fn renew(&self, refresh_claims: &Claims, identity: &UserIdentity) -> Result<String, TokenError> {
        renew(&self.issuer, refresh_claims, identity)
    }

    /// Exchange an encoded refresh token for a new access token.
    pub fn refresh(
        &self,
        refresh_token: &str,
        directory: &dyn UserDirectory,
    ) -> Result<String, TokenError> {
        if refresh_token.trim().is_empty() {
            return Err(TokenError::InvalidInput("refresh token must not be empty"));
        }

        let claims = self.verifier.verify(refresh_token)?;
        ensure_refresh(&claims)?;

        let identity = directory
            .find_by_subject(claims.subject())
            .ok_or_else(|| TokenError::UnknownSubject(claims.sub.clone()))?;

        let access_token = self.renew(&claims, &identity)?;
        info!(subject = %claims.sub, "Renewed access token");
        Ok(access_token)
    }
}
