// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access and refresh token issuance.
//!
//! Access tokens are short-lived and carry the user's profile and
//! authorities so handlers never need a lookup. Refresh tokens are
//! long-lived and carry only the subject, keeping PII out of the credential
//! most likely to be stored client-side.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Header};

use super::claims::{Claims, TokenType};
use super::error::TokenError;
use super::identity::UserIdentity;
use super::keys::KeyPair;
use crate::config::{AuthSettings, MAX_TOKEN_TTL};

/// Signs claim sets with the process key pair.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyPair>,
    issuer: String,
    audience: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    access_authorities: Vec<String>,
}

impl TokenIssuer {
    /// Create an issuer; both lifetimes must be between one second and
    /// [`MAX_TOKEN_TTL`].
    pub fn new(keys: Arc<KeyPair>, settings: &AuthSettings) -> Result<Self, TokenError> {
        Ok(Self {
            keys,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            access_ttl_secs: ttl_secs(settings.access_token_ttl)?,
            refresh_ttl_secs: ttl_secs(settings.refresh_token_ttl)?,
            access_authorities: settings.access_authorities.clone(),
        })
    }

    /// Issue an ACCESS token with profile claims and authorities.
    pub fn issue_access_token(&self, identity: &UserIdentity) -> Result<String, TokenError> {
        identity.validate()?;
        self.sign(&self.build_access_claims(identity, Utc::now()))
    }

    /// Issue a REFRESH token carrying only the subject.
    pub fn issue_refresh_token(&self, identity: &UserIdentity) -> Result<String, TokenError> {
        identity.validate()?;
        self.sign(&self.build_refresh_claims(identity, Utc::now()))
    }

    pub fn build_access_claims(&self, identity: &UserIdentity, now: DateTime<Utc>) -> Claims {
        let iat = now.timestamp();
        Claims {
            iss: self.issuer.clone(),
            sub: identity.subject.clone(),
            aud: vec![self.audience.clone()],
            iat,
            exp: iat.saturating_add(self.access_ttl_secs),
            token_type: TokenType::Access,
            authorities: self.access_authorities.clone(),
            username: Some(identity.username.clone()),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
        }
    }

    pub fn build_refresh_claims(&self, identity: &UserIdentity, now: DateTime<Utc>) -> Claims {
        let iat = now.timestamp();
        Claims {
            iss: self.issuer.clone(),
            sub: identity.subject.clone(),
            aud: vec![self.audience.clone()],
            iat,
            exp: iat.saturating_add(self.refresh_ttl_secs),
            token_type: TokenType::Refresh,
            authorities: Vec::new(),
            username: None,
            email: None,
            display_name: None,
            avatar_url: None,
        }
    }

    /// Sign an arbitrary claim set.
    ///
    /// The subject must be non-blank and `exp` must be after `iat`.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        if claims.sub.trim().is_empty() {
            return Err(TokenError::InvalidInput("claims subject must not be empty"));
        }
        if claims.exp <= claims.iat {
            return Err(TokenError::InvalidInput("claims must expire after they are issued"));
        }

        let mut header = Header::new(self.keys.algorithm());
        header.kid = Some(self.keys.key_id().to_string());

        encode(&header, claims, self.keys.encoding_key())
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }
}

fn ttl_secs(ttl: Duration) -> Result<i64, TokenError> {
    if ttl > MAX_TOKEN_TTL {
        return Err(TokenError::InvalidInput("token lifetime must not exceed ten years"));
    }
    match i64::try_from(ttl.as_secs()) {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(TokenError::InvalidInput("token lifetime must be at least one second")),
    }
}
