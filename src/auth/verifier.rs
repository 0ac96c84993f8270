// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification.
//!
//! Verification checks, in order: structure, algorithm (RS256 only),
//! signature against the process public key, required claims, expiry (with
//! leeway), issuer and audience. The result is a typed [`Claims`] or an
//! [`AuthError`]; `jsonwebtoken` error kinds never leak to callers.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Validation};

use super::claims::Claims;
use super::error::{AuthError, TokenError};
use super::keys::KeyPair;
use crate::config::AuthSettings;

/// Scheme prefix accepted in the `Authorization` header (case-sensitive).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Anything that can turn an encoded token into verified claims.
pub trait VerifyToken: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// RS256 verifier bound to the process key pair and configured issuer/audience.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: Arc<KeyPair>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyPair>, settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(keys.algorithm());
        validation.set_issuer(&[&settings.issuer]);
        validation.set_audience(&[&settings.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = settings.leeway.as_secs();

        Self { keys, validation }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MalformedToken);
        }

        let claims = decode::<Claims>(token, self.keys.decoding_key(), &self.validation)
            .map_err(map_jwt_error)?
            .claims;

        if claims.sub.trim().is_empty() || claims.exp <= claims.iat {
            return Err(AuthError::MalformedToken);
        }

        Ok(claims)
    }
}

impl VerifyToken for TokenVerifier {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        TokenVerifier::verify(self, token)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => AuthError::MalformedToken,
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidIssuer => AuthError::Generic("issuer is not accepted".to_string()),
        ErrorKind::InvalidAudience => AuthError::Generic("audience is not accepted".to_string()),
        ErrorKind::InvalidAlgorithm => AuthError::Generic("algorithm is not accepted".to_string()),
        ErrorKind::ImmatureSignature => AuthError::Generic("token is not yet valid".to_string()),
        other => AuthError::Generic(format!("{other:?}")),
    }
}

/// Strip the `Bearer ` scheme from a credential.
///
/// Input without the prefix is returned as a raw token. Blank input, or a
/// prefix followed by nothing, is `InvalidInput`.
pub fn extract_bearer_token(credential: &str) -> Result<&str, TokenError> {
    if credential.trim().is_empty() {
        return Err(TokenError::InvalidInput("bearer credential must not be empty"));
    }

    let token = credential
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(credential)
        .trim();

    if token.is_empty() {
        return Err(TokenError::InvalidInput("bearer token must not be empty"));
    }
    Ok(token)
}
