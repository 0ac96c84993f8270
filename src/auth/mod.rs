// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless RS256 token authentication.
//!
//! ## Auth Flow
//!
//! 1. After an identity-provider login, the user-management side calls
//!    [`TokenService::issue_token_pair`] and hands both tokens to the client
//! 2. Client sends `Authorization: Bearer <access token>`
//! 3. The [`authenticate`] middleware verifies it and attaches an
//!    [`AuthenticatedUser`] to the request (or continues anonymously)
//! 4. Handlers use [`Auth`] (required) or [`OptionalAuth`]
//! 5. When the access token expires, the client exchanges its refresh token
//!    via [`TokenService::refresh`]
//!
//! ## Security
//!
//! - One key pair per process, read-only after startup
//! - Issuer, audience and expiry are enforced on every verification
//! - Refresh tokens never authenticate requests and access tokens never renew
//! - Clock skew tolerance defaults to 60 seconds

pub mod claims;
pub mod directory;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod issuer;
pub mod keys;
pub mod middleware;
pub mod renewal;
pub mod verifier;

pub use claims::{AuthenticatedUser, Claims, TokenType};
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use error::{AuthError, AuthRequired, TokenError};
pub use extractor::{Auth, OptionalAuth};
pub use identity::UserIdentity;
pub use issuer::TokenIssuer;
pub use keys::{EphemeralRsaKeyProvider, KeyPair, KeyProvider, PemFileKeyProvider};
pub use middleware::{authenticate, Authenticator};
pub use renewal::{renew, TokenPair, TokenService};
pub use verifier::{extract_bearer_token, TokenVerifier, VerifyToken};
