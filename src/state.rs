// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{Authenticator, TokenService, UserDirectory, VerifyToken};
use crate::config::AuthSettings;

/// Shared, read-only application state.
///
/// Built once at startup after the key pair exists; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserDirectory>,
    pub authenticator: Authenticator,
}

impl AppState {
    pub fn new(tokens: TokenService, users: Arc<dyn UserDirectory>, settings: &AuthSettings) -> Self {
        let verifier: Arc<dyn VerifyToken> = Arc::new(tokens.verifier().clone());
        Self {
            authenticator: Authenticator::new(verifier, settings.bypass_paths.clone()),
            tokens: Arc::new(tokens),
            users,
        }
    }
}
