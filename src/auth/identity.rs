// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User identity record supplied by the user-management collaborator.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::TokenError;

/// Profile of a user as known to the identity provider.
///
/// `subject` is the identity-provider user id (a numeric string for Discord)
/// and becomes the `sub` claim of every token issued for this user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub subject: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserIdentity {
    pub fn new(subject: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            username: username.into(),
            display_name: None,
            email: None,
            avatar_url: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// A token cannot be issued without a subject.
    pub(crate) fn validate(&self) -> Result<(), TokenError> {
        if self.subject.trim().is_empty() {
            return Err(TokenError::InvalidInput("user identity subject must not be empty"));
        }
        Ok(())
    }
}
