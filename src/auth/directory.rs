// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lookup of user identities by token subject.
//!
//! The user-management service owns user records; token renewal only needs
//! to resolve a subject to a fresh [`UserIdentity`]. [`InMemoryUserDirectory`]
//! is the implementation wired in by the server binary, optionally seeded
//! from a JSON file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use super::identity::UserIdentity;

/// Read access to user identities.
pub trait UserDirectory: Send + Sync {
    fn find_by_subject(&self, subject: &str) -> Option<UserIdentity>;
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read user seed file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("User seed file {} is not a JSON array of identities: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserIdentity>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_identities(identities: impl IntoIterator<Item = UserIdentity>) -> Self {
        let directory = Self::new();
        for identity in identities {
            directory.upsert(identity);
        }
        directory
    }

    /// Load a JSON array of [`UserIdentity`] records.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let identities: Vec<UserIdentity> =
            serde_json::from_str(&raw).map_err(|source| DirectoryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_identities(identities))
    }

    /// Insert or replace the identity stored under its subject.
    pub fn upsert(&self, identity: UserIdentity) {
        self.write().insert(identity.subject.clone(), identity);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Writers only insert whole entries; a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, UserIdentity>> {
        self.users.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, UserIdentity>> {
        self.users.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_subject(&self, subject: &str) -> Option<UserIdentity> {
        self.read().get(subject).cloned()
    }
}
