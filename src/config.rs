// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! immutable configuration structs built from them at startup. Nothing here
//! is mutated after the server starts; the structs are handed to
//! constructors instead of being read from globals.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `TLS_CERT_PATH` | PEM certificate chain (enables HTTPS with `TLS_KEY_PATH`) | unset |
//! | `TLS_KEY_PATH` | PEM private key for TLS | unset |
//! | `JWT_ISSUER` | `iss` claim written and expected | `dad-marketplace` |
//! | `JWT_AUDIENCE` | `aud` claim written and expected | `dad-marketplace-client` |
//! | `JWT_KEY_ID` | `kid` header of issued tokens | `dad-marketplace-key` |
//! | `JWT_KEY_PEM_PATH` | RSA private key PEM; a fresh key is generated when unset | unset |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime | `3600` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime | `604800` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance during verification | `60` |
//! | `AUTH_BYPASS_PATHS` | Comma-separated paths that skip authentication (`*` suffix = prefix) | see [`DEFAULT_BYPASS_PATHS`] |
//! | `USERS_SEED_FILE` | JSON array of user identities loaded into the directory | unset |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const JWT_KEY_ID_ENV: &str = "JWT_KEY_ID";
pub const JWT_KEY_PEM_PATH_ENV: &str = "JWT_KEY_PEM_PATH";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const AUTH_BYPASS_PATHS_ENV: &str = "AUTH_BYPASS_PATHS";
pub const USERS_SEED_FILE_ENV: &str = "USERS_SEED_FILE";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ISSUER: &str = "dad-marketplace";
pub const DEFAULT_AUDIENCE: &str = "dad-marketplace-client";
pub const DEFAULT_KEY_ID: &str = "dad-marketplace-key";
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(60);

/// Upper bound for any configured token lifetime or leeway (ten years).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Authority granted to every access token.
pub const DEFAULT_AUTHORITY: &str = "ROLE_USER";

/// Identity-provider initiation/callback paths and the public status endpoint.
pub const DEFAULT_BYPASS_PATHS: &[&str] = &[
    "/oauth2/*",
    "/login/oauth2/*",
    "/api/auth/login/discord",
    "/api/auth/status",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} and {1} must be set together")]
    Incomplete(&'static str, &'static str),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// A single authentication bypass rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRule {
    Exact(String),
    Prefix(String),
}

impl PathRule {
    /// Parse a rule; a trailing `*` makes it a prefix match.
    pub fn parse(raw: &str) -> Option<PathRule> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_suffix('*') {
            Some(prefix) => Some(PathRule::Prefix(prefix.to_string())),
            None => Some(PathRule::Exact(raw.to_string())),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Exact(p) => path == p,
            PathRule::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

/// Paths for which the authentication middleware is skipped entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassPaths {
    rules: Vec<PathRule>,
}

impl BypassPaths {
    pub fn new(rules: Vec<PathRule>) -> Self {
        Self { rules }
    }

    /// Build from a comma-separated list (`/oauth2/*,/api/auth/status`).
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').filter_map(PathRule::parse).collect())
    }

    pub fn is_bypassed(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }
}

impl Default for BypassPaths {
    fn default() -> Self {
        Self::new(
            DEFAULT_BYPASS_PATHS
                .iter()
                .filter_map(|p| PathRule::parse(p))
                .collect(),
        )
    }
}

/// Token issuance and verification settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    pub key_id: String,
    /// Durable key location; `None` means an ephemeral key per process.
    pub key_pem_path: Option<PathBuf>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub leeway: Duration,
    pub access_authorities: Vec<String>,
    pub bypass_paths: BypassPaths,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            key_id: DEFAULT_KEY_ID.to_string(),
            key_pem_path: None,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            leeway: DEFAULT_LEEWAY,
            access_authorities: vec![DEFAULT_AUTHORITY.to_string()],
            bypass_paths: BypassPaths::default(),
        }
    }
}

impl AuthSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            issuer: lookup(JWT_ISSUER_ENV).unwrap_or(defaults.issuer),
            audience: lookup(JWT_AUDIENCE_ENV).unwrap_or(defaults.audience),
            key_id: lookup(JWT_KEY_ID_ENV).unwrap_or(defaults.key_id),
            key_pem_path: lookup(JWT_KEY_PEM_PATH_ENV).map(PathBuf::from),
            access_token_ttl: parse_secs(&lookup, ACCESS_TOKEN_TTL_ENV, defaults.access_token_ttl, true)?,
            refresh_token_ttl: parse_secs(&lookup, REFRESH_TOKEN_TTL_ENV, defaults.refresh_token_ttl, true)?,
            leeway: parse_secs(&lookup, JWT_LEEWAY_ENV, defaults.leeway, false)?,
            access_authorities: defaults.access_authorities,
            bypass_paths: lookup(AUTH_BYPASS_PATHS_ENV)
                .map(|list| BypassPaths::parse(&list))
                .unwrap_or(defaults.bypass_paths),
        })
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub log_format: LogFormat,
    pub tls: Option<TlsPaths>,
    pub users_seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: PORT_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let addr_raw = format!("{host}:{port}");
        let addr = addr_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                name: HOST_ENV,
                value: host,
                reason: e.to_string(),
            })?;

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                    reason: "expected 'json' or 'pretty'".to_string(),
                })
            }
        };

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::Incomplete(TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV)),
        };

        Ok(Self {
            addr,
            log_format,
            tls,
            users_seed_file: lookup(USERS_SEED_FILE_ENV).map(PathBuf::from),
        })
    }
}

fn parse_secs<F>(
    lookup: &F,
    name: &'static str,
    default: Duration,
    require_positive: bool,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        name,
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    if require_positive && secs == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: raw,
            reason: "must be greater than zero".to_string(),
        });
    }
    if secs > MAX_TOKEN_TTL.as_secs() {
        return Err(ConfigError::InvalidValue {
            name,
            value: raw,
            reason: format!("must not exceed {} seconds", MAX_TOKEN_TTL.as_secs()),
        });
    }
    Ok(Duration::from_secs(secs))
}
