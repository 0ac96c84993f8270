// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RSA signing key material.
//!
//! ## Lifecycle
//!
//! A [`KeyPair`] is produced exactly once at startup by a [`KeyProvider`] and
//! then shared read-only (behind an `Arc`) by the issuer and verifier. There
//! is no rotation.
//!
//! - [`EphemeralRsaKeyProvider`] generates a fresh 2048-bit key; tokens do
//!   not survive a restart.
//! - [`PemFileKeyProvider`] loads a PEM private key so tokens stay valid
//!   across restarts.
//!
//! ## Security
//!
//! - The signing key is only reachable inside this crate (the issuer).
//! - Only the public JWK and key id are exported.
//! - `Debug` output never includes key material.

use std::fmt;
use std::path::PathBuf;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// RSA modulus size used for generated keys.
pub const RSA_KEY_BITS: usize = 2048;

/// The only algorithm issued and accepted.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("RSA key generation failed: {0}")]
    Generation(String),
    #[error("Failed to read key file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Key file {} is not a PKCS#1 or PKCS#8 RSA private key", .0.display())]
    Parse(PathBuf),
    #[error("RSA key is {bits} bits, at least 2048 required")]
    WeakKey { bits: usize },
    #[error("Failed to encode key material: {0}")]
    Encoding(String),
}

/// Public half of the signing key as an RFC 7517 JWK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicJwk {
    pub kty: String,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
    /// Modulus, base64url without padding
    pub n: String,
    /// Public exponent, base64url without padding
    pub e: String,
}

/// JWK Set document served at `/.well-known/jwks.json`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicJwkSet {
    pub keys: Vec<PublicJwk>,
}

/// Signing/verification key pair with a stable key id.
pub struct KeyPair {
    key_id: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_jwk: PublicJwk,
}

impl KeyPair {
    /// Build from an RSA private key.
    pub fn from_rsa_private_key(
        key_id: impl Into<String>,
        private_key: &RsaPrivateKey,
    ) -> Result<Self, KeyError> {
        let bits = private_key.size() * 8;
        if bits < RSA_KEY_BITS {
            return Err(KeyError::WeakKey { bits });
        }

        let pem = private_key
            .to_pkcs1_pem(Default::default())
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| KeyError::Encoding(e.to_string()))?;

        let n = Base64UrlUnpadded::encode_string(&private_key.n().to_bytes_be());
        let e = Base64UrlUnpadded::encode_string(&private_key.e().to_bytes_be());
        let decoding_key = DecodingKey::from_rsa_components(&n, &e)
            .map_err(|err| KeyError::Encoding(err.to_string()))?;

        let key_id = key_id.into();
        let public_jwk = PublicJwk {
            kty: "RSA".to_string(),
            kid: key_id.clone(),
            alg: "RS256".to_string(),
            key_use: "sig".to_string(),
            n,
            e,
        };

        Ok(Self {
            key_id,
            encoding_key,
            decoding_key,
            public_jwk,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn algorithm(&self) -> Algorithm {
        SIGNING_ALGORITHM
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    pub fn public_jwk(&self) -> &PublicJwk {
        &self.public_jwk
    }

    pub fn jwk_set(&self) -> PublicJwkSet {
        PublicJwkSet {
            keys: vec![self.public_jwk.clone()],
        }
    }

    /// Private signing key. Only the issuer reads this.
    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id)
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}

/// Source of the process-wide key pair.
///
/// Called once during startup; implementations may block.
pub trait KeyProvider: Send + Sync {
    fn provide(&self) -> Result<KeyPair, KeyError>;

    /// Short label for startup logs.
    fn describe(&self) -> String;
}

/// Generates a new RSA key pair on every call.
#[derive(Debug, Clone)]
pub struct EphemeralRsaKeyProvider {
    key_id: String,
    bits: usize,
}

impl EphemeralRsaKeyProvider {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            bits: RSA_KEY_BITS,
        }
    }
}

impl KeyProvider for EphemeralRsaKeyProvider {
    fn provide(&self) -> Result<KeyPair, KeyError> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), self.bits)
            .map_err(|e| KeyError::Generation(e.to_string()))?;
        KeyPair::from_rsa_private_key(self.key_id.clone(), &private_key)
    }

    fn describe(&self) -> String {
        format!("ephemeral RSA-{} key '{}'", self.bits, self.key_id)
    }
}

/// Loads a PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`)
/// RSA private key from disk.
#[derive(Debug, Clone)]
pub struct PemFileKeyProvider {
    key_id: String,
    path: PathBuf,
}

impl PemFileKeyProvider {
    pub fn new(key_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key_id: key_id.into(),
            path: path.into(),
        }
    }
}

impl KeyProvider for PemFileKeyProvider {
    fn provide(&self) -> Result<KeyPair, KeyError> {
        let pem = std::fs::read_to_string(&self.path).map_err(|source| KeyError::Io {
            path: self.path.clone(),
            source,
        })?;

        let private_key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
            .map_err(|_| KeyError::Parse(self.path.clone()))?;

        KeyPair::from_rsa_private_key(self.key_id.clone(), &private_key)
    }

    fn describe(&self) -> String {
        format!("RSA key '{}' from {}", self.key_id, self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use crate::config::AuthSettings;
    use crate::test_support::{sample_identity, test_rsa_key};
    use std::sync::Arc;
    use rsa::pkcs8::EncodePrivateKey;
    use std::io::Write;

    #[test]
    fn jwk_exposes_public_components() {
        let pair = KeyPair::from_rsa_private_key("kid-1", test_rsa_key()).unwrap();
        let jwk = pair.public_jwk();
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.kid, "kid-1");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.e, "AQAB");
        // 2048-bit modulus is 256 bytes, 342 base64url chars unpadded
        assert_eq!(jwk.n.len(), 342);
    }

    #[test]
    fn jwk_set_serializes_use_field() {
        let pair = KeyPair::from_rsa_private_key("kid-1", test_rsa_key()).unwrap();
        let json = serde_json::to_value(pair.jwk_set()).unwrap();
        assert_eq!(json["keys"][0]["use"], "sig");
        assert_eq!(json["keys"][0]["kid"], "kid-1");
        assert!(json["keys"][0].get("d").is_none());
    }

    #[test]
    fn debug_output_hides_key_material() {
        let pair = KeyPair::from_rsa_private_key("kid-1", test_rsa_key()).unwrap();
        let debug = format!("{pair:?}");
        assert!(debug.contains("kid-1"));
        assert!(!debug.contains(&pair.public_jwk().n));
    }

    #[test]
    fn pem_provider_loads_pkcs8_key() {
        let pem = test_rsa_key().to_pkcs8_pem(Default::default()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();

        let provider = PemFileKeyProvider::new("durable", file.path());
        let pair = provider.provide().unwrap();
        assert_eq!(pair.key_id(), "durable");

        let expected = KeyPair::from_rsa_private_key("durable", test_rsa_key()).unwrap();
        assert_eq!(pair.public_jwk(), expected.public_jwk());
    }

    #[test]
    fn pem_provider_loads_pkcs1_key() {
        let pem = test_rsa_key().to_pkcs1_pem(Default::default()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();

        let pair = PemFileKeyProvider::new("legacy", file.path()).provide().unwrap();
        assert_eq!(pair.key_id(), "legacy");
    }

    #[test]
    fn pem_provider_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a key").unwrap();

        let err = PemFileKeyProvider::new("k", file.path()).provide().unwrap_err();
        assert!(matches!(err, KeyError::Parse(_)));
    }

    #[test]
    fn pem_provider_reports_missing_file() {
        let err = PemFileKeyProvider::new("k", "/nonexistent/key.pem")
            .provide()
            .unwrap_err();
        assert!(matches!(err, KeyError::Io { .. }));
    }

    #[test]
    fn ephemeral_provider_describes_itself() {
        let provider = EphemeralRsaKeyProvider::new("dad-marketplace-key");
        assert_eq!(
            provider.describe(),
            "ephemeral RSA-2048 key 'dad-marketplace-key'"
        );
    }

    #[test]
    fn ephemeral_provider_generates_usable_rs256_key() {
        let pair = EphemeralRsaKeyProvider::new("fresh").provide().unwrap();
        assert_eq!(pair.key_id(), "fresh");
        assert_eq!(pair.algorithm(), SIGNING_ALGORITHM);

        let jwk = pair.public_jwk();
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.n.len(), 342);
        assert_ne!(jwk.n, KeyPair::from_rsa_private_key("k", test_rsa_key()).unwrap().public_jwk().n);

        let service = TokenService::new(Arc::new(pair), &AuthSettings::default()).unwrap();
        let token = service.issuer().issue_access_token(&sample_identity()).unwrap();
        let claims = service.verifier().verify(&token).unwrap();
        assert!(claims.is_access_token());
        assert_eq!(claims.subject(), "12345678");
    }

    #[test]
    fn short_keys_are_rejected() {
        let weak = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let err = KeyPair::from_rsa_private_key("weak", &weak).unwrap_err();
        assert!(matches!(err, KeyError::WeakKey { bits: 1024 }));
    }
}
