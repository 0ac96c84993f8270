// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.
//!
//! RSA key generation is slow, so one key is generated per test binary.

use std::sync::{Arc, OnceLock};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rsa::RsaPrivateKey;

use crate::auth::{KeyPair, TokenService, UserIdentity};
use crate::config::AuthSettings;

pub const TEST_KEY_ID: &str = "test-key";

pub fn test_rsa_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("test RSA key generation")
    })
}

pub fn test_key_pair() -> Arc<KeyPair> {
    static PAIR: OnceLock<Arc<KeyPair>> = OnceLock::new();
    PAIR.get_or_init(|| {
        Arc::new(KeyPair::from_rsa_private_key(TEST_KEY_ID, test_rsa_key()).expect("test key pair"))
    })
    .clone()
}

pub fn test_token_service() -> TokenService {
    TokenService::new(test_key_pair(), &AuthSettings::default()).expect("token service")
}

pub fn sample_identity() -> UserIdentity {
    UserIdentity::new("12345678", "alice")
        .with_display_name("Alice")
        .with_email("alice@example.com")
        .with_avatar_url("https://cdn.discordapp.com/avatars/12345678/abc.png")
}

/// Replace one character in the middle of the signature segment.
pub fn tamper_signature(token: &str) -> String {
    let (signed, signature) = token.rsplit_once('.').expect("three-part token");
    let mut chars: Vec<char> = signature.chars().collect();
    let idx = chars.len() / 2;
    chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
    format!("{signed}.{}", chars.into_iter().collect::<String>())
}

/// Rewrite the `sub` claim while keeping the original signature.
pub fn tamper_payload_subject(token: &str, subject: &str) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    let payload = URL_SAFE_NO_PAD.decode(parts[1]).expect("payload base64");
    let mut claims: serde_json::Value = serde_json::from_slice(&payload).expect("payload json");
    claims["sub"] = serde_json::Value::String(subject.to_string());
    let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("payload encode"));
    format!("{}.{}.{}", parts[0], forged, parts[2])
}
