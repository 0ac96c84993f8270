// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use marketplace_auth::{
    api::router,
    auth::{
        EphemeralRsaKeyProvider, InMemoryUserDirectory, KeyProvider, PemFileKeyProvider,
        TokenService,
    },
    config::{AuthSettings, ServerConfig},
    state::AppState,
    telemetry::init_tracing,
};
use tracing::{error, info, warn};

fn exit_with(message: &str, err: &dyn std::fmt::Display) -> ! {
    error!(error = %err, "{message}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid server configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(server_config.log_format);

    let settings = AuthSettings::from_env()
        .unwrap_or_else(|e| exit_with("Invalid authentication configuration", &e));

    // Key material must exist before any request is served.
    let provider: Box<dyn KeyProvider> = match &settings.key_pem_path {
        Some(path) => Box::new(PemFileKeyProvider::new(settings.key_id.clone(), path.clone())),
        None => Box::new(EphemeralRsaKeyProvider::new(settings.key_id.clone())),
    };
    info!(provider = %provider.describe(), "Loading signing key");
    let keys = match tokio::task::spawn_blocking(move || provider.provide()).await {
        Ok(Ok(keys)) => Arc::new(keys),
        Ok(Err(e)) => exit_with("Failed to provide signing key", &e),
        Err(e) => exit_with("Signing key task failed", &e),
    };
    info!(kid = keys.key_id(), "Signing key ready");

    let tokens = TokenService::new(keys, &settings)
        .unwrap_or_else(|e| exit_with("Invalid token settings", &e));

    let users = match &server_config.users_seed_file {
        Some(path) => InMemoryUserDirectory::load(path)
            .unwrap_or_else(|e| exit_with("Failed to load user seed file", &e)),
        None => {
            warn!("No user seed file configured; token refresh will find no users");
            InMemoryUserDirectory::new()
        }
    };
    info!(users = users.len(), "User directory ready");

    let state = AppState::new(tokens, Arc::new(users), &settings);
    let app = router(state);
    let addr = server_config.addr;

    let served = match &server_config.tls {
        Some(tls) => {
            if rustls::crypto::ring::default_provider().install_default().is_err() {
                warn!("rustls crypto provider already installed");
            }
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .unwrap_or_else(|e| exit_with("Failed to load TLS certificate", &e));
            info!(%addr, "Marketplace auth listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!(%addr, "Marketplace auth listening on http (docs at /docs)");
            axum_server::bind(addr).serve(app.into_make_service()).await
        }
    };

    if let Err(e) = served {
        exit_with("Server failed", &e);
    }
}
