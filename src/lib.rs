// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Marketplace Auth - Stateless JWT Authentication Service
//!
//! Issues and verifies RS256-signed access and refresh tokens, establishes
//! the caller's identity per request, and renews access tokens.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Key material, token issuing, verification and renewal
//! - `config` - Environment configuration
//! - `telemetry` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod test_support;
