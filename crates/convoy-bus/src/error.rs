// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-bus error type.

use thiserror::Error;

/// Errors surfaced by a service-bus transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    #[error(
        "no service-bus transport registered; set {env} or register one at startup",
        env = crate::registry::COMPONENTS_FILE_ENV
    )]
    NoTransport,

    #[error("cannot create a system access for '{system}' at url '{url}': {reason}")]
    AccessFailed {
        system: String,
        url: String,
        reason: String,
    },

    #[error("participant '{participant}' exposes no service '{service}'")]
    ServiceUnavailable {
        participant: String,
        service: String,
    },

    #[error("service '{service}' has no method '{method}'")]
    UnknownMethod { service: String, method: String },

    #[error("invalid parameters for {method}: {detail}")]
    InvalidParams { method: String, detail: String },

    #[error("transport failure: {0}")]
    Transport(String),
}
