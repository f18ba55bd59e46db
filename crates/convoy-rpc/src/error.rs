// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC client error types.

use convoy_bus::BusError;
use thiserror::Error;

/// Structured error carried in a remote JSON result.
#[derive(Debug, Clone, Error, PartialEq, Eq, Default)]
#[error(
    "Error: {code} - {description}: occurred in {function} - {file} line: {line}"
)]
pub struct RemoteError {
    pub code: i64,
    pub description: String,
    pub line: i64,
    pub file: String,
    pub function: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("RPC communication failed calling {method}: {source}")]
    Transport {
        method: String,
        #[source]
        source: BusError,
    },

    #[error("malformed reply from {method}: {detail}")]
    Malformed { method: String, detail: String },

    #[error("{method} failed with error code: {code}")]
    Failed { method: String, code: i64 },

    #[error("state machine '{transition}' denied: {reason}")]
    Denied { transition: String, reason: String },

    #[error("state machine service advertises unsupported interface '{0}'")]
    UnsupportedIid(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl RpcError {
    pub(crate) fn transport(method: &str, source: BusError) -> Self {
        RpcError::Transport {
            method: method.to_string(),
            source,
        }
    }

    pub(crate) fn malformed(method: &str, detail: impl Into<String>) -> Self {
        RpcError::Malformed {
            method: method.to_string(),
            detail: detail.into(),
        }
    }
}
