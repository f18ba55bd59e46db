// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoding helpers for remote replies.

use crate::error::{RemoteError, RpcError};
use serde_json::Value;

/// Interpret a JSON result object `{error_code, description, line,
/// file, function}`. Code `0` means success.
pub fn remote_result(value: &Value) -> Result<(), RemoteError> {
    let code = value.get("error_code").and_then(Value::as_i64).unwrap_or(0);
    if code == 0 {
        return Ok(());
    }
    Err(RemoteError {
        code,
        description: value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        line: value.get("line").and_then(Value::as_i64).unwrap_or(0),
        file: value
            .get("file")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        function: value
            .get("function")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// A string reply, either bare or wrapped in a single-field object.
pub(crate) fn expect_str(method: &str, value: &Value) -> Result<String, RpcError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RpcError::malformed(method, format!("expected string, got {value}")))
}

pub(crate) fn expect_i64(method: &str, value: &Value) -> Result<i64, RpcError> {
    value
        .as_i64()
        .ok_or_else(|| RpcError::malformed(method, format!("expected integer, got {value}")))
}

pub(crate) fn expect_bool(method: &str, value: &Value) -> Result<bool, RpcError> {
    value
        .as_bool()
        .ok_or_else(|| RpcError::malformed(method, format!("expected bool, got {value}")))
}

/// A list of names, accepted either as a JSON array of strings or as a
/// comma-separated string (both shapes exist in the wild).
pub(crate) fn name_list(method: &str, value: &Value) -> Result<Vec<String>, RpcError> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .map(|entry| expect_str(method, entry))
            .collect(),
        Value::String(joined) => Ok(joined
            .split(',')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()),
        other => Err(RpcError::malformed(
            method,
            format!("expected name list, got {other}"),
        )),
    }
}
