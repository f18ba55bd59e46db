// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the http server service (heartbeat configuration).

use crate::error::RpcError;
use convoy_bus::Requester;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub struct HttpServerClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl HttpServerClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    pub fn heartbeat_interval(&self) -> Result<Duration, RpcError> {
        const METHOD: &str = "getHeartbeatInterval";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        let ms = reply
            .get("interval_ms")
            .and_then(Value::as_u64)
            .ok_or_else(|| RpcError::malformed(METHOD, "missing interval_ms"))?;
        Ok(Duration::from_millis(ms))
    }

    pub fn set_heartbeat_interval(&self, interval: Duration) -> Result<(), RpcError> {
        const METHOD: &str = "setHeartbeatInterval";
        self.requester
            .call(
                &self.component,
                METHOD,
                json!({ "interval_ms": interval.as_millis() as u64 }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        Ok(())
    }
}
