// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clients for the logging service and the logging sink service.

use crate::error::RpcError;
use crate::result::{expect_i64, expect_str, name_list};
use convoy_bus::Requester;
use convoy_core::Severity;
use serde_json::json;
use std::sync::Arc;

/// Filter of one remote logger: minimum severity plus the sinks the
/// logger writes into.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggerFilter {
    pub severity: Severity,
    pub enabled_sinks: Vec<String>,
}

/// Client for a participant's logging service: per-logger filters and
/// sink configuration.
pub struct LoggingServiceClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl LoggingServiceClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    pub fn set_logger_filter(
        &self,
        logger_name: &str,
        filter: &LoggerFilter,
    ) -> Result<(), RpcError> {
        const METHOD: &str = "setLoggerFilter";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({
                    "logger_name": logger_name,
                    "severity": filter.severity as i64,
                    "enable_sinks": filter.enabled_sinks.join(","),
                }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        match expect_i64(METHOD, &reply)? {
            0 => Ok(()),
            code => Err(RpcError::Failed {
                method: METHOD.to_string(),
                code,
            }),
        }
    }

    pub fn logger_filter(&self, logger_name: &str) -> Result<LoggerFilter, RpcError> {
        const METHOD: &str = "getLoggerFilter";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({ "logger_name": logger_name }))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        let severity = reply
            .get("severity")
            .and_then(serde_json::Value::as_i64)
            .map(Severity::from_wire)
            .ok_or_else(|| RpcError::malformed(METHOD, "missing severity"))?;
        let enabled_sinks = name_list(
            METHOD,
            reply
                .get("enable_sinks")
                .unwrap_or(&serde_json::Value::String(String::new())),
        )?;
        Ok(LoggerFilter {
            severity,
            enabled_sinks,
        })
    }

    pub fn loggers(&self) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getLoggers";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }

    pub fn sinks(&self) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getSinks";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }

    pub fn sink_properties(&self, sink_name: &str) -> SinkProperties {
        SinkProperties {
            requester: Arc::clone(&self.requester),
            component: self.component.clone(),
            sink: sink_name.to_string(),
        }
    }
}

/// Property accessors of one logging sink.
pub struct SinkProperties {
    requester: Arc<dyn Requester>,
    component: String,
    sink: String,
}

impl SinkProperties {
    pub fn property(&self, name: &str) -> Result<String, RpcError> {
        const METHOD: &str = "getSinkProperty";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "name": name, "sink": self.sink }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        expect_str(
            METHOD,
            reply.get("value").unwrap_or(&serde_json::Value::Null),
        )
    }

    pub fn property_type(&self, name: &str) -> Result<String, RpcError> {
        const METHOD: &str = "getSinkProperty";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "name": name, "sink": self.sink }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        expect_str(METHOD, reply.get("type").unwrap_or(&serde_json::Value::Null))
    }

    pub fn set_property(&self, name: &str, value: &str, ty: &str) -> Result<bool, RpcError> {
        const METHOD: &str = "setSinkProperty";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "name": name, "sink": self.sink, "type": ty, "value": value }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        Ok(expect_i64(METHOD, &reply)? == 0)
    }

    pub fn property_names(&self) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getSinkProperties";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({ "sink": self.sink }))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }
}

/// Client for the logging sink service: registers this process's log
/// server url with a participant so it pushes its logs to us.
pub struct LoggingSinkClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl LoggingSinkClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    pub fn register_client(&self, url: &str) -> Result<(), RpcError> {
        const METHOD: &str = "registerRPCLoggingSinkClient";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "url": url, "filter": "", "severity": Severity::Info as i64 }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        match expect_i64(METHOD, &reply)? {
            0 => Ok(()),
            code => Err(RpcError::Failed {
                method: METHOD.to_string(),
                code,
            }),
        }
    }

    pub fn unregister_client(&self, url: &str) -> Result<(), RpcError> {
        const METHOD: &str = "unregisterRPCLoggingSinkClient";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({ "url": url }))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        match expect_i64(METHOD, &reply)? {
            0 => Ok(()),
            code => Err(RpcError::Failed {
                method: METHOD.to_string(),
                code,
            }),
        }
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
