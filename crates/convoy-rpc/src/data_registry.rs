// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the data registry service.

use crate::error::RpcError;
use crate::result::name_list;
use convoy_bus::Requester;
use serde_json::{json, Value};
use std::sync::Arc;

/// One typed property of a stream type description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamProperty {
    pub name: String,
    pub value: String,
    pub ty: String,
}

/// Stream type of one registered signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamType {
    pub meta_type: String,
    pub properties: Vec<StreamProperty>,
}

pub struct DataRegistryClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl DataRegistryClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    pub fn signal_in_names(&self) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getSignalInNames";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }

    pub fn signal_out_names(&self) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getSignalOutNames";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }

    pub fn stream_type(&self, signal_name: &str) -> Result<StreamType, RpcError> {
        const METHOD: &str = "getStreamType";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({ "name": signal_name }))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        let meta_type = reply
            .get("meta_type")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::malformed(METHOD, "missing meta_type"))?
            .to_string();
        let properties = reply
            .get("properties")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| StreamProperty {
                        name: text(entry, "name"),
                        value: text(entry, "value"),
                        ty: text(entry, "type"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(StreamType {
            meta_type,
            properties,
        })
    }
}

fn text(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
