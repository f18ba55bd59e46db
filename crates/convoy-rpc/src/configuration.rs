// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the configuration service.

use crate::error::RpcError;
use crate::result::{expect_i64, expect_str, name_list};
use convoy_bus::Requester;
use serde_json::json;
use std::sync::Arc;

/// Access to a participant's property tree.
pub struct ConfigurationClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl ConfigurationClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    /// Handle on the properties below `node`. The node's existence is
    /// checked remotely; an unknown node fails here.
    pub fn properties(&self, node: &str) -> Result<RemoteProperties, RpcError> {
        const METHOD: &str = "getPropertyNames";
        // probing the names validates the node path
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({ "path": node }))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)?;
        Ok(RemoteProperties {
            requester: Arc::clone(&self.requester),
            component: self.component.clone(),
            node: node.to_string(),
        })
    }
}

/// Property accessors scoped to one node of the remote tree.
pub struct RemoteProperties {
    requester: Arc<dyn Requester>,
    component: String,
    node: String,
}

impl RemoteProperties {
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Missing properties read as the empty string, like the remote
    /// tree reports them.
    pub fn property(&self, name: &str) -> Result<String, RpcError> {
        const METHOD: &str = "getProperty";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "path": self.node, "name": name }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        expect_str(METHOD, &reply)
    }

    /// Returns `Ok(false)` when the remote tree refuses the value.
    pub fn set_property(&self, name: &str, value: &str, ty: &str) -> Result<bool, RpcError> {
        const METHOD: &str = "setProperty";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "path": self.node, "name": name, "value": value, "type": ty }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        Ok(expect_i64(METHOD, &reply)? == 0)
    }

    pub fn property_type(&self, name: &str) -> Result<String, RpcError> {
        const METHOD: &str = "getPropertyType";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "path": self.node, "name": name }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        expect_str(METHOD, &reply)
    }

    pub fn property_names(&self) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getPropertyNames";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({ "path": self.node }))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }
}

#[cfg(test)]
#[path = "configuration_tests.rs"]
mod tests;
