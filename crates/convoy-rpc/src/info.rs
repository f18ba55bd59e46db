// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the participant info service.

use crate::error::RpcError;
use crate::result::{expect_str, name_list};
use convoy_bus::Requester;
use serde_json::json;
use std::sync::Arc;

/// Queries which RPC components a participant exposes and which
/// interface versions each of them supports. This is the entry point
/// for all IID negotiation; if this service is unreachable the
/// participant is treated as gone.
pub struct ParticipantInfoClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl ParticipantInfoClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    pub fn rpc_components(&self) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getRPCComponents";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }

    pub fn rpc_component_iids(&self, component_name: &str) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "getRPCComponentIIDs";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "component": component_name }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        name_list(METHOD, &reply)
    }

    pub fn rpc_component_interface_definition(
        &self,
        component_name: &str,
        iid: &str,
    ) -> Result<String, RpcError> {
        const METHOD: &str = "getRPCComponentInterfaceDefinition";
        let reply = self
            .requester
            .call(
                &self.component,
                METHOD,
                json!({ "component": component_name, "iid": iid }),
            )
            .map_err(|e| RpcError::transport(METHOD, e))?;
        expect_str(METHOD, &reply)
    }
}

#[cfg(test)]
#[path = "info_tests.rs"]
mod tests;
