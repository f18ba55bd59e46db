// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State machine clients, one per supported wire dialect.
//!
//! The current dialect returns a JSON result per transition; the
//! legacy dialect returns a bare bool. Which one a participant speaks
//! is negotiated from its advertised IID list, first supported wins.

use crate::error::RpcError;
use crate::names::{STATE_MACHINE_IID_V1, STATE_MACHINE_IID_V2};
use crate::result::{expect_bool, expect_str, remote_result};
use convoy_bus::Requester;
use convoy_core::ParticipantState;
use serde_json::json;
use std::sync::Arc;

/// Remote state machine of one participant.
///
/// `state` never fails: a participant that cannot answer reports
/// `Unreachable`. Transitions fail with [`RpcError::Denied`] when the
/// remote state machine refuses the change.
pub trait StateMachineClient: Send + Sync {
    fn state(&self) -> ParticipantState;
    fn load(&self) -> Result<(), RpcError>;
    fn unload(&self) -> Result<(), RpcError>;
    fn initialize(&self) -> Result<(), RpcError>;
    fn deinitialize(&self) -> Result<(), RpcError>;
    fn start(&self) -> Result<(), RpcError>;
    fn stop(&self) -> Result<(), RpcError>;
    fn pause(&self) -> Result<(), RpcError>;
    fn shutdown(&self) -> Result<(), RpcError>;
}

impl std::fmt::Debug for dyn StateMachineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachineClient")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Remote state names are capitalized on the wire.
fn state_from_remote_name(name: &str) -> ParticipantState {
    match name {
        "Unloaded" => ParticipantState::Unloaded,
        "Loaded" => ParticipantState::Loaded,
        "Initialized" => ParticipantState::Initialized,
        "Paused" => ParticipantState::Paused,
        "Running" => ParticipantState::Running,
        _ => ParticipantState::Unreachable,
    }
}

fn query_state(requester: &Arc<dyn Requester>, component: &str) -> ParticipantState {
    const METHOD: &str = "getCurrentStateName";
    let reply = match requester.call(component, METHOD, json!({})) {
        Ok(reply) => reply,
        Err(_) => return ParticipantState::Unreachable,
    };
    match expect_str(METHOD, &reply) {
        Ok(name) => state_from_remote_name(&name),
        Err(_) => ParticipantState::Unreachable,
    }
}

/// Current dialect: every transition replies with a JSON result whose
/// non-zero code carries the remote denial reason.
pub struct JsonStateMachineClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl JsonStateMachineClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    fn change_state(&self, transition: &str, method: &str) -> Result<(), RpcError> {
        let reply = self
            .requester
            .call(&self.component, method, json!({}))
            .map_err(|e| RpcError::transport(method, e))?;
        remote_result(&reply).map_err(|remote| RpcError::Denied {
            transition: transition.to_string(),
            reason: remote.to_string(),
        })
    }
}

impl StateMachineClient for JsonStateMachineClient {
    fn state(&self) -> ParticipantState {
        query_state(&self.requester, &self.component)
    }

    fn load(&self) -> Result<(), RpcError> {
        self.change_state("load", "load")
    }

    fn unload(&self) -> Result<(), RpcError> {
        self.change_state("unload", "unload")
    }

    fn initialize(&self) -> Result<(), RpcError> {
        self.change_state("initialize", "initialize")
    }

    fn deinitialize(&self) -> Result<(), RpcError> {
        self.change_state("deinitialize", "deinitialize")
    }

    fn start(&self) -> Result<(), RpcError> {
        self.change_state("start", "start")
    }

    fn stop(&self) -> Result<(), RpcError> {
        self.change_state("stop", "stop")
    }

    fn pause(&self) -> Result<(), RpcError> {
        self.change_state("pause", "pause")
    }

    fn shutdown(&self) -> Result<(), RpcError> {
        self.change_state("shutdown", "exit")
    }
}

/// Legacy dialect: transitions reply with a bare bool and carry no
/// remote reason beyond the refusal itself.
pub struct LegacyStateMachineClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl LegacyStateMachineClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    fn change_state(&self, transition: &str, method: &str) -> Result<(), RpcError> {
        let reply = self
            .requester
            .call(&self.component, method, json!({}))
            .map_err(|e| RpcError::transport(method, e))?;
        if expect_bool(method, &reply)? {
            Ok(())
        } else {
            Err(RpcError::Denied {
                transition: transition.to_string(),
                reason: format!("RPC service '{STATE_MACHINE_IID_V1}' {method}() returned 'false'"),
            })
        }
    }
}

impl StateMachineClient for LegacyStateMachineClient {
    fn state(&self) -> ParticipantState {
        query_state(&self.requester, &self.component)
    }

    fn load(&self) -> Result<(), RpcError> {
        self.change_state("load", "load")
    }

    fn unload(&self) -> Result<(), RpcError> {
        self.change_state("unload", "unload")
    }

    fn initialize(&self) -> Result<(), RpcError> {
        self.change_state("initialize", "initialize")
    }

    fn deinitialize(&self) -> Result<(), RpcError> {
        self.change_state("deinitialize", "deinitialize")
    }

    fn start(&self) -> Result<(), RpcError> {
        self.change_state("start", "start")
    }

    fn stop(&self) -> Result<(), RpcError> {
        self.change_state("stop", "stop")
    }

    fn pause(&self) -> Result<(), RpcError> {
        self.change_state("pause", "pause")
    }

    fn shutdown(&self) -> Result<(), RpcError> {
        self.change_state("shutdown", "exit")
    }
}

/// Picks the dialect from the participant's advertised IID list.
pub struct StateMachineClientFactory {
    iid: String,
    component: String,
}

impl StateMachineClientFactory {
    /// `advertised` comes from the info service; the first entry wins.
    /// An empty list falls back to the current dialect so a client
    /// still exists to report unreachability.
    pub fn from_advertised(advertised: &[String], component: impl Into<String>) -> Self {
        let iid = advertised
            .first()
            .cloned()
            .unwrap_or_else(|| STATE_MACHINE_IID_V2.to_string());
        tracing::debug!(%iid, "negotiated state machine dialect");
        Self {
            iid,
            component: component.into(),
        }
    }

    pub fn iid(&self) -> &str {
        &self.iid
    }

    pub fn client(
        &self,
        requester: Arc<dyn Requester>,
    ) -> Result<Arc<dyn StateMachineClient>, RpcError> {
        match self.iid.as_str() {
            STATE_MACHINE_IID_V2 => Ok(Arc::new(JsonStateMachineClient::new(
                requester,
                self.component.clone(),
            ))),
            STATE_MACHINE_IID_V1 => Ok(Arc::new(LegacyStateMachineClient::new(
                requester,
                self.component.clone(),
            ))),
            other => Err(RpcError::UnsupportedIid(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "statemachine_tests.rs"]
mod tests;
