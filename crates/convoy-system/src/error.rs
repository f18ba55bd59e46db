// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the system controller.

use convoy_bus::{BusError, DiscoveryError};
use convoy_core::{ConfigError, ParticipantState};
use convoy_rpc::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("No participant in system '{system}' is reachable")]
    NoParticipants { system: String },

    #[error("At least one participant in system '{system}' is not reachable")]
    ParticipantsUnreachable { system: String },

    #[error("Invalid target state '{state}' for system '{system}'")]
    InvalidTargetState {
        system: String,
        state: ParticipantState,
    },

    #[error("Errors during state transition: {description}")]
    Transition { description: String },

    #[error("Shutdown failed: {description}")]
    Shutdown { description: String },

    #[error("Try to add a participant with name {name} which already exists")]
    DuplicateParticipant { name: String },

    #[error("No Participant with the name {name} found in system '{system}'")]
    UnknownParticipant { name: String, system: String },

    #[error("Participant {participant} is unreachable")]
    Unreachable { participant: String },

    #[error("Participant {participant} supports no service with iid '{iid}'")]
    ServiceUnsupported { participant: String, iid: String },

    #[error("{message}")]
    Property { message: String },

    #[error(
        "Participant {participant} health listener is deactivated; \
         activate it with set_health_listener_running before querying health"
    )]
    HealthListenerDisabled { participant: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}
