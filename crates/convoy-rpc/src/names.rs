// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default service names and interface identifiers.
//!
//! A participant advertises, per RPC component, the list of interface
//! versions (IIDs) it supports; clients are negotiated from that list.

pub const PARTICIPANT_INFO_SERVICE: &str = "participant_info";
pub const PARTICIPANT_INFO_IID: &str = "participant_info.v1";

pub const STATE_MACHINE_SERVICE: &str = "participant_statemachine";
/// Legacy state machine dialect: transitions return a bare bool.
pub const STATE_MACHINE_IID_V1: &str = "participant_statemachine.v1";
/// Current state machine dialect: transitions return a JSON result.
pub const STATE_MACHINE_IID_V2: &str = "participant_statemachine.v2";

pub const CONFIGURATION_SERVICE: &str = "configuration";
pub const CONFIGURATION_IID: &str = "configuration.v1";

pub const LOGGING_SERVICE: &str = "logging_service";
pub const LOGGING_SERVICE_IID: &str = "logging_service.v1";

pub const LOGGING_SINK_SERVICE: &str = "logging_sink_service";
pub const LOGGING_SINK_IID: &str = "logging_sink_service.v1";

pub const HEALTH_SERVICE: &str = "health_service";
pub const HEALTH_IID: &str = "health_service.v1";

pub const HTTP_SERVER_SERVICE: &str = "http_server";
pub const HTTP_SERVER_IID: &str = "http_server.v1";

pub const DATA_REGISTRY_SERVICE: &str = "data_registry";
pub const DATA_REGISTRY_IID: &str = "data_registry.v1";

/// Service this library hosts for participants to push logs into.
pub const LOGGING_SINK_CLIENT_SERVICE: &str = "logging_sink_client";
