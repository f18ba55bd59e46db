// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! convoy-rpc: Clients for the RPC services a participant exposes.
//!
//! Every client wraps a bus requester and speaks the JSON method
//! conventions of the participant services: info, state machine (two
//! dialects), configuration, logging, logging sink, health, http
//! server and data registry.

mod configuration;
mod data_registry;
mod error;
mod health;
mod http_server;
mod info;
mod logging;
mod names;
mod result;
mod statemachine;

#[cfg(any(test, feature = "test-support"))]
pub mod testkit;

pub use configuration::{ConfigurationClient, RemoteProperties};
pub use data_registry::{DataRegistryClient, StreamProperty, StreamType};
pub use error::{RemoteError, RpcError};
pub use health::HealthClient;
pub use http_server::HttpServerClient;
pub use info::ParticipantInfoClient;
pub use logging::{LoggerFilter, LoggingServiceClient, LoggingSinkClient, SinkProperties};
pub use names::*;
pub use result::remote_result;
pub use statemachine::{
    JsonStateMachineClient, LegacyStateMachineClient, StateMachineClient, StateMachineClientFactory,
};
