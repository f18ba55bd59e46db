// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! convoy-bus: Service-bus contracts and membership discovery.
//!
//! Defines the traits the controller needs from a service-bus
//! transport (system access, requesters, servers, update events), the
//! process-wide connection registry, the polling discovery helper and
//! the shutdown-notification listener. The actual transport is
//! pluggable; a loopback in-memory implementation ships behind the
//! `test-support` feature.

mod access;
mod discovery;
mod error;
mod registry;
mod shutdown;

#[cfg(any(test, feature = "test-support"))]
pub mod loopback;

pub use access::{
    Requester, RpcServer, RpcService, ServiceBus, ServiceUpdateEvent, ServiceUpdateEventType,
    SystemAccess, UpdateEventSink, DISCOVER_ALL_SYSTEMS, USE_DEFAULT_URL,
};
pub use discovery::{
    discover_participants, discover_participants_by_count, discover_participants_by_names,
    split_scoped_name, Discovered, DiscoveryError, DISCOVERY_POLL_PERIOD,
};
pub use error::BusError;
pub use registry::{connect, register_transport, BusFactory, COMPONENTS_FILE_ENV};
pub use shutdown::ParticipantShutdownListener;
