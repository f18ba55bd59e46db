// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traits a service-bus transport must provide.

use crate::error::BusError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// System-access name that discovers participants of every system.
/// Discovered identifiers then have the form `participant@system`.
pub const DISCOVER_ALL_SYSTEMS: &str = "*";

/// Placeholder for "let the transport pick its default url".
pub const USE_DEFAULT_URL: &str = "";

/// Kind of a service-update event observed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceUpdateEventType {
    NotifyAlive,
    NotifyByebye,
    Response,
}

/// A service-update event as delivered to registered sinks.
#[derive(Debug, Clone)]
pub struct ServiceUpdateEvent {
    pub service_name: String,
    pub system_name: String,
    pub host_url: String,
    pub event_type: ServiceUpdateEventType,
}

/// Receiver for service-update events.
///
/// Invoked on service-bus threads, concurrently with API calls.
/// Implementations must not panic and must not block for long.
pub trait UpdateEventSink: Send + Sync {
    fn update_event(&self, event: &ServiceUpdateEvent);
}

/// Request/response channel to one remote participant.
pub trait Requester: Send + Sync {
    /// Invoke `method` on the named service of the remote participant.
    fn call(&self, service: &str, method: &str, params: Value) -> Result<Value, BusError>;
}

/// A service hosted by this process, callable by remote participants.
pub trait RpcService: Send + Sync {
    fn handle(&self, method: &str, params: &Value) -> Result<Value, BusError>;
}

/// An RPC server hosted by this process.
pub trait RpcServer: Send + Sync {
    fn register_service(&self, name: &str, service: Arc<dyn RpcService>) -> Result<(), BusError>;
    fn unregister_service(&self, name: &str) -> Result<(), BusError>;
    /// Url remote participants use to call back into this server.
    fn url(&self) -> String;
}

/// Access to one named system on the bus.
pub trait SystemAccess: Send + Sync {
    fn system_name(&self) -> String;

    /// Discover participants, blocking up to `timeout`. Returns
    /// participant name (or `participant@system` for the all-systems
    /// access) mapped to the participant's url.
    fn discover(&self, timeout: Duration) -> Result<BTreeMap<String, String>, BusError>;

    /// Requester for a named participant; `None` when the participant
    /// has not been discovered.
    fn requester(&self, participant_name: &str) -> Option<Arc<dyn Requester>>;

    /// Create a named server on this system access.
    fn create_server(&self, server_name: &str, url: &str) -> Result<Arc<dyn RpcServer>, BusError>;

    fn register_update_sink(&self, sink: Arc<dyn UpdateEventSink>) -> Result<(), BusError>;

    /// Deregister a previously registered sink, matched by identity.
    fn deregister_update_sink(&self, sink: &Arc<dyn UpdateEventSink>) -> Result<(), BusError>;
}

/// A connection to the service bus, handing out system accesses.
pub trait ServiceBus: Send + Sync {
    fn system_access(&self, system_name: &str) -> Result<Arc<dyn SystemAccess>, BusError>;
}
