// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory loopback transport for tests.
//!
//! One `LoopbackBus` carries any number of system accesses. Scripted
//! participants are plain service maps; update events fan out
//! synchronously on the emitting thread. Servers created by the
//! library under test are registered bus-wide by url so tests can call
//! back into them like a remote participant would.

use crate::access::{
    Requester, RpcServer, RpcService, ServiceBus, ServiceUpdateEvent, ServiceUpdateEventType,
    SystemAccess, UpdateEventSink,
};
use crate::error::BusError;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Shared in-memory bus. Clones refer to the same bus.
#[derive(Clone)]
pub struct LoopbackBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    accesses: Mutex<HashMap<String, Arc<LoopbackAccess>>>,
    servers: Mutex<HashMap<String, Arc<LoopbackServer>>>,
    next_port: AtomicU32,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                accesses: Mutex::new(HashMap::new()),
                servers: Mutex::new(HashMap::new()),
                next_port: AtomicU32::new(20_000),
            }),
        }
    }

    /// Register this bus as the process-wide transport and return it.
    /// Every subsequent `connect` hands out this same bus.
    pub fn install() -> Self {
        let bus = LoopbackBus::new();
        let for_factory = bus.clone();
        crate::registry::register_transport(Arc::new(move |_system, _url| {
            Ok(Arc::new(for_factory.clone()) as Arc<dyn ServiceBus>)
        }));
        bus
    }

    /// Concrete access for scripting participants and events.
    pub fn access(&self, system_name: &str) -> Arc<LoopbackAccess> {
        let mut accesses = self.inner.accesses.lock();
        Arc::clone(
            accesses
                .entry(system_name.to_string())
                .or_insert_with(|| LoopbackAccess::new(system_name, Arc::downgrade(&self.inner))),
        )
    }

    /// Call a service on a server the library hosts on this bus, the
    /// way a remote participant pushing a log would.
    pub fn call_server(
        &self,
        url: &str,
        service: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, BusError> {
        let server = self
            .inner
            .servers
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| BusError::Transport(format!("no server at {url}")))?;
        server.dispatch(service, method, &params)
    }
}

impl Default for LoopbackBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceBus for LoopbackBus {
    fn system_access(&self, system_name: &str) -> Result<Arc<dyn SystemAccess>, BusError> {
        Ok(self.access(system_name))
    }
}

/// One scripted participant: a service map plus its advertised url.
#[derive(Clone)]
pub struct ScriptedParticipant {
    inner: Arc<ParticipantInner>,
}

struct ParticipantInner {
    name: String,
    url: String,
    services: Mutex<HashMap<String, Arc<dyn RpcService>>>,
}

impl ScriptedParticipant {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ParticipantInner {
                name: name.into(),
                url: url.into(),
                services: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn name(&self) -> String {
        self.inner.name.clone()
    }

    pub fn url(&self) -> String {
        self.inner.url.clone()
    }

    pub fn add_service(&self, service_name: impl Into<String>, service: Arc<dyn RpcService>) {
        self.inner
            .services
            .lock()
            .insert(service_name.into(), service);
    }

    pub fn remove_service(&self, service_name: &str) {
        self.inner.services.lock().remove(service_name);
    }

    fn requester(&self) -> Arc<dyn Requester> {
        Arc::new(LoopbackRequester {
            participant: Arc::clone(&self.inner),
        })
    }
}

struct LoopbackRequester {
    participant: Arc<ParticipantInner>,
}

impl Requester for LoopbackRequester {
    fn call(&self, service: &str, method: &str, params: Value) -> Result<Value, BusError> {
        let found = self.participant.services.lock().get(service).cloned();
        match found {
            Some(svc) => svc.handle(method, &params),
            None => Err(BusError::ServiceUnavailable {
                participant: self.participant.name.clone(),
                service: service.to_string(),
            }),
        }
    }
}

/// Access to one system on the loopback bus.
pub struct LoopbackAccess {
    system_name: String,
    bus: Weak<BusInner>,
    participants: Mutex<BTreeMap<String, ScriptedParticipant>>,
    sinks: Mutex<Vec<Arc<dyn UpdateEventSink>>>,
    discovery_script: Mutex<VecDeque<BTreeMap<String, String>>>,
}

impl LoopbackAccess {
    fn new(system_name: &str, bus: Weak<BusInner>) -> Arc<Self> {
        Arc::new(Self {
            system_name: system_name.to_string(),
            bus,
            participants: Mutex::new(BTreeMap::new()),
            sinks: Mutex::new(Vec::new()),
            discovery_script: Mutex::new(VecDeque::new()),
        })
    }

    pub fn add_participant(&self, participant: ScriptedParticipant) {
        self.participants
            .lock()
            .insert(participant.name(), participant);
    }

    pub fn remove_participant(&self, name: &str) {
        self.participants.lock().remove(name);
    }

    pub fn participant(&self, name: &str) -> Option<ScriptedParticipant> {
        self.participants.lock().get(name).cloned()
    }

    /// Queue one discovery poll result. While the queue holds entries,
    /// each `discover` call pops one; afterwards discovery reflects the
    /// registered participants.
    pub fn push_discovery_result(&self, result: BTreeMap<String, String>) {
        self.discovery_script.lock().push_back(result);
    }

    /// Fire a `notify_alive` for a participant to every sink.
    pub fn emit_alive(&self, participant_name: &str) {
        self.emit(participant_name, ServiceUpdateEventType::NotifyAlive);
    }

    /// Fire a `notify_byebye` for a participant to every sink.
    pub fn emit_byebye(&self, participant_name: &str) {
        self.emit(participant_name, ServiceUpdateEventType::NotifyByebye);
    }

    fn emit(&self, participant_name: &str, event_type: ServiceUpdateEventType) {
        let host_url = self
            .participant(participant_name)
            .map(|p| p.url())
            .unwrap_or_default();
        let event = ServiceUpdateEvent {
            service_name: participant_name.to_string(),
            system_name: self.system_name.clone(),
            host_url,
            event_type,
        };
        let sinks = self.sinks.lock().clone();
        for sink in sinks {
            sink.update_event(&event);
        }
    }
}

impl SystemAccess for LoopbackAccess {
    fn system_name(&self) -> String {
        self.system_name.clone()
    }

    fn discover(&self, _timeout: Duration) -> Result<BTreeMap<String, String>, BusError> {
        if let Some(scripted) = self.discovery_script.lock().pop_front() {
            return Ok(scripted);
        }
        Ok(self
            .participants
            .lock()
            .iter()
            .map(|(name, p)| (name.clone(), p.url()))
            .collect())
    }

    fn requester(&self, participant_name: &str) -> Option<Arc<dyn Requester>> {
        self.participants
            .lock()
            .get(participant_name)
            .map(ScriptedParticipant::requester)
    }

    fn create_server(&self, server_name: &str, _url: &str) -> Result<Arc<dyn RpcServer>, BusError> {
        let bus = self
            .bus
            .upgrade()
            .ok_or_else(|| BusError::Transport("loopback bus is gone".into()))?;
        let port = bus.next_port.fetch_add(1, Ordering::Relaxed);
        let url = format!("http://loopback:{port}/{server_name}");
        let server = Arc::new(LoopbackServer {
            url: url.clone(),
            services: Mutex::new(HashMap::new()),
        });
        bus.servers.lock().insert(url, Arc::clone(&server));
        Ok(server)
    }

    fn register_update_sink(&self, sink: Arc<dyn UpdateEventSink>) -> Result<(), BusError> {
        self.sinks.lock().push(sink);
        Ok(())
    }

    fn deregister_update_sink(&self, sink: &Arc<dyn UpdateEventSink>) -> Result<(), BusError> {
        self.sinks
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, sink));
        Ok(())
    }
}

struct LoopbackServer {
    url: String,
    services: Mutex<HashMap<String, Arc<dyn RpcService>>>,
}

impl LoopbackServer {
    fn dispatch(&self, service: &str, method: &str, params: &Value) -> Result<Value, BusError> {
        let found = self.services.lock().get(service).cloned();
        match found {
            Some(svc) => svc.handle(method, params),
            None => Err(BusError::ServiceUnavailable {
                participant: self.url.clone(),
                service: service.to_string(),
            }),
        }
    }
}

impl RpcServer for LoopbackServer {
    fn register_service(&self, name: &str, service: Arc<dyn RpcService>) -> Result<(), BusError> {
        self.services.lock().insert(name.to_string(), service);
        Ok(())
    }

    fn unregister_service(&self, name: &str) -> Result<(), BusError> {
        self.services.lock().remove(name);
        Ok(())
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}
