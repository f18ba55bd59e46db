// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy owning the remote connections to one participant.
//!
//! Clients connect lazily and are cached. The info service is the
//! gatekeeper: while it cannot be reached the participant counts as
//! unreachable and no other client is attempted. The state machine
//! dialect is negotiated once from the participant's advertised IID
//! list.

use crate::error::SystemError;
use crate::health::ParticipantHealthListener;
use crate::logging::SystemLogger;
use crate::props::{INIT_PRIORITY_PROPERTY, SERVICE_BUS_NODE, START_PRIORITY_PROPERTY};
use crate::system_log;
use convoy_bus::{Requester, SystemAccess, UpdateEventSink};
use convoy_core::{ParticipantHealthUpdate, ParticipantState, Severity};
use convoy_rpc::{
    ConfigurationClient, HealthClient, HttpServerClient, LoggingServiceClient, LoggingSinkClient,
    ParticipantInfoClient, RpcError, StateMachineClient, StateMachineClientFactory,
    CONFIGURATION_SERVICE, HEALTH_SERVICE, HTTP_SERVER_SERVICE, LOGGING_SERVICE_IID,
    LOGGING_SINK_SERVICE, PARTICIPANT_INFO_SERVICE, STATE_MACHINE_SERVICE,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Handle on one participant of a system. Clones share the same
/// connection state.
#[derive(Clone)]
pub struct ParticipantProxy {
    inner: Arc<ProxyInner>,
}

impl std::fmt::Debug for ParticipantProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantProxy")
            .field("name", &self.inner.name)
            .field("url", &self.inner.url)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct IidCache {
    by_iid: HashMap<String, Vec<String>>,
    last_state: Option<ParticipantState>,
}

struct ProxyInner {
    name: String,
    url: String,
    system_name: String,
    log_server_url: String,
    #[allow(dead_code)]
    default_timeout: Duration,
    logger: Arc<SystemLogger>,
    access: Arc<dyn SystemAccess>,

    init_priority: Mutex<i32>,
    start_priority: Mutex<i32>,
    additional_info: Mutex<HashMap<String, String>>,

    info: Mutex<Option<Arc<ParticipantInfoClient>>>,
    state_machine: Mutex<Option<Arc<dyn StateMachineClient>>>,
    state_machine_factory: Mutex<Option<Arc<StateMachineClientFactory>>>,
    configuration: Mutex<Option<Arc<ConfigurationClient>>>,
    logging_service: Mutex<Option<Arc<LoggingServiceClient>>>,
    logging_sink: Mutex<Option<Arc<LoggingSinkClient>>>,
    health: Mutex<Option<Arc<HealthClient>>>,
    http_server: Mutex<Option<Arc<HttpServerClient>>>,
    iid_cache: Mutex<IidCache>,

    registered_logging: Arc<AtomicBool>,
    health_listener: Arc<ParticipantHealthListener>,
    health_listener_sink: Arc<dyn UpdateEventSink>,
    health_listener_running: AtomicBool,
    not_reachable: AtomicBool,
}

impl ParticipantProxy {
    /// Connect a proxy for `name` at `url`.
    ///
    /// Registers the health listener on the bus, resolves the info
    /// service, negotiates the state machine dialect and registers
    /// this process's log server with the participant.
    pub(crate) fn connect(
        name: &str,
        url: &str,
        system_name: &str,
        log_server_url: &str,
        logger: Arc<SystemLogger>,
        access: Arc<dyn SystemAccess>,
        default_timeout: Duration,
    ) -> ParticipantProxy {
        let requester = access.requester(name);
        let health_client =
            requester.map(|r| Arc::new(HealthClient::new(r, HEALTH_SERVICE)));

        let registered_logging = Arc::new(AtomicBool::new(false));
        let listener_logger = Arc::clone(&logger);
        let listener_gate = Arc::clone(&registered_logging);
        let health_listener = Arc::new(ParticipantHealthListener::new(
            health_client.clone(),
            name,
            system_name,
            move |severity, message| {
                // stay quiet until the log pipeline is up
                if listener_gate.load(Ordering::SeqCst) {
                    listener_logger.log(severity, message);
                }
            },
        ));
        let health_listener_sink: Arc<dyn UpdateEventSink> = Arc::clone(&health_listener) as _;
        if let Err(error) = access.register_update_sink(Arc::clone(&health_listener_sink)) {
            system_log!(
                logger,
                Severity::Warning,
                "Cannot register health listener for participant {}: {}",
                name,
                error
            );
        }

        let proxy = ParticipantProxy {
            inner: Arc::new(ProxyInner {
                name: name.to_string(),
                url: url.to_string(),
                system_name: system_name.to_string(),
                log_server_url: log_server_url.to_string(),
                default_timeout,
                logger,
                access,
                init_priority: Mutex::new(0),
                start_priority: Mutex::new(0),
                additional_info: Mutex::new(HashMap::new()),
                info: Mutex::new(None),
                state_machine: Mutex::new(None),
                state_machine_factory: Mutex::new(None),
                configuration: Mutex::new(None),
                logging_service: Mutex::new(None),
                logging_sink: Mutex::new(None),
                health: Mutex::new(health_client),
                http_server: Mutex::new(None),
                iid_cache: Mutex::new(IidCache::default()),
                registered_logging,
                health_listener,
                health_listener_sink,
                health_listener_running: AtomicBool::new(true),
                not_reachable: AtomicBool::new(false),
            }),
        };
        proxy.connect_standard_clients();
        proxy
    }

    /// Only when the info service answers is it worth connecting the
    /// remaining clients; every further connect would otherwise run
    /// into its own timeout.
    fn connect_standard_clients(&self) {
        if self.info_client().is_none() {
            return;
        }
        let _ = self.state_machine_client();
        let _ = self.configuration_client();
        if let Some(sink) = self.logging_sink_client() {
            match log_registrations::register(
                &sink,
                &self.inner.log_server_url,
                &self.inner.name,
                &self.inner.system_name,
            ) {
                Ok(()) => self.inner.registered_logging.store(true, Ordering::SeqCst),
                Err(error) => {
                    system_log!(
                        self.inner.logger,
                        Severity::Warning,
                        "Registration of log sink for participant {} failed: {}",
                        self.inner.name,
                        error
                    );
                }
            }
        }
    }

    pub fn name(&self) -> String {
        self.inner.name.clone()
    }

    pub fn url(&self) -> String {
        self.inner.url.clone()
    }

    pub fn system_name(&self) -> String {
        self.inner.system_name.clone()
    }

    fn requester(&self) -> Option<Arc<dyn Requester>> {
        let requester = self.inner.access.requester(&self.inner.name);
        if requester.is_none() {
            system_log!(
                self.inner.logger,
                Severity::Warning,
                "Participant {} is not discovered",
                self.inner.name
            );
        }
        requester
    }

    fn cached_client<T>(
        &self,
        slot: &Mutex<Option<Arc<T>>>,
        make: impl FnOnce(Arc<dyn Requester>) -> T,
    ) -> Option<Arc<T>> {
        if let Some(existing) = slot.lock().clone() {
            return Some(existing);
        }
        let client = Arc::new(make(self.requester()?));
        *slot.lock() = Some(Arc::clone(&client));
        Some(client)
    }

    pub fn info_client(&self) -> Option<Arc<ParticipantInfoClient>> {
        self.cached_client(&self.inner.info, |requester| {
            ParticipantInfoClient::new(requester, PARTICIPANT_INFO_SERVICE)
        })
    }

    pub fn configuration_client(&self) -> Option<Arc<ConfigurationClient>> {
        self.cached_client(&self.inner.configuration, |requester| {
            ConfigurationClient::new(requester, CONFIGURATION_SERVICE)
        })
    }

    pub fn logging_sink_client(&self) -> Option<Arc<LoggingSinkClient>> {
        self.cached_client(&self.inner.logging_sink, |requester| {
            LoggingSinkClient::new(requester, LOGGING_SINK_SERVICE)
        })
    }

    pub fn health_client(&self) -> Option<Arc<HealthClient>> {
        self.cached_client(&self.inner.health, |requester| {
            HealthClient::new(requester, HEALTH_SERVICE)
        })
    }

    pub fn http_server_client(&self) -> Option<Arc<HttpServerClient>> {
        self.cached_client(&self.inner.http_server, |requester| {
            HttpServerClient::new(requester, HTTP_SERVER_SERVICE)
        })
    }

    fn state_machine_factory(&self) -> Arc<StateMachineClientFactory> {
        if let Some(factory) = self.inner.state_machine_factory.lock().clone() {
            return factory;
        }
        let advertised = match self.info_client() {
            Some(info) => match info.rpc_component_iids(STATE_MACHINE_SERVICE) {
                Ok(iids) => iids,
                Err(error) => {
                    system_log!(
                        self.inner.logger,
                        Severity::Warning,
                        "Cannot negotiate state machine interface of participant {}: {}",
                        self.inner.name,
                        error
                    );
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let factory = Arc::new(StateMachineClientFactory::from_advertised(
            &advertised,
            STATE_MACHINE_SERVICE,
        ));
        *self.inner.state_machine_factory.lock() = Some(Arc::clone(&factory));
        factory
    }

    pub fn state_machine_client(&self) -> Option<Arc<dyn StateMachineClient>> {
        if let Some(existing) = self.inner.state_machine.lock().clone() {
            return Some(existing);
        }
        let factory = self.state_machine_factory();
        let requester = self.requester()?;
        match factory.client(requester) {
            Ok(client) => {
                *self.inner.state_machine.lock() = Some(Arc::clone(&client));
                Some(client)
            }
            Err(error) => {
                system_log!(
                    self.inner.logger,
                    Severity::Warning,
                    "Participant {}: {}",
                    self.inner.name,
                    error
                );
                None
            }
        }
    }

    pub fn logging_service_client(&self) -> Result<Arc<LoggingServiceClient>, SystemError> {
        if let Some(existing) = self.inner.logging_service.lock().clone() {
            return Ok(existing);
        }
        let component = self.first_component_supporting(LOGGING_SERVICE_IID)?;
        let requester = self
            .requester()
            .ok_or_else(|| SystemError::Unreachable {
                participant: self.inner.name.clone(),
            })?;
        let client = Arc::new(LoggingServiceClient::new(requester, component));
        *self.inner.logging_service.lock() = Some(Arc::clone(&client));
        Ok(client)
    }

    pub fn data_registry_client(
        &self,
    ) -> Result<convoy_rpc::DataRegistryClient, SystemError> {
        let component = self.first_component_supporting(convoy_rpc::DATA_REGISTRY_IID)?;
        let requester = self
            .requester()
            .ok_or_else(|| SystemError::Unreachable {
                participant: self.inner.name.clone(),
            })?;
        Ok(convoy_rpc::DataRegistryClient::new(requester, component))
    }

    fn first_component_supporting(&self, iid: &str) -> Result<String, SystemError> {
        self.components_supporting(iid)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                system_log!(
                    self.inner.logger,
                    Severity::Warning,
                    "Participant {} has no RPC service with iid {}",
                    self.inner.name,
                    iid
                );
                SystemError::ServiceUnsupported {
                    participant: self.inner.name.clone(),
                    iid: iid.to_string(),
                }
            })
    }

    /// Components advertising `iid`, resolved from the info service.
    /// The lookup is cached and invalidated whenever the participant's
    /// current state changes.
    pub fn components_supporting(&self, iid: &str) -> Result<Vec<String>, SystemError> {
        let info = self.info_client().ok_or_else(|| {
            system_log!(
                self.inner.logger,
                Severity::Fatal,
                "Participant {} is unreachable - RPC communication to resolve \
                 service components failed",
                self.inner.name
            );
            SystemError::Unreachable {
                participant: self.inner.name.clone(),
            }
        })?;

        let current = self.current_state();
        {
            let cache = self.inner.iid_cache.lock();
            if cache.last_state == Some(current) {
                if let Some(components) = cache.by_iid.get(iid) {
                    return Ok(components.clone());
                }
            }
        }

        let mut by_iid: HashMap<String, Vec<String>> = HashMap::new();
        for component in info.rpc_components().map_err(SystemError::from)? {
            for advertised in info
                .rpc_component_iids(&component)
                .map_err(SystemError::from)?
            {
                by_iid.entry(advertised).or_default().push(component.clone());
            }
        }

        let mut cache = self.inner.iid_cache.lock();
        cache.by_iid = by_iid;
        cache.last_state = Some(current);
        Ok(cache.by_iid.get(iid).cloned().unwrap_or_default())
    }

    /// State according to the already connected state machine client;
    /// `Unreachable` when none is connected yet.
    pub fn current_state(&self) -> ParticipantState {
        let client = self.inner.state_machine.lock().clone();
        match client {
            Some(state_machine) => state_machine.state(),
            None => ParticipantState::Unreachable,
        }
    }

    /// State as seen over the bus right now, connecting on demand.
    pub(crate) fn query_state(&self) -> ParticipantState {
        if self.is_not_reachable() {
            return ParticipantState::Unreachable;
        }
        match self.state_machine_client() {
            Some(state_machine) => state_machine.state(),
            None => {
                system_log!(
                    self.inner.logger,
                    Severity::Warning,
                    "Participant {} is unreachable - no state machine service \
                     could be resolved",
                    self.inner.name
                );
                ParticipantState::Unreachable
            }
        }
    }

    // --- priorities ---------------------------------------------------

    pub fn init_priority(&self) -> Result<i32, SystemError> {
        self.priority(INIT_PRIORITY_PROPERTY, &self.inner.init_priority)
    }

    pub fn set_init_priority(&self, priority: i32) -> Result<(), SystemError> {
        self.set_priority(INIT_PRIORITY_PROPERTY, priority, &self.inner.init_priority)
    }

    pub fn start_priority(&self) -> Result<i32, SystemError> {
        self.priority(START_PRIORITY_PROPERTY, &self.inner.start_priority)
    }

    pub fn set_start_priority(&self, priority: i32) -> Result<(), SystemError> {
        self.set_priority(START_PRIORITY_PROPERTY, priority, &self.inner.start_priority)
    }

    /// Priorities live in the participant's `service_bus` property
    /// node. Older participant builds lack that node; for those the
    /// value is kept on the proxy itself.
    fn priority(&self, property: &str, local: &Mutex<i32>) -> Result<i32, SystemError> {
        let Some(config) = self.configuration_client() else {
            system_log!(
                self.inner.logger,
                Severity::Warning,
                "Priority property {} of participant {} retrieved locally",
                property,
                self.inner.name
            );
            return Ok(*local.lock());
        };
        let props = match config.properties(SERVICE_BUS_NODE) {
            Ok(props) => props,
            Err(error) => {
                system_log!(
                    self.inner.logger,
                    Severity::Warning,
                    "Priority property {} is not available on participant {} ({}); \
                     retrieved locally",
                    property,
                    self.inner.name,
                    error
                );
                return Ok(*local.lock());
            }
        };
        match props.property(property) {
            Err(error) => {
                system_log!(
                    self.inner.logger,
                    Severity::Warning,
                    "Reading priority property {} of participant {} failed ({}); \
                     retrieved locally",
                    property,
                    self.inner.name,
                    error
                );
                Ok(*local.lock())
            }
            Ok(value) if value.is_empty() => {
                let message = format!(
                    "Priority property {property} is not found in property node \
                     {SERVICE_BUS_NODE} of participant {}",
                    self.inner.name
                );
                system_log!(self.inner.logger, Severity::Fatal, "{}", message);
                Err(SystemError::Property { message })
            }
            Ok(value) => value.trim().parse::<i32>().map_err(|parse_error| {
                let message = format!(
                    "Priority property {property} of participant {} has invalid \
                     value '{value}': {parse_error}",
                    self.inner.name
                );
                system_log!(self.inner.logger, Severity::Fatal, "{}", message);
                SystemError::Property { message }
            }),
        }
    }

    fn set_priority(
        &self,
        property: &str,
        priority: i32,
        local: &Mutex<i32>,
    ) -> Result<(), SystemError> {
        let Some(config) = self.configuration_client() else {
            system_log!(
                self.inner.logger,
                Severity::Warning,
                "Priority property {} of participant {} stored locally",
                property,
                self.inner.name
            );
            *local.lock() = priority;
            return Ok(());
        };
        let props = match config.properties(SERVICE_BUS_NODE) {
            Ok(props) => props,
            Err(error) => {
                system_log!(
                    self.inner.logger,
                    Severity::Warning,
                    "Priority property {} is not available on participant {} ({}); \
                     stored locally",
                    property,
                    self.inner.name,
                    error
                );
                *local.lock() = priority;
                return Ok(());
            }
        };
        let property_type = props.property_type(property).unwrap_or_default();
        match props.set_property(property, &priority.to_string(), &property_type) {
            Ok(true) => Ok(()),
            Ok(false) => {
                let message = format!(
                    "Priority property {property} could not be set in property node \
                     {SERVICE_BUS_NODE} of participant {}",
                    self.inner.name
                );
                system_log!(self.inner.logger, Severity::Fatal, "{}", message);
                Err(SystemError::Property { message })
            }
            Err(error) => {
                system_log!(
                    self.inner.logger,
                    Severity::Warning,
                    "Setting priority property {} on participant {} failed ({}); \
                     stored locally",
                    property,
                    self.inner.name,
                    error
                );
                *local.lock() = priority;
                Ok(())
            }
        }
    }

    // --- additional info ----------------------------------------------

    pub fn set_additional_info(&self, key: &str, value: &str) {
        self.inner
            .additional_info
            .lock()
            .insert(key.to_string(), value.to_string());
    }

    pub fn additional_info(&self, key: &str, default: &str) -> String {
        self.inner
            .additional_info
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    // --- logging registration -----------------------------------------

    pub fn logging_registered(&self) -> bool {
        self.inner.registered_logging.load(Ordering::SeqCst)
    }

    /// Deregister from the participant's log push and stop the health
    /// listener. Must run before a shutdown so no RPC lingers against
    /// a vanishing participant.
    pub fn deregister_logging(&self) {
        self.inner.deregister_logging();
    }

    // --- health -------------------------------------------------------

    pub fn participant_health(&self) -> Result<ParticipantHealthUpdate, SystemError> {
        if !self.health_listener_running() {
            system_log!(
                self.inner.logger,
                Severity::Fatal,
                "Participant {} health listener is deactivated",
                self.inner.name
            );
            return Err(SystemError::HealthListenerDisabled {
                participant: self.inner.name.clone(),
            });
        }
        Ok(self.inner.health_listener.participant_health())
    }

    pub fn set_health_listener_running(&self, running: bool) -> Result<(), SystemError> {
        let was_running = self
            .inner
            .health_listener_running
            .swap(running, Ordering::SeqCst);
        if was_running == running {
            return Ok(());
        }
        if running {
            self.inner
                .access
                .register_update_sink(Arc::clone(&self.inner.health_listener_sink))?;
        } else {
            self.inner
                .access
                .deregister_update_sink(&self.inner.health_listener_sink)?;
        }
        Ok(())
    }

    pub fn health_listener_running(&self) -> bool {
        self.inner.health_listener_running.load(Ordering::SeqCst)
    }

    // --- reachability -------------------------------------------------

    /// Flag set when the participant said goodbye; a flagged proxy is
    /// never used for RPC again.
    pub fn mark_not_reachable(&self) {
        self.inner.not_reachable.store(true, Ordering::SeqCst);
    }

    pub fn is_not_reachable(&self) -> bool {
        self.inner.not_reachable.load(Ordering::SeqCst)
    }

    /// Copy configuration onto another proxy: local priorities and
    /// additional info travel, monitor registrations and connected
    /// clients do not.
    pub fn copy_values_to(&self, other: &ParticipantProxy) {
        *other.inner.init_priority.lock() = *self.inner.init_priority.lock();
        *other.inner.start_priority.lock() = *self.inner.start_priority.lock();
        *other.inner.additional_info.lock() = self.inner.additional_info.lock().clone();
    }
}

impl ProxyInner {
    fn deregister_logging(&self) {
        self.health_listener.deactivate_logging();
        if self.registered_logging.load(Ordering::SeqCst) && !self.not_reachable.load(Ordering::SeqCst)
        {
            let sink = self.logging_sink.lock().clone();
            if let Some(sink) = sink {
                match log_registrations::unregister(
                    &sink,
                    &self.log_server_url,
                    &self.name,
                    &self.system_name,
                ) {
                    Ok(()) => self.registered_logging.store(false, Ordering::SeqCst),
                    Err(error) => {
                        system_log!(
                            self.logger,
                            Severity::Warning,
                            "Deregistration of log sink for participant {} failed: {}",
                            self.name,
                            error
                        );
                    }
                }
            }
        }
        if self.health_listener_running.swap(false, Ordering::SeqCst) {
            let _ = self
                .access
                .deregister_update_sink(&self.health_listener_sink);
        }
    }
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        self.deregister_logging();
    }
}

/// Several `System` instances sharing one name also share the log
/// registration against each participant; the registration is
/// reference counted so one instance going away does not silence the
/// others.
mod log_registrations {
    use super::*;
    use std::sync::OnceLock;

    fn counts() -> &'static Mutex<HashMap<String, u32>> {
        static COUNTS: OnceLock<Mutex<HashMap<String, u32>>> = OnceLock::new();
        COUNTS.get_or_init(|| Mutex::new(HashMap::new()))
    }

    fn key(url: &str, participant: &str, system: &str) -> String {
        format!("{url}@{system}@{participant}")
    }

    pub(super) fn register(
        client: &LoggingSinkClient,
        url: &str,
        participant: &str,
        system: &str,
    ) -> Result<(), RpcError> {
        let mut counts = counts().lock();
        client.register_client(url)?;
        *counts.entry(key(url, participant, system)).or_insert(0) += 1;
        Ok(())
    }

    pub(super) fn unregister(
        client: &LoggingSinkClient,
        url: &str,
        participant: &str,
        system: &str,
    ) -> Result<(), RpcError> {
        let mut counts = counts().lock();
        let key = key(url, participant, system);
        match counts.get_mut(&key) {
            Some(count) if *count == 1 => {
                client.unregister_client(url)?;
                counts.remove(&key);
                Ok(())
            }
            Some(count) if *count > 1 => {
                *count -= 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
