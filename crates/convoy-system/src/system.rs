// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `System` facade: membership, transitions, properties, health
//! and monitor wiring for one named fleet of participants.

use crate::error::SystemError;
use crate::health::ParticipantHealthStateAggregator;
use crate::logging::{RemoteLogForwarder, SystemLogger};
use crate::props::*;
use crate::proxy::ParticipantProxy;
use crate::system_log;
use crate::timer::ExecutionTimer;
use crate::transition::{
    ensure_transition_possible, ensure_valid_target, run_cohorts, PrioritySorting,
    TransitionGuard, TransitionJob,
};
use convoy_bus::{
    ParticipantShutdownListener, ServiceBus, SystemAccess, UpdateEventSink, USE_DEFAULT_URL,
};
use convoy_core::{
    next_state, state_to_trigger, target_reached, ConfigError, EventMonitor, ExecutionConfig,
    ParticipantHealth, ParticipantState, ParticipantStates, Severity, SystemState,
};
use convoy_rpc::{RemoteProperties, StateMachineClient};
use parking_lot::{Mutex, ReentrantMutex};
use rayon::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Default budget for a full fleet transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(30);
/// Default budget for discovery polls.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);
/// A participant without an alive event for this long counts offline.
pub const DEFAULT_LIVELINESS_TIMEOUT: Duration = Duration::from_secs(20);

pub(crate) const PARTICIPANT_DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const POOL_SIZE_FOR_PARALLEL_OPS: u8 = 6;

/// Member list shared with the shutdown listener.
///
/// The lock is reentrant: a shutdown notification arriving on a bus
/// thread may remove a member while an API call on another thread
/// iterates, and the removal callback may run under an outer hold on
/// the same thread. Borrows are always collect-then-drop so the
/// `RefCell` never sees overlapping mutable access.
#[derive(Default)]
pub(crate) struct Members {
    list: ReentrantMutex<RefCell<Vec<ParticipantProxy>>>,
}

impl Members {
    fn snapshot(&self) -> Vec<ParticipantProxy> {
        let guard = self.list.lock();
        let proxies = guard.borrow().clone();
        proxies
    }

    fn find(&self, name: &str) -> Option<ParticipantProxy> {
        let guard = self.list.lock();
        let found = guard.borrow().iter().find(|p| p.name() == name).cloned();
        found
    }

    fn len(&self) -> usize {
        let guard = self.list.lock();
        let len = guard.borrow().len();
        len
    }

    fn remove_by_name(&self, name: &str) -> Option<ParticipantProxy> {
        let guard = self.list.lock();
        let mut proxies = guard.borrow_mut();
        let position = proxies.iter().position(|p| p.name() == name)?;
        Some(proxies.remove(position))
    }

    fn retain(&self, keep: impl Fn(&ParticipantProxy) -> bool) {
        let guard = self.list.lock();
        guard.borrow_mut().retain(|proxy| keep(proxy));
    }

    fn clear(&self) {
        let guard = self.list.lock();
        guard.borrow_mut().clear();
    }
}

/// A named collection of participants under one controller.
pub struct System {
    name: String,
    url: String,
    logger: Arc<SystemLogger>,
    forwarder: Arc<RemoteLogForwarder>,
    // the connection must outlive every access and proxy on it
    _bus: Arc<dyn ServiceBus>,
    access: Arc<dyn SystemAccess>,
    members: Arc<Members>,
    execution: Mutex<ExecutionConfig>,
    liveliness_timeout: Mutex<Duration>,
    shutdown_listener: Mutex<Option<Arc<dyn UpdateEventSink>>>,
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// The eight transition verbs a hop can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Load,
    Unload,
    Initialize,
    Deinitialize,
    Start,
    Stop,
    Pause,
}

impl Verb {
    fn past_label(self) -> &'static str {
        match self {
            Verb::Load => "loaded",
            Verb::Unload => "unloaded",
            Verb::Initialize => "initialized",
            Verb::Deinitialize => "deinitialized",
            Verb::Start => "started",
            Verb::Stop => "stopped",
            Verb::Pause => "paused",
        }
    }

    fn sorting(self) -> PrioritySorting {
        match self {
            Verb::Initialize | Verb::Start => PrioritySorting::Decreasing,
            Verb::Deinitialize | Verb::Stop => PrioritySorting::Increasing,
            Verb::Load | Verb::Unload | Verb::Pause => PrioritySorting::None,
        }
    }

    fn call(self, state_machine: &dyn StateMachineClient) -> Result<(), convoy_rpc::RpcError> {
        match self {
            Verb::Load => state_machine.load(),
            Verb::Unload => state_machine.unload(),
            Verb::Initialize => state_machine.initialize(),
            Verb::Deinitialize => state_machine.deinitialize(),
            Verb::Start => state_machine.start(),
            Verb::Stop => state_machine.stop(),
            Verb::Pause => state_machine.pause(),
        }
    }
}

impl System {
    /// Connect to the bus and host the log pipeline for `name`.
    pub fn new(name: &str) -> Result<System, SystemError> {
        Self::with_url(name, USE_DEFAULT_URL)
    }

    pub fn with_url(name: &str, url: &str) -> Result<System, SystemError> {
        let bus = convoy_bus::connect(name, url)?;
        let access = bus.system_access(name)?;
        let logger = Arc::new(SystemLogger::new(name));
        let forwarder = Arc::new(RemoteLogForwarder::new());
        RemoteLogForwarder::init_rpc_service(&forwarder, name, &logger)?;

        let system = System {
            name: name.to_string(),
            url: url.to_string(),
            logger,
            forwarder,
            _bus: bus,
            access,
            members: Arc::new(Members::default()),
            execution: Mutex::new(ExecutionConfig::default()),
            liveliness_timeout: Mutex::new(DEFAULT_LIVELINESS_TIMEOUT),
            shutdown_listener: Mutex::new(None),
        };
        system.register_shutdown_listener()?;
        Ok(system)
    }

    fn register_shutdown_listener(&self) -> Result<(), SystemError> {
        let members: Weak<Members> = Arc::downgrade(&self.members);
        let logger = Arc::clone(&self.logger);
        let listener: Arc<dyn UpdateEventSink> = Arc::new(ParticipantShutdownListener::new(
            self.name.clone(),
            move |participant_name: &str| {
                let Some(members) = members.upgrade() else {
                    return;
                };
                if let Some(proxy) = members.remove_by_name(participant_name) {
                    proxy.mark_not_reachable();
                    system_log!(
                        logger,
                        Severity::Info,
                        "Participant {} announced shutdown and was removed from the system",
                        participant_name
                    );
                }
            },
        ));
        self.access.register_update_sink(Arc::clone(&listener))?;
        *self.shutdown_listener.lock() = Some(listener);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Copy of this system: identity and per-participant configuration
    /// travel, monitor registrations and cached connections do not.
    pub fn duplicate(&self) -> Result<System, SystemError> {
        let copy = System::with_url(&self.name, &self.url)?;
        for proxy in self.members.snapshot() {
            copy.add(&proxy.name(), &proxy.url())?;
            if let Some(new_proxy) = copy.members.find(&proxy.name()) {
                proxy.copy_values_to(&new_proxy);
            }
        }
        Ok(copy)
    }

    // --- membership ---------------------------------------------------

    fn connect_proxy(&self, name: &str, url: &str) -> ParticipantProxy {
        ParticipantProxy::connect(
            name,
            url,
            &self.name,
            &self.forwarder.url(),
            Arc::clone(&self.logger),
            Arc::clone(&self.access),
            PARTICIPANT_DEFAULT_TIMEOUT,
        )
    }

    pub fn add(&self, participant_name: &str, participant_url: &str) -> Result<(), SystemError> {
        let guard = self.members.list.lock();
        let duplicate = guard
            .borrow()
            .iter()
            .any(|p| p.name() == participant_name);
        if duplicate {
            system_log!(
                self.logger,
                Severity::Fatal,
                "Try to add a participant with name {} which already exists",
                participant_name
            );
            return Err(SystemError::DuplicateParticipant {
                name: participant_name.to_string(),
            });
        }
        let proxy = self.connect_proxy(participant_name, participant_url);
        guard.borrow_mut().push(proxy);
        Ok(())
    }

    /// Add several participants, connecting the proxies on a worker
    /// pool of the default width.
    pub fn add_async(&self, participants: &BTreeMap<String, String>) -> Result<(), SystemError> {
        self.add_async_with_pool(participants, POOL_SIZE_FOR_PARALLEL_OPS)
    }

    pub fn add_async_with_pool(
        &self,
        participants: &BTreeMap<String, String>,
        pool_size: u8,
    ) -> Result<(), SystemError> {
        let guard = self.members.list.lock();
        for participant_name in participants.keys() {
            let duplicate = guard.borrow().iter().any(|p| p.name() == *participant_name);
            if duplicate {
                system_log!(
                    self.logger,
                    Severity::Fatal,
                    "Try to add a participant with name {} which already exists",
                    participant_name
                );
                return Err(SystemError::DuplicateParticipant {
                    name: participant_name.clone(),
                });
            }
        }

        // each worker connects its own subset; the results are
        // assembled afterwards in input order
        let connected: Vec<ParticipantProxy> = match rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size.max(1) as usize)
            .build()
        {
            Ok(pool) => pool.install(|| {
                participants
                    .par_iter()
                    .map(|(name, url)| self.connect_proxy(name, url))
                    .collect()
            }),
            Err(error) => {
                tracing::warn!(%error, "worker pool unavailable, connecting serially");
                participants
                    .iter()
                    .map(|(name, url)| self.connect_proxy(name, url))
                    .collect()
            }
        };
        guard.borrow_mut().extend(connected);
        Ok(())
    }

    pub fn remove(&self, participant_name: &str) {
        let _ = self.members.remove_by_name(participant_name);
    }

    pub fn clear(&self) {
        self.members.clear();
    }

    /// Hard lookup: unknown names are an error.
    pub fn participant(&self, participant_name: &str) -> Result<ParticipantProxy, SystemError> {
        self.members.find(participant_name).ok_or_else(|| {
            system_log!(
                self.logger,
                Severity::Fatal,
                "No Participant with the name {} found",
                participant_name
            );
            SystemError::UnknownParticipant {
                name: participant_name.to_string(),
                system: self.name.clone(),
            }
        })
    }

    pub fn participants(&self) -> Vec<ParticipantProxy> {
        self.members.snapshot()
    }

    // --- state queries ------------------------------------------------

    /// Per-participant states right now. The timeout is carried for
    /// call sites that bound the overall query; individual requests
    /// use the per-participant default.
    pub fn participant_states(&self, _timeout: Duration) -> ParticipantStates {
        self.states_of(&self.members.snapshot())
    }

    fn states_of(&self, proxies: &[ParticipantProxy]) -> ParticipantStates {
        proxies
            .iter()
            .map(|proxy| (proxy.name(), proxy.query_state()))
            .collect()
    }

    pub fn system_state(&self, timeout: Duration) -> SystemState {
        convoy_core::system_state(&self.participant_states(timeout))
    }

    /// Soft lookup: unknown participants report `Unreachable`.
    pub fn participant_state(&self, participant_name: &str) -> ParticipantState {
        match self.members.find(participant_name) {
            Some(proxy) => proxy.query_state(),
            None => {
                system_log!(
                    self.logger,
                    Severity::Warning,
                    "No Participant with the name {} found",
                    participant_name
                );
                ParticipantState::Unreachable
            }
        }
    }

    // --- transitions --------------------------------------------------

    pub fn load(&self, timeout: Duration) -> Result<(), SystemError> {
        self.run_verb(Verb::Load, None, timeout)
    }

    pub fn unload(&self, timeout: Duration) -> Result<(), SystemError> {
        self.run_verb(Verb::Unload, None, timeout)
    }

    pub fn initialize(&self, timeout: Duration) -> Result<(), SystemError> {
        self.run_verb(Verb::Initialize, None, timeout)
    }

    pub fn deinitialize(&self, timeout: Duration) -> Result<(), SystemError> {
        self.run_verb(Verb::Deinitialize, None, timeout)
    }

    pub fn start(&self, timeout: Duration) -> Result<(), SystemError> {
        self.run_verb(Verb::Start, None, timeout)
    }

    pub fn stop(&self, timeout: Duration) -> Result<(), SystemError> {
        self.run_verb(Verb::Stop, None, timeout)
    }

    pub fn pause(&self, timeout: Duration) -> Result<(), SystemError> {
        self.run_verb(Verb::Pause, None, timeout)
    }

    pub fn shutdown(&self, timeout: Duration) -> Result<(), SystemError> {
        self.shutdown_cohort(timeout, None)
    }

    /// Drive the whole fleet to `target` hop by hop.
    pub fn set_system_state(
        &self,
        target: ParticipantState,
        timeout: Duration,
    ) -> Result<(), SystemError> {
        self.set_state_of(None, target, timeout)
    }

    /// Drive a single participant to `target` with the same algorithm.
    pub fn set_participant_state(
        &self,
        participant_name: &str,
        target: ParticipantState,
        timeout: Duration,
    ) -> Result<(), SystemError> {
        let proxy = self.participant(participant_name)?;
        self.set_state_of(Some(vec![proxy]), target, timeout)
    }

    fn set_state_of(
        &self,
        fixed_cohort: Option<Vec<ParticipantProxy>>,
        target: ParticipantState,
        timeout: Duration,
    ) -> Result<(), SystemError> {
        ensure_valid_target(&self.logger, &self.name, target)?;
        let mut guard = TransitionGuard::new(Arc::clone(&self.logger), &self.name, target);

        loop {
            let proxies = match &fixed_cohort {
                Some(proxies) => proxies.clone(),
                None => self.members.snapshot(),
            };
            let states = self.states_of(&proxies);
            if target_reached(&states, target) {
                break;
            }
            ensure_transition_possible(&self.logger, &self.name, &states, target)?;

            let from = state_to_trigger(&states, target);
            let next = next_state(from, target);
            let hop_cohort: Vec<ParticipantProxy> = proxies
                .iter()
                .filter(|proxy| states.get(&proxy.name()) == Some(&from))
                .cloned()
                .collect();

            self.dispatch_hop(from, next, timeout, hop_cohort)?;
            system_log!(
                self.logger,
                Severity::Info,
                "System '{}' reached '{}' for its cohort",
                self.name,
                next
            );
            // after a shutdown hop the cohort is gone
            if next == ParticipantState::Unreachable {
                break;
            }
        }
        guard.mark_success();
        Ok(())
    }

    fn dispatch_hop(
        &self,
        from: ParticipantState,
        next: ParticipantState,
        timeout: Duration,
        cohort: Vec<ParticipantProxy>,
    ) -> Result<(), SystemError> {
        use ParticipantState::*;
        match (from, next) {
            (Unloaded, Unreachable) => self.shutdown_cohort(timeout, Some(cohort)),
            (Unloaded, Loaded) => self.run_verb(Verb::Load, Some(cohort), timeout),
            (Loaded, Unloaded) => self.run_verb(Verb::Unload, Some(cohort), timeout),
            (Loaded, Initialized) => self.run_verb(Verb::Initialize, Some(cohort), timeout),
            (Initialized, Loaded) => self.run_verb(Verb::Deinitialize, Some(cohort), timeout),
            (Initialized, Running) | (Paused, Running) => {
                self.run_verb(Verb::Start, Some(cohort), timeout)
            }
            (Running, Initialized) | (Paused, Initialized) => {
                self.run_verb(Verb::Stop, Some(cohort), timeout)
            }
            (Initialized, Paused) | (Running, Paused) => {
                self.run_verb(Verb::Pause, Some(cohort), timeout)
            }
            (from, next) => Err(SystemError::Transition {
                description: format!("no legal hop from '{from}' to '{next}'"),
            }),
        }
    }

    fn run_verb(
        &self,
        verb: Verb,
        cohort: Option<Vec<ParticipantProxy>>,
        timeout: Duration,
    ) -> Result<(), SystemError> {
        let proxies = match cohort {
            Some(proxies) => proxies,
            None => {
                let proxies = self.members.snapshot();
                if proxies.is_empty() {
                    system_log!(
                        self.logger,
                        Severity::Warning,
                        "No participants within the current system"
                    );
                    return Ok(());
                }
                proxies
            }
        };

        let timer = self.execution_timer(timeout, verb.past_label());
        let mut entries = Vec::with_capacity(proxies.len());
        for proxy in &proxies {
            let priority = match verb {
                Verb::Initialize | Verb::Deinitialize => proxy.init_priority()?,
                Verb::Start | Verb::Stop => proxy.start_priority()?,
                _ => 1,
            };
            entries.push((priority, self.transition_job(verb, proxy)));
        }
        run_cohorts(entries, verb.sorting(), self.execution_config(), &timer)
    }

    fn transition_job(&self, verb: Verb, proxy: &ParticipantProxy) -> TransitionJob {
        let proxy = proxy.clone();
        let logger = Arc::clone(&self.logger);
        let system_name = self.name.clone();
        TransitionJob::new(proxy.name(), move || {
            let Some(state_machine) = proxy.state_machine_client() else {
                let message = format!(
                    "Participant '{}' in system '{}' is unreachable - the state \
                     machine service could not be resolved; the participant could \
                     not be {}",
                    proxy.name(),
                    system_name,
                    verb.past_label()
                );
                system_log!(logger, Severity::Warning, "{}", message);
                return Err(message);
            };
            match verb.call(state_machine.as_ref()) {
                Ok(()) => Ok(()),
                Err(error) => {
                    let message = format!(
                        "Participant '{}' in system '{}' could not be {} and \
                         remains in state '{}': {}",
                        proxy.name(),
                        system_name,
                        verb.past_label(),
                        proxy.current_state(),
                        error
                    );
                    system_log!(logger, Severity::Warning, "{}", message);
                    Err(message)
                }
            }
        })
    }

    fn execution_timer(&self, timeout: Duration, state_label: &'static str) -> ExecutionTimer {
        let logger = Arc::clone(&self.logger);
        ExecutionTimer::new(timeout, move || {
            system_log!(
                logger,
                Severity::Warning,
                "Timeout of {} ms exceeded for the call transitioning to state \
                 '{}'. Cannot interrupt the running call",
                timeout.as_millis(),
                state_label
            );
        })
    }

    fn shutdown_cohort(
        &self,
        timeout: Duration,
        cohort: Option<Vec<ParticipantProxy>>,
    ) -> Result<(), SystemError> {
        let member_count = self.members.len();
        let proxies = match cohort {
            Some(proxies) => proxies,
            None => {
                let proxies = self.members.snapshot();
                if proxies.is_empty() {
                    system_log!(
                        self.logger,
                        Severity::Warning,
                        "No participants within the current system"
                    );
                    return Ok(());
                }
                proxies
            }
        };

        let what_shuts_down = if proxies.len() == member_count {
            "System".to_string()
        } else {
            let names: Vec<String> = proxies.iter().map(ParticipantProxy::name).collect();
            format!("Participant(s): {}", names.join(","))
        };

        let timer = self.execution_timer(timeout, "unreachable");
        timer.start();
        let mut errors = Vec::new();
        let mut shut_down = Vec::new();
        for proxy in &proxies {
            // no RPC may linger against a participant about to exit
            proxy.deregister_logging();
            match proxy.state_machine_client() {
                Some(state_machine) => match state_machine.shutdown() {
                    Ok(()) => {
                        system_log!(
                            self.logger,
                            Severity::Info,
                            "Participant {} was shut down successfully and will be \
                             removed from system",
                            proxy.name()
                        );
                        shut_down.push(proxy.name());
                    }
                    Err(error) => {
                        let message = format!(
                            "Participant {} was not shut down successfully and will \
                             not be removed from system: {error}",
                            proxy.name()
                        );
                        system_log!(self.logger, Severity::Error, "{}", message);
                        errors.push(message);
                    }
                },
                None => {
                    let message = format!(
                        "Participant {} is unreachable - the state machine service \
                         could not be resolved",
                        proxy.name()
                    );
                    system_log!(self.logger, Severity::Error, "{}", message);
                    errors.push(message);
                }
            }
        }
        timer.stop();

        self.members
            .retain(|proxy| !shut_down.contains(&proxy.name()));

        if errors.is_empty() {
            system_log!(
                self.logger,
                Severity::Info,
                "{} shutdown successful",
                what_shuts_down
            );
            Ok(())
        } else {
            system_log!(self.logger, Severity::Fatal, "Shutdown failed");
            Err(SystemError::Shutdown {
                description: errors.join("; "),
            })
        }
    }

    // --- execution policy ---------------------------------------------

    pub fn set_init_and_start_policy(&self, config: ExecutionConfig) -> Result<(), SystemError> {
        if config.thread_count == 0 {
            system_log!(
                self.logger,
                Severity::Fatal,
                "Thread count with value 0 is not valid"
            );
            return Err(ConfigError::ZeroThreadCount.into());
        }
        *self.execution.lock() = config;
        Ok(())
    }

    pub fn init_and_start_policy(&self) -> ExecutionConfig {
        self.execution_config()
    }

    fn execution_config(&self) -> ExecutionConfig {
        *self.execution.lock()
    }

    // --- monitors -----------------------------------------------------

    /// Receive logs of the remote participants. Warns about every
    /// participant that never registered its logging sink.
    pub fn register_monitoring(&self, monitor: Arc<dyn EventMonitor>) {
        self.forwarder.monitors().register(monitor);
        for proxy in self.members.snapshot() {
            if !proxy.logging_registered() {
                system_log!(
                    self.logger,
                    Severity::Warning,
                    "Participant {} has no registered logging interface",
                    proxy.name()
                );
            }
        }
    }

    pub fn unregister_monitoring(&self, monitor: &Arc<dyn EventMonitor>) {
        self.forwarder.monitors().release(monitor);
    }

    pub fn set_severity_level(&self, level: Severity) {
        self.forwarder.monitors().set_level(level);
    }

    /// Receive the controller's own messages.
    pub fn register_system_monitoring(&self, monitor: Arc<dyn EventMonitor>) {
        self.logger.monitors().register(monitor);
    }

    pub fn unregister_system_monitoring(&self, monitor: &Arc<dyn EventMonitor>) {
        self.logger.monitors().release(monitor);
    }

    pub fn set_system_severity_level(&self, level: Severity) {
        self.logger.monitors().set_level(level);
    }

    // --- health -------------------------------------------------------

    pub fn set_liveliness_timeout(&self, timeout: Duration) {
        *self.liveliness_timeout.lock() = timeout;
    }

    pub fn liveliness_timeout(&self) -> Duration {
        *self.liveliness_timeout.lock()
    }

    /// Health of every member, classified against the liveliness
    /// timeout. Fails when any member's health listener is off.
    pub fn participants_health(
        &self,
    ) -> Result<BTreeMap<String, ParticipantHealth>, SystemError> {
        let mut aggregator = ParticipantHealthStateAggregator::new(self.liveliness_timeout());
        for proxy in self.members.snapshot() {
            aggregator.set_participant_health(proxy.name(), proxy.participant_health()?);
        }
        Ok(aggregator.participants_health(Instant::now()))
    }

    pub fn set_health_listener_running(&self, running: bool) -> Result<(), SystemError> {
        for proxy in self.members.snapshot() {
            proxy.set_health_listener_running(running)?;
        }
        Ok(())
    }

    /// `(uniform, running)`: whether all members agree on the listener
    /// state, and the common value (meaningful only when uniform).
    pub fn health_listener_running_status(&self) -> (bool, bool) {
        let states: Vec<bool> = self
            .members
            .snapshot()
            .iter()
            .map(ParticipantProxy::health_listener_running)
            .collect();
        let running_count = states.iter().filter(|running| **running).count();
        if running_count == states.len() {
            (true, true)
        } else if running_count == 0 {
            (true, false)
        } else {
            (false, false)
        }
    }

    // --- heartbeat ----------------------------------------------------

    pub fn heartbeat_interval(&self, participant_name: &str) -> Result<Duration, SystemError> {
        let proxy = self.participant(participant_name)?;
        let http_server = proxy.http_server_client().ok_or_else(|| {
            system_log!(
                self.logger,
                Severity::Fatal,
                "Participant {} is unreachable - no http server service",
                participant_name
            );
            SystemError::Unreachable {
                participant: participant_name.to_string(),
            }
        })?;
        Ok(http_server.heartbeat_interval()?)
    }

    /// Configure the heartbeat cadence; an empty list means every
    /// member.
    pub fn set_heartbeat_interval(
        &self,
        participant_names: &[String],
        interval: Duration,
    ) -> Result<(), SystemError> {
        let names: Vec<String> = if participant_names.is_empty() {
            self.members
                .snapshot()
                .iter()
                .map(ParticipantProxy::name)
                .collect()
        } else {
            participant_names.to_vec()
        };
        for name in names {
            let proxy = self.participant(&name)?;
            let http_server = proxy.http_server_client().ok_or_else(|| {
                system_log!(
                    self.logger,
                    Severity::Fatal,
                    "Participant {} is unreachable - no http server service",
                    name
                );
                SystemError::Unreachable { participant: name }
            })?;
            http_server.set_heartbeat_interval(interval)?;
        }
        Ok(())
    }

    // --- properties ---------------------------------------------------

    fn participant_properties(
        &self,
        proxy: &ParticipantProxy,
        property_path: &str,
    ) -> Result<(RemoteProperties, String), SystemError> {
        let (node, leaf) = match property_path.rfind('/') {
            Some(position) => (
                &property_path[..position],
                property_path[position + 1..].to_string(),
            ),
            None => (property_path, String::new()),
        };
        let config = proxy.configuration_client().ok_or_else(|| {
            system_log!(
                self.logger,
                Severity::Fatal,
                "Participant {} within system {} is unreachable - no configuration \
                 service",
                proxy.name(),
                self.name
            );
            SystemError::Unreachable {
                participant: proxy.name(),
            }
        })?;
        let properties = config.properties(node).map_err(|error| {
            let message = format!(
                "Participant {} within system {} cannot access property node {node} \
                 for property {leaf}: {error}",
                proxy.name(),
                self.name
            );
            system_log!(self.logger, Severity::Fatal, "{}", message);
            SystemError::Property { message }
        })?;
        Ok((properties, leaf))
    }

    /// Set a property on one participant. Dots in the path are
    /// accepted as separators and normalized to slashes.
    pub fn set_participant_property(
        &self,
        participant_name: &str,
        property_path: &str,
        value: &str,
    ) -> Result<(), SystemError> {
        let normalized = property_path.replace('.', "/");
        let proxy = self.participant(participant_name)?;
        let (properties, leaf) = self.participant_properties(&proxy, &normalized)?;
        let property_type = properties.property_type(&leaf)?;
        let accepted = properties.set_property(&leaf, value, &property_type)?;
        if !accepted {
            let message = format!(
                "Property {normalized} could not be set for the following \
                 participant: {participant_name}"
            );
            system_log!(self.logger, Severity::Fatal, "{}", message);
            return Err(SystemError::Property { message });
        }
        Ok(())
    }

    pub fn participant_property(
        &self,
        participant_name: &str,
        property_path: &str,
    ) -> Result<String, SystemError> {
        let normalized = property_path.replace('.', "/");
        let proxy = self.participant(participant_name)?;
        let (properties, leaf) = self.participant_properties(&proxy, &normalized)?;
        Ok(properties.property(&leaf)?)
    }

    /// Broadcast one property value to every member (optionally
    /// skipping one). Failures are accumulated; with
    /// `throw_on_failure` they surface as one error.
    pub fn set_property_value_to_all(
        &self,
        node: &str,
        property_name: &str,
        value: &str,
        property_type: &str,
        except_participant: &str,
        throw_on_failure: bool,
    ) -> Result<(), SystemError> {
        let normalized = property_name.replace('.', "/");
        let mut failing = Vec::new();

        for proxy in self.members.snapshot() {
            if !except_participant.is_empty() && proxy.name() == except_participant {
                continue;
            }
            let accepted = proxy
                .configuration_client()
                .ok_or(())
                .and_then(|config| config.properties(node).map_err(|_| ()))
                .and_then(|properties| {
                    properties
                        .set_property(&normalized, value, property_type)
                        .map_err(|_| ())
                });
            match accepted {
                Ok(true) => {}
                _ => failing.push(proxy.name()),
            }
        }

        if failing.is_empty() {
            return Ok(());
        }
        let message = format!(
            "Property {normalized} could not be set for the following \
             participants: {}",
            failing.join(", ")
        );
        if throw_on_failure {
            system_log!(self.logger, Severity::Fatal, "{}", message);
            Err(SystemError::Property { message })
        } else {
            system_log!(self.logger, Severity::Warning, "{}", message);
            Ok(())
        }
    }

    // --- timing -------------------------------------------------------

    /// Write a timing configuration to the fleet: the master element,
    /// the scheduler, the clocks, and the master-only step/factor
    /// properties.
    #[allow(clippy::too_many_arguments)]
    pub fn configure_timing(
        &self,
        master_clock: &str,
        slave_clock: &str,
        scheduler: &str,
        master_element: &str,
        master_step_size: &str,
        master_time_factor: &str,
        slave_sync_cycle_time: &str,
    ) -> Result<(), SystemError> {
        self.set_property_value_to_all(
            "/",
            TIMING_MASTER_PROPERTY,
            master_element,
            "string",
            "",
            true,
        )?;
        self.set_property_value_to_all("/", SCHEDULER_PROPERTY, scheduler, "string", "", true)?;

        if master_element.is_empty() {
            return self.set_property_value_to_all(
                "/",
                MAIN_CLOCK_PROPERTY,
                slave_clock,
                "string",
                "",
                true,
            );
        }

        self.set_property_value_to_all(
            "/",
            MAIN_CLOCK_PROPERTY,
            slave_clock,
            "string",
            master_element,
            true,
        )?;
        self.set_participant_property(master_element, MAIN_CLOCK_PROPERTY, master_clock)?;
        if !master_time_factor.is_empty() {
            self.set_participant_property(master_element, TIME_FACTOR_PROPERTY, master_time_factor)?;
        }
        if !master_step_size.is_empty() {
            self.set_participant_property(master_element, STEP_SIZE_PROPERTY, master_step_size)?;
        }
        if !slave_sync_cycle_time.is_empty() {
            self.set_property_value_to_all(
                "/",
                SYNC_CYCLE_TIME_PROPERTY,
                slave_sync_cycle_time,
                "int64",
                master_element,
                true,
            )?;
        }
        Ok(())
    }

    /// Every participant runs on its own real-time clock.
    pub fn configure_timing_none(&self) -> Result<(), SystemError> {
        self.configure_timing("", CLOCK_REALTIME, SCHEDULER_CLOCK_BASED, "", "", "", "")
    }

    /// Discrete stepping driven by a master element.
    pub fn configure_timing_discrete_steps(
        &self,
        master_element: &str,
        step_size: &str,
        time_factor: &str,
    ) -> Result<(), SystemError> {
        self.configure_timing(
            CLOCK_SIMTIME,
            CLOCK_SLAVE_ON_DEMAND_DISCRETE,
            SCHEDULER_CLOCK_BASED,
            master_element,
            step_size,
            time_factor,
            "",
        )
    }

    /// Discrete stepping as fast as possible.
    pub fn configure_timing_afap(
        &self,
        master_element: &str,
        step_size: &str,
    ) -> Result<(), SystemError> {
        self.configure_timing(
            CLOCK_SIMTIME,
            CLOCK_SLAVE_ON_DEMAND_DISCRETE,
            SCHEDULER_CLOCK_BASED,
            master_element,
            step_size,
            "0.0",
            "",
        )
    }

    /// Continuous clocks, slaves synchronizing to the master.
    pub fn configure_timing_clock_sync_only(
        &self,
        master_element: &str,
        slave_sync_cycle_time: &str,
    ) -> Result<(), SystemError> {
        self.configure_timing(
            CLOCK_REALTIME,
            CLOCK_SLAVE_ON_DEMAND,
            SCHEDULER_CLOCK_BASED,
            master_element,
            "",
            "",
            slave_sync_cycle_time,
        )
    }

    /// Distinct timing masters configured across the members.
    pub fn current_timing_masters(&self) -> Result<Vec<String>, SystemError> {
        let mut masters = Vec::new();
        for proxy in self.members.snapshot() {
            let config = proxy.configuration_client().ok_or_else(|| {
                system_log!(
                    self.logger,
                    Severity::Fatal,
                    "Participant {} is unreachable - no configuration service",
                    proxy.name()
                );
                SystemError::Unreachable {
                    participant: proxy.name(),
                }
            })?;
            let properties = config.properties(CLOCK_SYNC_NODE)?;
            let master = properties.property("timing_master")?;
            if !master.is_empty() && !masters.contains(&master) {
                masters.push(master);
            }
        }
        Ok(masters)
    }

    /// Snapshot of the timing-relevant properties per participant.
    pub fn timing_properties(
        &self,
    ) -> Result<BTreeMap<String, BTreeMap<String, String>>, SystemError> {
        let mut all = BTreeMap::new();
        for proxy in self.members.snapshot() {
            let config = proxy.configuration_client().ok_or_else(|| {
                SystemError::Unreachable {
                    participant: proxy.name(),
                }
            })?;
            let root = config.properties("/")?;
            let mut timing = BTreeMap::new();
            for path in [MAIN_CLOCK_PROPERTY, TIMING_MASTER_PROPERTY] {
                let value = root.property(path)?;
                if !value.is_empty() {
                    timing.insert(path.to_string(), value);
                }
            }
            if timing.contains_key(TIMING_MASTER_PROPERTY) {
                for path in [
                    TIME_FACTOR_PROPERTY,
                    STEP_SIZE_PROPERTY,
                    SYNC_CYCLE_TIME_PROPERTY,
                ] {
                    let value = root.property(path)?;
                    if !value.is_empty() {
                        timing.insert(path.to_string(), value);
                    }
                }
            }
            let scheduler = root.property(SCHEDULER_PROPERTY)?;
            if !scheduler.is_empty() {
                timing.insert(SCHEDULER_PROPERTY.to_string(), scheduler);
            }
            all.insert(proxy.name(), timing);
        }
        Ok(all)
    }

}

impl Drop for System {
    fn drop(&mut self) {
        // the listener goes first so no shutdown notification races
        // the teardown of the member list
        if let Some(listener) = self.shutdown_listener.lock().take() {
            let _ = self.access.deregister_update_sink(&listener);
        }
        self.members.clear();
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
