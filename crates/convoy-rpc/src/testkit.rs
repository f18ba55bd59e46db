// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted standard participant for tests.
//!
//! Builds a loopback participant exposing the full default service
//! set: info, state machine (either dialect), configuration, logging,
//! logging sink, health, http server and data registry. Tests reach
//! into the service handles to deny transitions, inject delays,
//! reshape the property tree or inspect what the library did.

use crate::names::*;
use convoy_bus::loopback::ScriptedParticipant;
use convoy_bus::{BusError, RpcService};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared recording of `(participant, verb)` transition completions,
/// used by the ordering tests.
pub type TransitionLog = Arc<Mutex<Vec<(String, String)>>>;

pub fn transition_log() -> TransitionLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// One scripted participant plus handles to its service internals.
pub struct SimParticipant {
    participant: ScriptedParticipant,
    name: String,
    pub info: Arc<SimInfo>,
    pub state_machine: Arc<SimStateMachine>,
    pub properties: Arc<SimProperties>,
    pub sink_registry: Arc<SimSinkRegistry>,
    pub health: Arc<SimHealth>,
    pub http: Arc<SimHttpServer>,
    pub logging: Arc<SimLoggingService>,
}

enum Dialect {
    Json,
    Legacy,
}

impl SimParticipant {
    /// Participant speaking the current (JSON result) dialect.
    pub fn new(name: &str) -> Self {
        Self::build(name, Some(Dialect::Json))
    }

    /// Participant of an older build speaking the bool dialect.
    pub fn legacy(name: &str) -> Self {
        Self::build(name, Some(Dialect::Legacy))
    }

    /// Participant exposing no state machine at all (e.g. a recorder).
    pub fn without_state_machine(name: &str) -> Self {
        Self::build(name, None)
    }

    fn build(name: &str, dialect: Option<Dialect>) -> Self {
        let url = format!("http://{name}.sim:9090");
        let participant = ScriptedParticipant::new(name, url);

        let state_machine = Arc::new(SimStateMachine::new(
            name,
            matches!(dialect, Some(Dialect::Legacy)),
        ));
        let properties = Arc::new(SimProperties::with_defaults());
        let sink_registry = Arc::new(SimSinkRegistry::default());
        let health = Arc::new(SimHealth::default());
        let http = Arc::new(SimHttpServer::default());
        let logging = Arc::new(SimLoggingService::default());
        let data_registry = Arc::new(SimDataRegistry::default());

        let mut components: BTreeMap<String, Vec<String>> = BTreeMap::from([
            (
                PARTICIPANT_INFO_SERVICE.to_string(),
                vec![PARTICIPANT_INFO_IID.to_string()],
            ),
            (
                CONFIGURATION_SERVICE.to_string(),
                vec![CONFIGURATION_IID.to_string()],
            ),
            (
                LOGGING_SERVICE.to_string(),
                vec![LOGGING_SERVICE_IID.to_string()],
            ),
            (
                LOGGING_SINK_SERVICE.to_string(),
                vec![LOGGING_SINK_IID.to_string()],
            ),
            (HEALTH_SERVICE.to_string(), vec![HEALTH_IID.to_string()]),
            (
                HTTP_SERVER_SERVICE.to_string(),
                vec![HTTP_SERVER_IID.to_string()],
            ),
            (
                DATA_REGISTRY_SERVICE.to_string(),
                vec![DATA_REGISTRY_IID.to_string()],
            ),
        ]);
        match dialect {
            Some(Dialect::Json) => {
                components.insert(
                    STATE_MACHINE_SERVICE.to_string(),
                    vec![STATE_MACHINE_IID_V2.to_string()],
                );
            }
            Some(Dialect::Legacy) => {
                components.insert(
                    STATE_MACHINE_SERVICE.to_string(),
                    vec![STATE_MACHINE_IID_V1.to_string()],
                );
            }
            None => {}
        }
        let info = Arc::new(SimInfo {
            components: Mutex::new(components),
        });

        participant.add_service(PARTICIPANT_INFO_SERVICE, Arc::clone(&info) as _);
        if dialect.is_some() {
            participant.add_service(STATE_MACHINE_SERVICE, Arc::clone(&state_machine) as _);
        }
        participant.add_service(CONFIGURATION_SERVICE, Arc::clone(&properties) as _);
        participant.add_service(LOGGING_SERVICE, Arc::clone(&logging) as _);
        participant.add_service(LOGGING_SINK_SERVICE, Arc::clone(&sink_registry) as _);
        participant.add_service(HEALTH_SERVICE, Arc::clone(&health) as _);
        participant.add_service(HTTP_SERVER_SERVICE, Arc::clone(&http) as _);
        participant.add_service(DATA_REGISTRY_SERVICE, data_registry);

        Self {
            participant,
            name: name.to_string(),
            info,
            state_machine,
            properties,
            sink_registry,
            health,
            http,
            logging,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bus-level participant to register on a loopback access.
    pub fn scripted(&self) -> ScriptedParticipant {
        self.participant.clone()
    }
}

/// Scripted state machine honoring the legal transition graph.
pub struct SimStateMachine {
    participant_name: String,
    legacy: bool,
    state: Mutex<String>,
    deny: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    log: Mutex<Option<TransitionLog>>,
}

impl SimStateMachine {
    fn new(participant_name: &str, legacy: bool) -> Self {
        Self {
            participant_name: participant_name.to_string(),
            legacy,
            state: Mutex::new("Unloaded".to_string()),
            deny: Mutex::new(HashSet::new()),
            delay: Mutex::new(Duration::ZERO),
            log: Mutex::new(None),
        }
    }

    pub fn set_state(&self, remote_state_name: &str) {
        *self.state.lock() = remote_state_name.to_string();
    }

    pub fn state(&self) -> String {
        self.state.lock().clone()
    }

    /// Deny a verb (`"start"`, `"load"`, ...) from now on.
    pub fn deny(&self, verb: &str) {
        self.deny.lock().insert(verb.to_string());
    }

    pub fn allow(&self, verb: &str) {
        self.deny.lock().remove(verb);
    }

    /// Sleep this long inside every transition call.
    pub fn set_transition_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn attach_log(&self, log: TransitionLog) {
        *self.log.lock() = Some(log);
    }

    fn next_state(current: &str, verb: &str) -> Option<&'static str> {
        match (current, verb) {
            ("Unloaded", "load") => Some("Loaded"),
            ("Loaded", "unload") => Some("Unloaded"),
            ("Loaded", "initialize") => Some("Initialized"),
            ("Initialized", "deinitialize") => Some("Loaded"),
            ("Initialized", "start") | ("Paused", "start") => Some("Running"),
            ("Running", "stop") | ("Paused", "stop") => Some("Initialized"),
            ("Running", "pause") | ("Initialized", "pause") => Some("Paused"),
            ("Unloaded", "exit") => Some("Exited"),
            _ => None,
        }
    }

    fn refusal(&self, verb: &str, current: &str) -> Value {
        if self.legacy {
            json!(false)
        } else {
            json!({
                "error_code": -10,
                "description": format!("cannot {verb} from state {current}"),
                "line": 0,
                "file": "sim_state_machine",
                "function": verb,
            })
        }
    }

    fn transition(&self, verb: &str) -> Value {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.state.lock();
        if self.deny.lock().contains(verb) {
            return self.refusal(verb, &state);
        }
        match Self::next_state(&state, verb) {
            Some(next) => {
                *state = next.to_string();
                drop(state);
                if let Some(log) = self.log.lock().as_ref() {
                    log.lock()
                        .push((self.participant_name.clone(), verb.to_string()));
                }
                if self.legacy {
                    json!(true)
                } else {
                    json!({ "error_code": 0 })
                }
            }
            None => self.refusal(verb, &state),
        }
    }
}

impl RpcService for SimStateMachine {
    fn handle(&self, method: &str, _params: &Value) -> Result<Value, BusError> {
        match method {
            "getCurrentStateName" => Ok(json!(self.state())),
            "load" | "unload" | "initialize" | "deinitialize" | "start" | "stop" | "pause"
            | "exit" => Ok(self.transition(method)),
            other => Err(BusError::UnknownMethod {
                service: STATE_MACHINE_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Flat scripted property tree keyed by full path.
pub struct SimProperties {
    data: Mutex<BTreeMap<String, (String, String)>>,
}

impl SimProperties {
    /// Default tree: service-bus priorities plus the timing-relevant
    /// clock, clock-synchronization and scheduling properties.
    pub fn with_defaults() -> Self {
        let mut data = BTreeMap::new();
        let defaults = [
            ("service_bus/init_priority", "0", "int32"),
            ("service_bus/start_priority", "0", "int32"),
            ("clock/main_clock", "", "string"),
            ("clock/time_factor", "", "double"),
            ("clock/step_size", "", "int64"),
            ("clock_synchronization/timing_master", "", "string"),
            ("clock_synchronization/sync_cycle_time", "", "int64"),
            ("scheduling/scheduler", "", "string"),
        ];
        for (path, value, ty) in defaults {
            data.insert(path.to_string(), (value.to_string(), ty.to_string()));
        }
        Self {
            data: Mutex::new(data),
        }
    }

    pub fn set(&self, full_path: &str, value: &str, ty: &str) {
        self.data
            .lock()
            .insert(full_path.to_string(), (value.to_string(), ty.to_string()));
    }

    pub fn get(&self, full_path: &str) -> Option<(String, String)> {
        self.data.lock().get(full_path).cloned()
    }

    /// Drop a whole node, e.g. to mimic an old build without the
    /// service-bus priority properties.
    pub fn remove_node(&self, node: &str) {
        let prefix = format!("{node}/");
        self.data.lock().retain(|path, _| !path.starts_with(&prefix));
    }

    fn node_exists(&self, node: &str) -> bool {
        if node == "/" {
            return true;
        }
        let prefix = format!("{}/", node.trim_end_matches('/'));
        self.data.lock().keys().any(|path| path.starts_with(&prefix))
    }

    fn full_path(node: &str, name: &str) -> String {
        if node == "/" {
            name.to_string()
        } else {
            format!("{}/{name}", node.trim_end_matches('/'))
        }
    }
}

impl RpcService for SimProperties {
    fn handle(&self, method: &str, params: &Value) -> Result<Value, BusError> {
        let node = params.get("path").and_then(Value::as_str).unwrap_or("/");
        if !self.node_exists(node) {
            return Err(BusError::InvalidParams {
                method: method.to_string(),
                detail: format!("no property node '{node}'"),
            });
        }
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let full = Self::full_path(node, name);

        match method {
            "getProperty" => Ok(json!(self
                .data
                .lock()
                .get(&full)
                .map(|(value, _)| value.clone())
                .unwrap_or_default())),
            "getPropertyType" => Ok(json!(self
                .data
                .lock()
                .get(&full)
                .map(|(_, ty)| ty.clone())
                .unwrap_or_default())),
            "setProperty" => {
                let value = params.get("value").and_then(Value::as_str).unwrap_or("");
                let mut data = self.data.lock();
                match data.get_mut(&full) {
                    Some(slot) => {
                        slot.0 = value.to_string();
                        Ok(json!(0))
                    }
                    None => Ok(json!(-2)),
                }
            }
            "getPropertyNames" => {
                let prefix = if node == "/" {
                    String::new()
                } else {
                    format!("{}/", node.trim_end_matches('/'))
                };
                let names: Vec<String> = self
                    .data
                    .lock()
                    .keys()
                    .filter(|path| path.starts_with(&prefix))
                    .map(|path| path[prefix.len()..].to_string())
                    .collect();
                Ok(json!(names.join(",")))
            }
            other => Err(BusError::UnknownMethod {
                service: CONFIGURATION_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Records which log-server urls the participant was asked to push to.
#[derive(Default)]
pub struct SimSinkRegistry {
    urls: Mutex<Vec<String>>,
}

impl SimSinkRegistry {
    pub fn registered_urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

impl RpcService for SimSinkRegistry {
    fn handle(&self, method: &str, params: &Value) -> Result<Value, BusError> {
        let url = params
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match method {
            "registerRPCLoggingSinkClient" => {
                self.urls.lock().push(url);
                Ok(json!(0))
            }
            "unregisterRPCLoggingSinkClient" => {
                self.urls.lock().retain(|existing| *existing != url);
                Ok(json!(0))
            }
            other => Err(BusError::UnknownMethod {
                service: LOGGING_SINK_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Serves canned jobs healthiness.
pub struct SimHealth {
    jobs: Mutex<Value>,
    resets: AtomicU32,
}

impl Default for SimHealth {
    fn default() -> Self {
        Self {
            jobs: Mutex::new(json!({ "jobs_healthiness": [] })),
            resets: AtomicU32::new(0),
        }
    }
}

impl SimHealth {
    pub fn set_reply(&self, reply: Value) {
        *self.jobs.lock() = reply;
    }

    pub fn reset_count(&self) -> u32 {
        self.resets.load(Ordering::Relaxed)
    }
}

impl RpcService for SimHealth {
    fn handle(&self, method: &str, _params: &Value) -> Result<Value, BusError> {
        match method {
            "getHealth" => Ok(self.jobs.lock().clone()),
            "resetHealth" => {
                self.resets.fetch_add(1, Ordering::Relaxed);
                Ok(json!({ "error_code": 0 }))
            }
            other => Err(BusError::UnknownMethod {
                service: HEALTH_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Heartbeat interval endpoint.
pub struct SimHttpServer {
    interval_ms: Mutex<u64>,
}

impl Default for SimHttpServer {
    fn default() -> Self {
        Self {
            interval_ms: Mutex::new(500),
        }
    }
}

impl SimHttpServer {
    pub fn interval_ms(&self) -> u64 {
        *self.interval_ms.lock()
    }
}

impl RpcService for SimHttpServer {
    fn handle(&self, method: &str, params: &Value) -> Result<Value, BusError> {
        match method {
            "getHeartbeatInterval" => Ok(json!({ "interval_ms": *self.interval_ms.lock() })),
            "setHeartbeatInterval" => {
                if let Some(ms) = params.get("interval_ms").and_then(Value::as_u64) {
                    *self.interval_ms.lock() = ms;
                }
                Ok(json!({ "interval_ms": *self.interval_ms.lock() }))
            }
            other => Err(BusError::UnknownMethod {
                service: HTTP_SERVER_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Logger filters and sink properties.
pub struct SimLoggingService {
    filters: Mutex<BTreeMap<String, (i64, String)>>,
    sink_properties: Mutex<BTreeMap<String, (String, String)>>,
}

impl Default for SimLoggingService {
    fn default() -> Self {
        let mut sink_properties = BTreeMap::new();
        sink_properties.insert(
            "file/path".to_string(),
            ("participant.log".to_string(), "string".to_string()),
        );
        Self {
            filters: Mutex::new(BTreeMap::new()),
            sink_properties: Mutex::new(sink_properties),
        }
    }
}

impl RpcService for SimLoggingService {
    fn handle(&self, method: &str, params: &Value) -> Result<Value, BusError> {
        match method {
            "setLoggerFilter" => {
                let logger = text(params, "logger_name");
                let severity = params.get("severity").and_then(Value::as_i64).unwrap_or(4);
                let sinks = text(params, "enable_sinks");
                self.filters.lock().insert(logger, (severity, sinks));
                Ok(json!(0))
            }
            "getLoggerFilter" => {
                let logger = text(params, "logger_name");
                let (severity, sinks) = self
                    .filters
                    .lock()
                    .get(&logger)
                    .cloned()
                    .unwrap_or((4, "console".to_string()));
                Ok(json!({ "severity": severity, "enable_sinks": sinks }))
            }
            "getLoggers" => Ok(json!("participant,system_logger")),
            "getSinks" => Ok(json!("console,file,rpc")),
            "getSinkProperty" => {
                let key = format!("{}/{}", text(params, "sink"), text(params, "name"));
                let (value, ty) = self
                    .sink_properties
                    .lock()
                    .get(&key)
                    .cloned()
                    .unwrap_or_default();
                Ok(json!({ "value": value, "type": ty }))
            }
            "setSinkProperty" => {
                let key = format!("{}/{}", text(params, "sink"), text(params, "name"));
                self.sink_properties
                    .lock()
                    .insert(key, (text(params, "value"), text(params, "type")));
                Ok(json!(0))
            }
            "getSinkProperties" => {
                let sink = text(params, "sink");
                let prefix = format!("{sink}/");
                let names: Vec<String> = self
                    .sink_properties
                    .lock()
                    .keys()
                    .filter(|key| key.starts_with(&prefix))
                    .map(|key| key[prefix.len()..].to_string())
                    .collect();
                Ok(json!(names.join(",")))
            }
            other => Err(BusError::UnknownMethod {
                service: LOGGING_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct SimDataRegistry;

impl RpcService for SimDataRegistry {
    fn handle(&self, method: &str, _params: &Value) -> Result<Value, BusError> {
        match method {
            "getSignalInNames" => Ok(json!("")),
            "getSignalOutNames" => Ok(json!("")),
            "getStreamType" => Ok(json!({ "meta_type": "plain", "properties": [] })),
            other => Err(BusError::UnknownMethod {
                service: DATA_REGISTRY_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

/// Advertised components and their interface versions.
pub struct SimInfo {
    components: Mutex<BTreeMap<String, Vec<String>>>,
}

impl SimInfo {
    pub fn add_component(&self, component: &str, iids: Vec<String>) {
        self.components.lock().insert(component.to_string(), iids);
    }

    pub fn remove_component(&self, component: &str) {
        self.components.lock().remove(component);
    }
}

impl RpcService for SimInfo {
    fn handle(&self, method: &str, params: &Value) -> Result<Value, BusError> {
        match method {
            "getRPCComponents" => {
                let names: Vec<String> = self.components.lock().keys().cloned().collect();
                Ok(json!(names))
            }
            "getRPCComponentIIDs" => {
                let component = text(params, "component");
                let iids = self
                    .components
                    .lock()
                    .get(&component)
                    .cloned()
                    .unwrap_or_default();
                Ok(json!(iids))
            }
            "getRPCComponentInterfaceDefinition" => Ok(json!("")),
            other => Err(BusError::UnknownMethod {
                service: PARTICIPANT_INFO_SERVICE.to_string(),
                method: other.to_string(),
            }),
        }
    }
}

fn text(params: &Value, field: &str) -> String {
    params
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
