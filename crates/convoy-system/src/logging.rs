// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log multiplexing: monitors, the system logger and the process-wide
//! RPC log sink server.
//!
//! Remote participants push their logs into one RPC server per system
//! name hosted by this process. The server fans each message out to
//! the `RemoteLogForwarder` of every `System` instance sharing that
//! name, which in turn delivers to its registered monitors. Library
//! originated messages travel the parallel `SystemLogger` path with
//! the fixed logger name `system_logger`.

use crate::error::SystemError;
use convoy_bus::{RpcServer, RpcService, BusError, USE_DEFAULT_URL};
use convoy_core::{EventMonitor, Severity};
use convoy_rpc::LOGGING_SINK_CLIENT_SERVICE;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

/// Registered monitors plus the minimum severity they receive.
///
/// Monitors are invoked under the lock; a slow monitor delays log
/// delivery but keeps the fan-out race free.
pub struct MonitorSet {
    monitors: Mutex<Vec<Arc<dyn EventMonitor>>>,
    level: Mutex<Severity>,
}

impl MonitorSet {
    pub fn new() -> Self {
        Self {
            monitors: Mutex::new(Vec::new()),
            level: Mutex::new(Severity::Info),
        }
    }

    pub fn register(&self, monitor: Arc<dyn EventMonitor>) {
        self.monitors.lock().push(monitor);
    }

    pub fn release(&self, monitor: &Arc<dyn EventMonitor>) {
        self.monitors
            .lock()
            .retain(|existing| !Arc::ptr_eq(existing, monitor));
    }

    pub fn set_level(&self, level: Severity) {
        *self.level.lock() = level;
    }

    pub fn forward(
        &self,
        timestamp_ms: u64,
        severity: Severity,
        participant_name: &str,
        logger_name: &str,
        message: &str,
    ) {
        let monitors = self.monitors.lock();
        if !self.level.lock().accepts(severity) || monitors.is_empty() {
            return;
        }
        for monitor in monitors.iter() {
            monitor.on_log(timestamp_ms, severity, participant_name, logger_name, message);
        }
    }
}

impl Default for MonitorSet {
    fn default() -> Self {
        Self::new()
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Emitter for library-originated log messages. Forwards to its own
/// monitor set with the system name as participant and mirrors every
/// message onto the tracing subscriber.
pub struct SystemLogger {
    system_name: String,
    monitors: MonitorSet,
}

pub const SYSTEM_LOGGER_NAME: &str = "system_logger";

impl SystemLogger {
    pub fn new(system_name: impl Into<String>) -> Self {
        Self {
            system_name: system_name.into(),
            monitors: MonitorSet::new(),
        }
    }

    pub fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Fatal | Severity::Error => {
                tracing::error!(system = %self.system_name, "{message}");
            }
            Severity::Warning => tracing::warn!(system = %self.system_name, "{message}"),
            Severity::Info => tracing::info!(system = %self.system_name, "{message}"),
            Severity::Debug => tracing::debug!(system = %self.system_name, "{message}"),
            Severity::Off => return,
        }
        self.monitors.forward(
            wall_clock_ms(),
            severity,
            &self.system_name,
            SYSTEM_LOGGER_NAME,
            message,
        );
    }

    /// Report an error raised inside an RPC service client.
    pub fn log_proxy_error(
        &self,
        severity: Severity,
        participant_name: &str,
        component: &str,
        message: &str,
    ) {
        self.log(
            severity,
            &format!(
                "RPC Service Proxy of component: {component} from participant \
                 {participant_name} logged: {message}"
            ),
        );
    }

    pub fn monitors(&self) -> &MonitorSet {
        &self.monitors
    }
}

/// Log a message through a [`SystemLogger`], suffixed with the call
/// site so remote readers can locate the origin.
#[macro_export]
macro_rules! system_log {
    ($logger:expr, $severity:expr, $($arg:tt)*) => {
        $logger.log(
            $severity,
            &format!(
                "{}; logged in {} - {} - line: {}",
                format_args!($($arg)*),
                module_path!(),
                file!(),
                line!()
            ),
        )
    };
}

/// Per-`System` receiver of remote participant logs.
///
/// Holds this system's monitor set and, once initialized, a handle on
/// the shared per-name sink server that keeps the server alive.
pub struct RemoteLogForwarder {
    monitors: MonitorSet,
    service: Mutex<Option<SinkServerHandle>>,
}

struct SinkServerHandle {
    entry: Arc<SinkServerEntry>,
    url: String,
}

impl RemoteLogForwarder {
    pub fn new() -> Self {
        Self {
            monitors: MonitorSet::new(),
            service: Mutex::new(None),
        }
    }

    /// Attach `forwarder` to (or create) the process-wide sink server
    /// for `system_name` and start receiving its messages.
    pub fn init_rpc_service(
        forwarder: &Arc<RemoteLogForwarder>,
        system_name: &str,
        logger: &Arc<SystemLogger>,
    ) -> Result<(), SystemError> {
        let entry = acquire_sink_server(system_name, logger)?;
        entry.service.register_sink(Arc::downgrade(forwarder));
        let url = entry.url.clone();
        *forwarder.service.lock() = Some(SinkServerHandle { entry, url });
        Ok(())
    }

    /// Url participants push their logs to; empty until initialized.
    pub fn url(&self) -> String {
        self.service
            .lock()
            .as_ref()
            .map(|handle| handle.url.clone())
            .unwrap_or_default()
    }

    pub fn forward(
        &self,
        timestamp_ms: u64,
        severity: Severity,
        participant_name: &str,
        logger_name: &str,
        message: &str,
    ) {
        self.monitors
            .forward(timestamp_ms, severity, participant_name, logger_name, message);
    }

    pub fn monitors(&self) -> &MonitorSet {
        &self.monitors
    }
}

impl Default for RemoteLogForwarder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RemoteLogForwarder {
    fn drop(&mut self) {
        if let Some(handle) = self.service.lock().take() {
            handle
                .entry
                .service
                .release_sink(self as *const RemoteLogForwarder);
        }
    }
}

/// The RPC service participants call into with `onLog`.
pub(crate) struct LogSinkRpcService {
    sinks: Mutex<Vec<Weak<RemoteLogForwarder>>>,
}

impl LogSinkRpcService {
    fn new() -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
        }
    }

    fn register_sink(&self, sink: Weak<RemoteLogForwarder>) {
        self.sinks.lock().push(sink);
    }

    fn release_sink(&self, sink: *const RemoteLogForwarder) {
        self.sinks
            .lock()
            .retain(|existing| !std::ptr::eq(existing.as_ptr(), sink));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sinks
            .lock()
            .iter()
            .all(|sink| sink.strong_count() == 0)
    }
}

impl RpcService for LogSinkRpcService {
    fn handle(&self, method: &str, params: &Value) -> Result<Value, BusError> {
        if method != "onLog" {
            return Err(BusError::UnknownMethod {
                service: LOGGING_SINK_CLIENT_SERVICE.to_string(),
                method: method.to_string(),
            });
        }

        let text = |field: &str| {
            params
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let severity = Severity::from_wire(
            params
                .get("severity")
                .and_then(Value::as_i64)
                .unwrap_or(Severity::Info as i64),
        );
        // timestamps arrive as nanoseconds, numeric or stringly typed
        let timestamp_ns = match params.get("timestamp") {
            Some(Value::Number(ns)) => ns.as_u64().unwrap_or(0),
            Some(Value::String(ns)) => ns.parse().unwrap_or(0),
            _ => 0,
        };

        let description = text("description");
        let logger_name = text("logger_name");
        let participant_name = text("participant_name");

        let sinks = self.sinks.lock().clone();
        for sink in sinks.iter().filter_map(Weak::upgrade) {
            sink.forward(
                timestamp_ns / 1_000_000,
                severity,
                &participant_name,
                &logger_name,
                &description,
            );
        }
        Ok(json!(0))
    }
}

/// One hosted sink server per system name, kept alive by the
/// forwarders of the `System` instances using it.
pub(crate) struct SinkServerEntry {
    system_name: String,
    server: Arc<dyn RpcServer>,
    pub(crate) service: Arc<LogSinkRpcService>,
    pub(crate) url: String,
}

impl Drop for SinkServerEntry {
    fn drop(&mut self) {
        let _ = self
            .server
            .unregister_service(LOGGING_SINK_CLIENT_SERVICE);
        tracing::debug!(system = %self.system_name, "unregistered log sink server");
    }
}

fn sink_servers() -> &'static Mutex<HashMap<String, Weak<SinkServerEntry>>> {
    static SERVERS: OnceLock<Mutex<HashMap<String, Weak<SinkServerEntry>>>> = OnceLock::new();
    SERVERS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn next_server_id() -> u32 {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

fn acquire_sink_server(
    system_name: &str,
    logger: &Arc<SystemLogger>,
) -> Result<Arc<SinkServerEntry>, SystemError> {
    let mut servers = sink_servers().lock();
    if let Some(existing) = servers.get(system_name).and_then(Weak::upgrade) {
        return Ok(existing);
    }

    let bus = convoy_bus::connect(system_name, USE_DEFAULT_URL)?;
    let access = bus.system_access(system_name)?;
    let server = access.create_server(
        &format!("system_{system_name}_{}", next_server_id()),
        USE_DEFAULT_URL,
    )?;
    let service = Arc::new(LogSinkRpcService::new());
    if let Err(error) =
        server.register_service(LOGGING_SINK_CLIENT_SERVICE, Arc::clone(&service) as _)
    {
        system_log!(
            logger,
            Severity::Warning,
            "It is not possible to register a log sink server for system '{}': {}",
            system_name,
            error
        );
    } else {
        system_log!(
            logger,
            Severity::Debug,
            "Successfully registered a log sink server for system '{}'",
            system_name
        );
    }
    let url = rewrite_local_host(&server.url());

    let entry = Arc::new(SinkServerEntry {
        system_name: system_name.to_string(),
        server,
        service,
        url,
    });
    servers.insert(system_name.to_string(), Arc::downgrade(&entry));
    Ok(entry)
}

/// Participants cannot call back into `0.0.0.0`; advertise the local
/// host name instead.
pub(crate) fn rewrite_local_host(url: &str) -> String {
    match url.strip_prefix("http://0.0.0.0:") {
        Some(rest) => {
            let host = hostname::get()
                .ok()
                .and_then(|name| name.into_string().ok())
                .unwrap_or_else(|| "localhost".to_string());
            format!("http://{host}:{rest}")
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
