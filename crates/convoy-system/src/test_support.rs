// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for this crate's tests.

use convoy_bus::loopback::LoopbackBus;
use convoy_core::{EventMonitor, Severity};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// The loopback bus registered as this process's transport. Tests
/// share it and isolate themselves by system name.
pub fn shared_bus() -> &'static LoopbackBus {
    static BUS: OnceLock<LoopbackBus> = OnceLock::new();
    BUS.get_or_init(LoopbackBus::install)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp_ms: u64,
    pub severity: Severity,
    pub participant: String,
    pub logger: String,
    pub message: String,
}

/// Monitor capturing everything it receives.
pub struct RecordingMonitor {
    events: Mutex<Vec<LogEvent>>,
}

impl RecordingMonitor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|event| event.message.clone())
            .collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.message.contains(needle))
            .count()
    }
}

impl EventMonitor for RecordingMonitor {
    fn on_log(
        &self,
        timestamp_ms: u64,
        severity: Severity,
        participant_name: &str,
        logger_name: &str,
        message: &str,
    ) {
        self.events.lock().push(LogEvent {
            timestamp_ms,
            severity,
            participant: participant_name.to_string(),
            logger: logger_name.to_string(),
            message: message.to_string(),
        });
    }
}
