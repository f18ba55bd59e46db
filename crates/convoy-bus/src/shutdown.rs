// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener removing participants that said goodbye.

use crate::access::{ServiceUpdateEvent, ServiceUpdateEventType, UpdateEventSink};

/// Update-event sink that invokes a callback for every `notify_byebye`
/// of the watched system. The owning `System` uses the callback to
/// mark the named participant unreachable and drop it from the member
/// list.
pub struct ParticipantShutdownListener {
    system_name: String,
    on_shutdown: Box<dyn Fn(&str) + Send + Sync>,
}

impl ParticipantShutdownListener {
    pub fn new(
        system_name: impl Into<String>,
        on_shutdown: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        Self {
            system_name: system_name.into(),
            on_shutdown: Box::new(on_shutdown),
        }
    }
}

impl UpdateEventSink for ParticipantShutdownListener {
    fn update_event(&self, event: &ServiceUpdateEvent) {
        if self.system_name == event.system_name
            && event.event_type == ServiceUpdateEventType::NotifyByebye
        {
            tracing::debug!(
                participant = %event.service_name,
                system = %event.system_name,
                "participant announced shutdown"
            );
            (self.on_shutdown)(&event.service_name);
        }
    }
}
