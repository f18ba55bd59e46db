// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-participant health listening and fleet-wide liveliness
//! classification.

use convoy_bus::{ServiceUpdateEvent, UpdateEventSink};
use convoy_core::{
    ParticipantHealth, ParticipantHealthUpdate, RunningState, Severity,
};
use convoy_rpc::HealthClient;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

type LoggingFn = Box<dyn Fn(Severity, &str) + Send + Sync>;

/// Service-update sink pulling job healthiness from one participant.
///
/// Every alive event of the watched participant triggers a `getHealth`
/// RPC; the reply is stored with its arrival time. Runs on service-bus
/// threads, so failures are logged, never propagated.
pub struct ParticipantHealthListener {
    health: Option<Arc<HealthClient>>,
    participant_name: String,
    system_name: String,
    update: Mutex<ParticipantHealthUpdate>,
    logging_active: AtomicBool,
    log: LoggingFn,
}

impl ParticipantHealthListener {
    pub fn new(
        health: Option<Arc<HealthClient>>,
        participant_name: impl Into<String>,
        system_name: impl Into<String>,
        log: impl Fn(Severity, &str) + Send + Sync + 'static,
    ) -> Self {
        let participant_name = participant_name.into();
        if health.is_none() {
            log(
                Severity::Warning,
                &format!(
                    "RPC health service is missing, connection probably failed \
                     for participant {participant_name}"
                ),
            );
        }
        Self {
            health,
            participant_name,
            system_name: system_name.into(),
            update: Mutex::new(ParticipantHealthUpdate::default()),
            logging_active: AtomicBool::new(true),
            log: Box::new(log),
        }
    }

    pub fn participant_health(&self) -> ParticipantHealthUpdate {
        self.update.lock().clone()
    }

    /// Stop emitting debug logs for incoming events (used while the
    /// owning proxy deregisters its logging).
    pub fn deactivate_logging(&self) {
        self.logging_active.store(false, Ordering::SeqCst);
    }
}

impl UpdateEventSink for ParticipantHealthListener {
    fn update_event(&self, event: &ServiceUpdateEvent) {
        if event.service_name != self.participant_name
            || event.system_name != self.system_name
        {
            return;
        }
        let Some(health) = &self.health else {
            return;
        };
        // the RPC runs outside the lock
        match health.get_health() {
            Ok(jobs_healthiness) => {
                let mut update = self.update.lock();
                update.system_time = Some(Instant::now());
                update.jobs_healthiness = jobs_healthiness;
                if self.logging_active.load(Ordering::SeqCst) {
                    (self.log)(
                        Severity::Debug,
                        &format!("Received update event from {}", self.participant_name),
                    );
                }
            }
            Err(error) => {
                (self.log)(
                    Severity::Warning,
                    &format!(
                        "Fetching health of participant {} failed: {error}",
                        self.participant_name
                    ),
                );
            }
        }
    }
}

/// Classifies the stored health updates against a liveliness timeout.
pub struct ParticipantHealthStateAggregator {
    liveliness_timeout: Duration,
    updates: BTreeMap<String, ParticipantHealthUpdate>,
}

impl ParticipantHealthStateAggregator {
    pub fn new(liveliness_timeout: Duration) -> Self {
        Self {
            liveliness_timeout,
            updates: BTreeMap::new(),
        }
    }

    pub fn set_participant_health(
        &mut self,
        participant_name: impl Into<String>,
        update: ParticipantHealthUpdate,
    ) {
        self.updates.insert(participant_name.into(), update);
    }

    /// A participant is online iff its last update is no older than
    /// the liveliness timeout at `now`.
    pub fn participants_health(&self, now: Instant) -> BTreeMap<String, ParticipantHealth> {
        self.updates
            .iter()
            .map(|(name, update)| {
                (
                    name.clone(),
                    ParticipantHealth {
                        running_state: self.running_state(now, update.system_time),
                        jobs_healthiness: update.jobs_healthiness.clone(),
                    },
                )
            })
            .collect()
    }

    fn running_state(&self, now: Instant, last_update: Option<Instant>) -> RunningState {
        match last_update {
            Some(at) if now.duration_since(at) <= self.liveliness_timeout => RunningState::Online,
            _ => RunningState::Offline,
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
