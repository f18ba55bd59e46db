// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use convoy_bus::loopback::LoopbackBus;
use convoy_bus::{ServiceUpdateEventType, SystemAccess};
use convoy_rpc::testkit::SimParticipant;
use convoy_rpc::HEALTH_SERVICE;
use serde_json::json;

fn alive_event(system: &str, participant: &str) -> ServiceUpdateEvent {
    ServiceUpdateEvent {
        service_name: participant.to_string(),
        system_name: system.to_string(),
        host_url: String::new(),
        event_type: ServiceUpdateEventType::NotifyAlive,
    }
}

fn listener_for(sim: &SimParticipant, system: &str) -> (ParticipantHealthListener, Arc<Mutex<Vec<(Severity, String)>>>) {
    let bus = LoopbackBus::new();
    let access = bus.access(system);
    access.add_participant(sim.scripted());
    let client = Arc::new(HealthClient::new(
        access.requester(sim.name()).unwrap(),
        HEALTH_SERVICE,
    ));
    let log: Arc<Mutex<Vec<(Severity, String)>>> = Arc::default();
    let log_in_listener = Arc::clone(&log);
    let listener = ParticipantHealthListener::new(
        Some(client),
        sim.name(),
        system,
        move |severity, message| {
            log_in_listener.lock().push((severity, message.to_string()));
        },
    );
    (listener, log)
}

#[test]
fn update_event_pulls_health() {
    let sim = SimParticipant::new("p1");
    sim.health.set_reply(json!({
        "jobs_healthiness": [
            { "job_name": "drive", "cycle_time": 1_000_000u64, "simulation_timestamp": 0 }
        ]
    }));
    let (listener, log) = listener_for(&sim, "sim");

    assert!(listener.participant_health().system_time.is_none());
    listener.update_event(&alive_event("sim", "p1"));

    let update = listener.participant_health();
    assert!(update.system_time.is_some());
    assert_eq!(update.jobs_healthiness.len(), 1);
    assert_eq!(update.jobs_healthiness[0].job_name, "drive");
    assert!(log
        .lock()
        .iter()
        .any(|(severity, message)| *severity == Severity::Debug
            && message.contains("Received update event from p1")));
}

#[test]
fn foreign_events_are_ignored() {
    let sim = SimParticipant::new("p1");
    let (listener, _log) = listener_for(&sim, "sim");

    listener.update_event(&alive_event("other_system", "p1"));
    listener.update_event(&alive_event("sim", "p2"));
    assert!(listener.participant_health().system_time.is_none());
}

#[test]
fn deactivated_logging_stays_quiet_but_still_stores() {
    let sim = SimParticipant::new("p1");
    let (listener, log) = listener_for(&sim, "sim");
    listener.deactivate_logging();
    listener.update_event(&alive_event("sim", "p1"));
    assert!(listener.participant_health().system_time.is_some());
    assert!(log
        .lock()
        .iter()
        .all(|(severity, _)| *severity != Severity::Debug));
}

#[test]
fn missing_health_service_warns_at_construction() {
    let warnings: Arc<Mutex<Vec<(Severity, String)>>> = Arc::default();
    let warnings_in_listener = Arc::clone(&warnings);
    let _listener = ParticipantHealthListener::new(
        None,
        "p9",
        "sim",
        move |severity, message| {
            warnings_in_listener.lock().push((severity, message.to_string()));
        },
    );
    let recorded = warnings.lock();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, Severity::Warning);
    assert!(recorded[0].1.contains("p9"));
}

// Property 7: online iff now - last update <= liveliness timeout.
#[test]
fn liveliness_classification() {
    let mut aggregator = ParticipantHealthStateAggregator::new(Duration::from_secs(20));
    let now = Instant::now();

    aggregator.set_participant_health(
        "fresh",
        ParticipantHealthUpdate {
            system_time: Some(now - Duration::from_secs(5)),
            jobs_healthiness: Vec::new(),
        },
    );
    aggregator.set_participant_health(
        "boundary",
        ParticipantHealthUpdate {
            system_time: Some(now - Duration::from_secs(20)),
            jobs_healthiness: Vec::new(),
        },
    );
    aggregator.set_participant_health(
        "stale",
        ParticipantHealthUpdate {
            system_time: Some(now - Duration::from_secs(21)),
            jobs_healthiness: Vec::new(),
        },
    );
    aggregator.set_participant_health("silent", ParticipantHealthUpdate::default());

    let health = aggregator.participants_health(now);
    assert_eq!(health["fresh"].running_state, RunningState::Online);
    assert_eq!(health["boundary"].running_state, RunningState::Online);
    assert_eq!(health["stale"].running_state, RunningState::Offline);
    assert_eq!(health["silent"].running_state, RunningState::Offline);
}

#[test]
fn newest_update_wins() {
    let mut aggregator = ParticipantHealthStateAggregator::new(Duration::from_secs(1));
    let now = Instant::now();
    aggregator.set_participant_health(
        "p1",
        ParticipantHealthUpdate {
            system_time: Some(now - Duration::from_secs(60)),
            jobs_healthiness: Vec::new(),
        },
    );
    aggregator.set_participant_health(
        "p1",
        ParticipantHealthUpdate {
            system_time: Some(now),
            jobs_healthiness: Vec::new(),
        },
    );
    let health = aggregator.participants_health(now);
    assert_eq!(health.len(), 1);
    assert_eq!(health["p1"].running_state, RunningState::Online);
}
