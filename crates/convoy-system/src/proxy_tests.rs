// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::shared_bus;
use convoy_rpc::testkit::SimParticipant;
use convoy_rpc::HEALTH_IID;

const LOG_SERVER_URL: &str = "http://controller.sim:7777/logsink";

fn proxy_for(sim: &SimParticipant, system_name: &str) -> ParticipantProxy {
    let access = shared_bus().access(system_name);
    access.add_participant(sim.scripted());
    ParticipantProxy::connect(
        sim.name(),
        &format!("http://{}.sim:9090", sim.name()),
        system_name,
        LOG_SERVER_URL,
        Arc::new(SystemLogger::new(system_name)),
        access,
        Duration::from_secs(5),
    )
}

#[test]
fn connect_registers_the_log_sink() {
    let sim = SimParticipant::new("p1");
    let proxy = proxy_for(&sim, "proxy_logreg");
    assert!(proxy.logging_registered());
    assert_eq!(
        sim.sink_registry.registered_urls(),
        vec![LOG_SERVER_URL.to_string()]
    );

    proxy.deregister_logging();
    assert!(!proxy.logging_registered());
    assert!(sim.sink_registry.registered_urls().is_empty());
}

#[test]
fn shared_registrations_are_reference_counted() {
    let sim = SimParticipant::new("p1");
    let first = proxy_for(&sim, "proxy_refcount");
    // a second controller instance of the same system registers the
    // same url with the same participant
    let access = shared_bus().access("proxy_refcount");
    let second = ParticipantProxy::connect(
        sim.name(),
        "http://p1.sim:9090",
        "proxy_refcount",
        LOG_SERVER_URL,
        Arc::new(SystemLogger::new("proxy_refcount")),
        access,
        Duration::from_secs(5),
    );
    assert_eq!(sim.sink_registry.registered_urls().len(), 2);

    first.deregister_logging();
    // the remote keeps one registration for the remaining holder
    assert_eq!(sim.sink_registry.registered_urls().len(), 2);
    second.deregister_logging();
    assert!(sim.sink_registry.registered_urls().is_empty());
}

#[test]
fn query_state_walks_the_remote_state_machine() {
    let sim = SimParticipant::new("p1");
    let proxy = proxy_for(&sim, "proxy_state");
    assert_eq!(proxy.query_state(), ParticipantState::Unloaded);

    sim.state_machine.set_state("Running");
    assert_eq!(proxy.query_state(), ParticipantState::Running);
}

#[test]
fn missing_state_machine_reports_unreachable() {
    let sim = SimParticipant::without_state_machine("recorder");
    let proxy = proxy_for(&sim, "proxy_no_sm");
    assert_eq!(proxy.query_state(), ParticipantState::Unreachable);
}

#[test]
fn marked_not_reachable_skips_rpc() {
    let sim = SimParticipant::new("p1");
    let proxy = proxy_for(&sim, "proxy_marked");
    proxy.mark_not_reachable();
    assert!(proxy.is_not_reachable());
    assert_eq!(proxy.query_state(), ParticipantState::Unreachable);
}

#[test]
fn iid_lookup_is_cached_until_the_state_changes() {
    let sim = SimParticipant::new("p1");
    let proxy = proxy_for(&sim, "proxy_iids");

    assert_eq!(
        proxy.components_supporting(HEALTH_IID).unwrap(),
        vec!["health_service".to_string()]
    );

    // the advertisement changes, but the state did not: still cached
    sim.info.remove_component("health_service");
    assert_eq!(
        proxy.components_supporting(HEALTH_IID).unwrap(),
        vec!["health_service".to_string()]
    );

    // a state change invalidates the cache
    proxy.state_machine_client().unwrap().load().unwrap();
    assert!(proxy.components_supporting(HEALTH_IID).unwrap().is_empty());
}

#[test]
fn priorities_are_stored_on_the_participant() {
    let sim = SimParticipant::new("p1");
    let proxy = proxy_for(&sim, "proxy_prio_remote");

    proxy.set_init_priority(7).unwrap();
    proxy.set_start_priority(-2).unwrap();
    assert_eq!(sim.properties.get("service_bus/init_priority").unwrap().0, "7");
    assert_eq!(
        sim.properties.get("service_bus/start_priority").unwrap().0,
        "-2"
    );
    assert_eq!(proxy.init_priority().unwrap(), 7);
    assert_eq!(proxy.start_priority().unwrap(), -2);
}

#[test]
fn old_participants_fall_back_to_local_priorities() {
    let sim = SimParticipant::new("p1");
    sim.properties.remove_node("service_bus");
    let proxy = proxy_for(&sim, "proxy_prio_local");

    proxy.set_init_priority(5).unwrap();
    assert_eq!(proxy.init_priority().unwrap(), 5);
    assert!(sim.properties.get("service_bus/init_priority").is_none());
}

#[test]
fn garbage_priority_value_is_an_error() {
    let sim = SimParticipant::new("p1");
    sim.properties.set("service_bus/init_priority", "soon", "int32");
    let proxy = proxy_for(&sim, "proxy_prio_bad");
    assert!(matches!(
        proxy.init_priority().unwrap_err(),
        SystemError::Property { .. }
    ));
}

#[test]
fn additional_info_has_a_defaulted_getter() {
    let sim = SimParticipant::new("p1");
    let proxy = proxy_for(&sim, "proxy_info");
    assert_eq!(proxy.additional_info("role", "unset"), "unset");
    proxy.set_additional_info("role", "camera");
    assert_eq!(proxy.additional_info("role", "unset"), "camera");
}

#[test]
fn copy_values_travel_without_connections() {
    let sim = SimParticipant::new("p1");
    sim.properties.remove_node("service_bus");
    let original = proxy_for(&sim, "proxy_copy");
    original.set_init_priority(3).unwrap();
    original.set_additional_info("role", "radar");

    let copy = proxy_for(&sim, "proxy_copy_target");
    original.copy_values_to(&copy);
    assert_eq!(copy.init_priority().unwrap(), 3);
    assert_eq!(copy.additional_info("role", ""), "radar");
}

#[test]
fn health_events_feed_the_listener() {
    let sim = SimParticipant::new("p1");
    sim.health.set_reply(serde_json::json!({
        "jobs_healthiness": [
            { "job_name": "drive", "cycle_time": 1_000_000u64, "simulation_timestamp": 0 }
        ]
    }));
    let proxy = proxy_for(&sim, "proxy_health");
    assert!(proxy.participant_health().unwrap().system_time.is_none());

    shared_bus().access("proxy_health").emit_alive("p1");
    let update = proxy.participant_health().unwrap();
    assert!(update.system_time.is_some());
    assert_eq!(update.jobs_healthiness.len(), 1);
}

#[test]
fn deactivated_health_listener_refuses_queries() {
    let sim = SimParticipant::new("p1");
    let proxy = proxy_for(&sim, "proxy_health_off");
    assert!(proxy.health_listener_running());

    proxy.set_health_listener_running(false).unwrap();
    assert!(!proxy.health_listener_running());
    assert!(matches!(
        proxy.participant_health().unwrap_err(),
        SystemError::HealthListenerDisabled { .. }
    ));

    // events no longer reach the listener while deactivated
    shared_bus().access("proxy_health_off").emit_alive("p1");
    proxy.set_health_listener_running(true).unwrap();
    assert!(proxy.participant_health().unwrap().system_time.is_none());
}
