// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::names::*;
use crate::testkit::SimParticipant;
use convoy_bus::loopback::LoopbackBus;
use convoy_bus::SystemAccess;

fn client_for(sim: &SimParticipant) -> ConfigurationClient {
    let bus = LoopbackBus::new();
    let access = bus.access("sim");
    access.add_participant(sim.scripted());
    ConfigurationClient::new(
        access.requester(sim.name()).unwrap(),
        CONFIGURATION_SERVICE,
    )
}

#[test]
fn priorities_live_under_the_service_bus_node() {
    let sim = SimParticipant::new("p1");
    let config = client_for(&sim);
    let props = config.properties("service_bus").unwrap();
    assert_eq!(props.property("init_priority").unwrap(), "0");
    assert_eq!(props.property_type("init_priority").unwrap(), "int32");

    assert!(props.set_property("init_priority", "7", "int32").unwrap());
    assert_eq!(props.property("init_priority").unwrap(), "7");
    assert_eq!(sim.properties.get("service_bus/init_priority").unwrap().0, "7");
}

#[test]
fn unknown_node_fails_up_front() {
    let sim = SimParticipant::new("p1");
    sim.properties.remove_node("service_bus");
    let config = client_for(&sim);
    assert!(config.properties("service_bus").is_err());
}

#[test]
fn setting_an_unknown_property_is_refused_not_an_error() {
    let sim = SimParticipant::new("p1");
    let config = client_for(&sim);
    let props = config.properties("service_bus").unwrap();
    assert!(!props.set_property("no_such_prop", "1", "int32").unwrap());
}

#[test]
fn root_node_reaches_nested_paths() {
    let sim = SimParticipant::new("p1");
    let config = client_for(&sim);
    let root = config.properties("/").unwrap();
    assert!(root
        .set_property("clock_synchronization/timing_master", "master", "string")
        .unwrap());
    assert_eq!(
        sim.properties
            .get("clock_synchronization/timing_master")
            .unwrap()
            .0,
        "master"
    );
}

#[test]
fn property_names_are_relative_to_the_node() {
    let sim = SimParticipant::new("p1");
    let config = client_for(&sim);
    let props = config.properties("service_bus").unwrap();
    let mut names = props.property_names().unwrap();
    names.sort();
    assert_eq!(names, vec!["init_priority", "start_priority"]);
}

#[test]
fn missing_property_reads_as_empty() {
    let sim = SimParticipant::new("p1");
    let config = client_for(&sim);
    let props = config.properties("service_bus").unwrap();
    assert_eq!(props.property("missing").unwrap(), "");
}
