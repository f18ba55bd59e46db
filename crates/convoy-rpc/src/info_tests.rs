// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::names::*;
use crate::testkit::SimParticipant;
use convoy_bus::loopback::LoopbackBus;
use convoy_bus::SystemAccess;

fn client_for(sim: &SimParticipant) -> ParticipantInfoClient {
    let bus = LoopbackBus::new();
    let access = bus.access("sim");
    access.add_participant(sim.scripted());
    let requester = access.requester(sim.name()).unwrap();
    ParticipantInfoClient::new(requester, PARTICIPANT_INFO_SERVICE)
}

#[test]
fn components_include_the_standard_set() {
    let sim = SimParticipant::new("p1");
    let info = client_for(&sim);
    let components = info.rpc_components().unwrap();
    assert!(components.contains(&STATE_MACHINE_SERVICE.to_string()));
    assert!(components.contains(&CONFIGURATION_SERVICE.to_string()));
    assert!(components.contains(&HEALTH_SERVICE.to_string()));
}

#[test]
fn iids_reflect_the_dialect() {
    let current = SimParticipant::new("p1");
    let legacy = SimParticipant::legacy("p2");
    assert_eq!(
        client_for(&current)
            .rpc_component_iids(STATE_MACHINE_SERVICE)
            .unwrap(),
        vec![STATE_MACHINE_IID_V2.to_string()]
    );
    assert_eq!(
        client_for(&legacy)
            .rpc_component_iids(STATE_MACHINE_SERVICE)
            .unwrap(),
        vec![STATE_MACHINE_IID_V1.to_string()]
    );
}

#[test]
fn unknown_component_has_no_iids() {
    let sim = SimParticipant::new("p1");
    assert!(client_for(&sim)
        .rpc_component_iids("telemetry")
        .unwrap()
        .is_empty());
}

#[test]
fn missing_participant_surfaces_transport_error() {
    let bus = LoopbackBus::new();
    let access = bus.access("sim");
    assert!(access.requester("ghost").is_none());
}
