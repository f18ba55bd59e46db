// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::names::*;
use crate::testkit::SimParticipant;
use convoy_bus::loopback::LoopbackBus;
use convoy_bus::{Requester, SystemAccess};
use convoy_core::ParticipantState;
use std::sync::Arc;

fn requester_for(sim: &SimParticipant) -> Arc<dyn Requester> {
    let bus = LoopbackBus::new();
    let access = bus.access("sim");
    access.add_participant(sim.scripted());
    access.requester(sim.name()).unwrap()
}

#[test]
fn json_dialect_walks_through_startup() {
    let sim = SimParticipant::new("p1");
    let sm = JsonStateMachineClient::new(requester_for(&sim), STATE_MACHINE_SERVICE);
    assert_eq!(sm.state(), ParticipantState::Unloaded);
    sm.load().unwrap();
    sm.initialize().unwrap();
    sm.start().unwrap();
    assert_eq!(sm.state(), ParticipantState::Running);
    sm.pause().unwrap();
    assert_eq!(sm.state(), ParticipantState::Paused);
}

#[test]
fn json_dialect_denial_carries_remote_reason() {
    let sim = SimParticipant::new("p1");
    let sm = JsonStateMachineClient::new(requester_for(&sim), STATE_MACHINE_SERVICE);
    // starting from unloaded is illegal
    let err = sm.start().unwrap_err();
    match err {
        RpcError::Denied { transition, reason } => {
            assert_eq!(transition, "start");
            assert!(reason.contains("cannot start"), "{reason}");
        }
        other => panic!("expected denial, got {other:?}"),
    }
}

#[test]
fn legacy_dialect_maps_false_to_denied() {
    let sim = SimParticipant::legacy("p1");
    let sm = LegacyStateMachineClient::new(requester_for(&sim), STATE_MACHINE_SERVICE);
    sm.load().unwrap();
    let err = sm.load().unwrap_err();
    assert!(matches!(err, RpcError::Denied { ref transition, .. } if transition == "load"));
}

#[test]
fn state_is_unreachable_when_service_is_gone() {
    let sim = SimParticipant::without_state_machine("p1");
    let sm = JsonStateMachineClient::new(requester_for(&sim), STATE_MACHINE_SERVICE);
    assert_eq!(sm.state(), ParticipantState::Unreachable);
    assert!(matches!(
        sm.load().unwrap_err(),
        RpcError::Transport { .. }
    ));
}

#[test]
fn shutdown_uses_the_exit_method() {
    let sim = SimParticipant::new("p1");
    let sm = JsonStateMachineClient::new(requester_for(&sim), STATE_MACHINE_SERVICE);
    sm.shutdown().unwrap();
    // an exited participant no longer reports a known state
    assert_eq!(sm.state(), ParticipantState::Unreachable);
}

#[test]
fn factory_picks_first_advertised_iid() {
    let current = StateMachineClientFactory::from_advertised(
        &[STATE_MACHINE_IID_V2.to_string(), STATE_MACHINE_IID_V1.to_string()],
        STATE_MACHINE_SERVICE,
    );
    assert_eq!(current.iid(), STATE_MACHINE_IID_V2);

    let legacy = StateMachineClientFactory::from_advertised(
        &[STATE_MACHINE_IID_V1.to_string()],
        STATE_MACHINE_SERVICE,
    );
    assert_eq!(legacy.iid(), STATE_MACHINE_IID_V1);
}

#[test]
fn factory_defaults_to_current_dialect_when_nothing_is_advertised() {
    let factory = StateMachineClientFactory::from_advertised(&[], STATE_MACHINE_SERVICE);
    assert_eq!(factory.iid(), STATE_MACHINE_IID_V2);
}

#[test]
fn factory_rejects_unknown_iid() {
    let sim = SimParticipant::new("p1");
    let factory = StateMachineClientFactory::from_advertised(
        &["participant_statemachine.v9".to_string()],
        STATE_MACHINE_SERVICE,
    );
    let err = factory.client(requester_for(&sim)).unwrap_err();
    assert!(matches!(err, RpcError::UnsupportedIid(ref iid) if iid.contains("v9")));
}
