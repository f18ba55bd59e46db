// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::names::*;
use crate::testkit::SimParticipant;
use convoy_bus::loopback::LoopbackBus;
use convoy_bus::{Requester, SystemAccess};
use convoy_core::Severity;
use std::sync::Arc;

fn requester_for(sim: &SimParticipant) -> Arc<dyn Requester> {
    let bus = LoopbackBus::new();
    let access = bus.access("sim");
    access.add_participant(sim.scripted());
    access.requester(sim.name()).unwrap()
}

#[test]
fn logger_filter_round_trips() {
    let sim = SimParticipant::new("p1");
    let client = LoggingServiceClient::new(requester_for(&sim), LOGGING_SERVICE);

    let filter = LoggerFilter {
        severity: Severity::Warning,
        enabled_sinks: vec!["console".to_string(), "rpc".to_string()],
    };
    client.set_logger_filter("job_logger", &filter).unwrap();
    assert_eq!(client.logger_filter("job_logger").unwrap(), filter);
}

#[test]
fn unknown_logger_reports_defaults() {
    let sim = SimParticipant::new("p1");
    let client = LoggingServiceClient::new(requester_for(&sim), LOGGING_SERVICE);
    let filter = client.logger_filter("never_configured").unwrap();
    assert_eq!(filter.severity, Severity::Info);
    assert_eq!(filter.enabled_sinks, vec!["console".to_string()]);
}

#[test]
fn sink_enumeration_and_properties() {
    let sim = SimParticipant::new("p1");
    let client = LoggingServiceClient::new(requester_for(&sim), LOGGING_SERVICE);

    assert!(client.sinks().unwrap().contains(&"file".to_string()));

    let file_sink = client.sink_properties("file");
    assert_eq!(file_sink.property("path").unwrap(), "participant.log");
    assert!(file_sink
        .set_property("path", "other.log", "string")
        .unwrap());
    assert_eq!(file_sink.property("path").unwrap(), "other.log");
    assert_eq!(file_sink.property_names().unwrap(), vec!["path"]);
}

#[test]
fn sink_client_registers_and_unregisters_urls() {
    let sim = SimParticipant::new("p1");
    let client = LoggingSinkClient::new(requester_for(&sim), LOGGING_SINK_SERVICE);

    client.register_client("http://controller:7777/log").unwrap();
    assert_eq!(
        sim.sink_registry.registered_urls(),
        vec!["http://controller:7777/log".to_string()]
    );

    client
        .unregister_client("http://controller:7777/log")
        .unwrap();
    assert!(sim.sink_registry.registered_urls().is_empty());
}
