// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{shared_bus, RecordingMonitor};
use convoy_core::EventMonitor;

fn monitor_as_dyn(monitor: &Arc<RecordingMonitor>) -> Arc<dyn EventMonitor> {
    Arc::clone(monitor) as Arc<dyn EventMonitor>
}

// Property 8: a message reaches every monitor whose level admits its
// severity, and none that was released beforehand.
#[test]
fn fan_out_honors_levels_and_registration() {
    let set = MonitorSet::new();
    set.set_level(Severity::Debug);

    let info_monitor = RecordingMonitor::new();
    let all_monitor = RecordingMonitor::new();
    set.register(monitor_as_dyn(&info_monitor));
    set.register(monitor_as_dyn(&all_monitor));

    set.forward(1, Severity::Warning, "p1", "job", "first");
    assert_eq!(info_monitor.events().len(), 1);
    assert_eq!(all_monitor.events().len(), 1);

    let dyn_info = monitor_as_dyn(&info_monitor);
    set.release(&dyn_info);
    set.forward(2, Severity::Warning, "p1", "job", "second");
    assert_eq!(info_monitor.events().len(), 1, "released monitor is quiet");
    assert_eq!(all_monitor.events().len(), 2);
}

#[test]
fn level_filters_messages() {
    let set = MonitorSet::new();
    let monitor = RecordingMonitor::new();
    set.register(monitor_as_dyn(&monitor));

    set.set_level(Severity::Warning);
    set.forward(1, Severity::Info, "p1", "job", "too chatty");
    set.forward(2, Severity::Warning, "p1", "job", "warned");
    set.forward(3, Severity::Fatal, "p1", "job", "fatal");
    assert_eq!(monitor.messages(), vec!["warned", "fatal"]);

    set.set_level(Severity::Off);
    set.forward(4, Severity::Fatal, "p1", "job", "dropped");
    assert_eq!(monitor.events().len(), 2);
}

#[test]
fn system_logger_uses_the_fixed_logger_name() {
    let logger = SystemLogger::new("sim");
    let monitor = RecordingMonitor::new();
    logger.monitors().register(monitor_as_dyn(&monitor));

    system_log!(logger, Severity::Warning, "participant {} vanished", "p2");

    let events = monitor.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].participant, "sim");
    assert_eq!(events[0].logger, SYSTEM_LOGGER_NAME);
    assert!(events[0].message.contains("participant p2 vanished"));
    assert!(events[0].message.contains("line:"), "call site suffix");
}

#[test]
fn proxy_errors_carry_component_and_participant() {
    let logger = SystemLogger::new("sim");
    let monitor = RecordingMonitor::new();
    logger.monitors().register(monitor_as_dyn(&monitor));
    logger.log_proxy_error(Severity::Error, "p1", "configuration", "boom");
    let message = &monitor.events()[0].message;
    assert!(message.contains("configuration"));
    assert!(message.contains("p1"));
    assert!(message.contains("boom"));
}

#[test]
fn on_log_converts_nanoseconds_and_fans_out() {
    let service = LogSinkRpcService::new();
    let forwarder = Arc::new(RemoteLogForwarder::new());
    let monitor = RecordingMonitor::new();
    forwarder.monitors().register(monitor_as_dyn(&monitor));
    service.register_sink(Arc::downgrade(&forwarder));

    let reply = service
        .handle(
            "onLog",
            &json!({
                "description": "remote says hi",
                "logger_name": "element_logger",
                "participant_name": "p7",
                "severity": Severity::Warning as i64,
                "timestamp": "1500000000"
            }),
        )
        .unwrap();
    assert_eq!(reply, json!(0));

    let events = monitor.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp_ms, 1_500);
    assert_eq!(events[0].severity, Severity::Warning);
    assert_eq!(events[0].participant, "p7");
    assert_eq!(events[0].logger, "element_logger");
}

#[test]
fn dropped_forwarders_no_longer_receive() {
    let service = LogSinkRpcService::new();
    let forwarder = Arc::new(RemoteLogForwarder::new());
    service.register_sink(Arc::downgrade(&forwarder));
    assert!(!service.is_empty());
    drop(forwarder);
    assert!(service.is_empty());
    // delivery to a dead sink is a no-op, not an error
    service
        .handle("onLog", &json!({ "description": "late" }))
        .unwrap();
}

#[test]
fn sink_server_is_shared_per_system_name_and_refcounted() {
    let bus = shared_bus();
    let logger = Arc::new(SystemLogger::new("logshare"));

    let first = Arc::new(RemoteLogForwarder::new());
    RemoteLogForwarder::init_rpc_service(&first, "logshare", &logger).unwrap();
    let second = Arc::new(RemoteLogForwarder::new());
    RemoteLogForwarder::init_rpc_service(&second, "logshare", &logger).unwrap();

    let url = first.url();
    assert!(!url.is_empty());
    assert_eq!(url, second.url(), "one server per system name");

    // both forwarders receive pushed logs
    let first_monitor = RecordingMonitor::new();
    let second_monitor = RecordingMonitor::new();
    first.monitors().register(monitor_as_dyn(&first_monitor));
    second.monitors().register(monitor_as_dyn(&second_monitor));
    bus.call_server(
        &url,
        convoy_rpc::LOGGING_SINK_CLIENT_SERVICE,
        "onLog",
        json!({
            "description": "shared",
            "logger_name": "l",
            "participant_name": "p",
            "severity": Severity::Info as i64,
            "timestamp": 2_000_000u64
        }),
    )
    .unwrap();
    assert_eq!(first_monitor.events().len(), 1);
    assert_eq!(second_monitor.events().len(), 1);

    // last release tears the server down
    drop(first);
    assert!(bus
        .call_server(
            &url,
            convoy_rpc::LOGGING_SINK_CLIENT_SERVICE,
            "onLog",
            json!({ "description": "still up" })
        )
        .is_ok());
    drop(second);
    assert!(bus
        .call_server(
            &url,
            convoy_rpc::LOGGING_SINK_CLIENT_SERVICE,
            "onLog",
            json!({ "description": "gone" })
        )
        .is_err());
}

#[test]
fn wildcard_host_is_rewritten() {
    let rewritten = rewrite_local_host("http://0.0.0.0:9090/sink");
    assert!(!rewritten.contains("0.0.0.0"));
    assert!(rewritten.ends_with(":9090/sink"));
    assert_eq!(
        rewrite_local_host("http://node1:9090/sink"),
        "http://node1:9090/sink"
    );
}
