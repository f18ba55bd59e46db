// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::access::{Requester, RpcServer, UpdateEventSink};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Access whose polls pop a scripted queue of results; the last result
/// repeats once the queue drains. Records the window of every poll.
struct ScriptedAccess {
    polls: Mutex<VecDeque<Discovered>>,
    last: Mutex<Discovered>,
    windows: Mutex<Vec<Duration>>,
}

impl ScriptedAccess {
    fn new(polls: Vec<Discovered>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            last: Mutex::new(Discovered::new()),
            windows: Mutex::new(Vec::new()),
        }
    }

    fn total_window(&self) -> Duration {
        self.windows.lock().iter().sum()
    }
}

impl SystemAccess for ScriptedAccess {
    fn system_name(&self) -> String {
        "scripted".to_string()
    }

    fn discover(&self, timeout: Duration) -> Result<Discovered, BusError> {
        self.windows.lock().push(timeout);
        if let Some(next) = self.polls.lock().pop_front() {
            *self.last.lock() = next;
        }
        Ok(self.last.lock().clone())
    }

    fn requester(&self, _participant_name: &str) -> Option<Arc<dyn Requester>> {
        None
    }

    fn create_server(&self, _name: &str, _url: &str) -> Result<Arc<dyn RpcServer>, BusError> {
        Err(BusError::Transport("scripted access hosts no servers".into()))
    }

    fn register_update_sink(&self, _sink: Arc<dyn UpdateEventSink>) -> Result<(), BusError> {
        Ok(())
    }

    fn deregister_update_sink(&self, _sink: &Arc<dyn UpdateEventSink>) -> Result<(), BusError> {
        Ok(())
    }
}

fn result(names: &[&str]) -> Discovered {
    names
        .iter()
        .map(|name| (name.to_string(), format!("http://{name}:9090")))
        .collect()
}

#[test]
fn returns_first_poll_satisfying_count() {
    let access = ScriptedAccess::new(vec![result(&["a"]), result(&["a", "b"])]);
    let found =
        discover_participants_by_count(&access, Duration::from_secs(10), 2).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(access.windows.lock().len(), 2);
}

// Property 6: polls stop at the first satisfying result and the total
// requested poll time never exceeds the budget.
#[test]
fn total_poll_time_stays_within_budget() {
    let access = ScriptedAccess::new(vec![result(&["a"])]);
    let err = discover_participants_by_count(&access, Duration::from_millis(3500), 2).unwrap_err();
    assert!(matches!(err, DiscoveryError::Mismatch(_)));
    // 3 full windows plus a 500 ms remainder
    assert_eq!(
        access.windows.lock().as_slice(),
        &[
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_millis(500)
        ]
    );
    assert_eq!(access.total_window(), Duration::from_millis(3500));
}

#[test]
fn by_names_accepts_superset() {
    // scenario: request {A, B}; polls return [A], then [A, B, C]
    let access = ScriptedAccess::new(vec![result(&["A"]), result(&["A", "B", "C"])]);
    let found = discover_participants_by_names(
        &access,
        Duration::from_secs(10),
        vec!["A".into(), "B".into()],
        false,
    )
    .unwrap();
    assert_eq!(found.len(), 3, "latest poll is returned in full");
}

#[test]
fn by_names_reports_expected_vs_actual() {
    let access = ScriptedAccess::new(vec![result(&["A"])]);
    let err = discover_participants_by_names(
        &access,
        Duration::from_secs(1),
        vec!["A".into(), "B".into()],
        false,
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("A B"), "expected names in {message}");
    assert!(message.contains("actually discovered"), "{message}");
}

#[test]
fn by_names_across_systems_splits_identifiers() {
    let access = ScriptedAccess::new(vec![result(&["A@sim", "B@sim"])]);
    discover_participants_by_names(
        &access,
        Duration::from_secs(1),
        vec!["A".into(), "B".into()],
        true,
    )
    .unwrap();
}

#[test]
fn malformed_scoped_identifier_is_fatal() {
    let access = ScriptedAccess::new(vec![result(&["A@sim", "broken"])]);
    let err = discover_participants_by_names(
        &access,
        Duration::from_secs(30),
        vec!["A".into()],
        true,
    )
    .unwrap_err();
    assert!(matches!(err, DiscoveryError::Parse(ref s) if s == "broken"));
    // aborted on the first poll instead of burning the budget
    assert_eq!(access.windows.lock().len(), 1);
}

#[test]
fn split_scoped_name_requires_both_parts() {
    assert_eq!(
        split_scoped_name("p1@sim"),
        Some(("p1".to_string(), "sim".to_string()))
    );
    assert_eq!(split_scoped_name("p1"), None);
    assert_eq!(split_scoped_name("p1@"), None);
    assert_eq!(split_scoped_name("@sim"), None);
}

#[test]
fn zero_timeout_polls_exactly_once() {
    let access = ScriptedAccess::new(vec![result(&["a"])]);
    let found = discover_participants_by_count(&access, Duration::ZERO, 1).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(access.windows.lock().as_slice(), &[Duration::ZERO]);
}
