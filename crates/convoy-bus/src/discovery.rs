// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling discovery of system participants.
//!
//! Discovery polls the bus in fixed one-second windows (the final
//! window takes the remainder of the budget) until a predicate on the
//! discovered set is satisfied or the budget is exhausted. The result
//! of the latest poll is returned on success.

use crate::access::SystemAccess;
use crate::error::BusError;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Width of one discovery poll window.
pub const DISCOVERY_POLL_PERIOD: Duration = Duration::from_secs(1);

/// Discovered participants: name (or `participant@system` when
/// discovering across all systems) mapped to url.
pub type Discovered = BTreeMap<String, String>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("{0}")]
    Mismatch(String),

    #[error("expected a participant identifier like participant_name@system_name but got '{0}'")]
    Parse(String),

    #[error(transparent)]
    Bus(#[from] BusError),
}

enum Unsatisfied {
    /// Keep polling; carry the mismatch description for the final report.
    Retry(String),
    /// Abort immediately.
    Fatal(DiscoveryError),
}

/// Split a `participant@system` identifier into its two parts.
pub fn split_scoped_name(scoped: &str) -> Option<(String, String)> {
    let mut parts = scoped.split('@').filter(|part| !part.is_empty());
    let participant = parts.next()?;
    let system = parts.next()?;
    Some((participant.to_string(), system.to_string()))
}

/// Single discovery pass over the full timeout, no predicate.
pub fn discover_participants(
    access: &dyn SystemAccess,
    timeout: Duration,
) -> Result<Discovered, DiscoveryError> {
    Ok(access.discover(timeout)?)
}

/// Discover until at least `expected_count` participants are visible.
pub fn discover_participants_by_count(
    access: &dyn SystemAccess,
    timeout: Duration,
    expected_count: usize,
) -> Result<Discovered, DiscoveryError> {
    poll_until(access, timeout, |discovered| {
        if discovered.len() >= expected_count {
            Ok(())
        } else {
            Err(Unsatisfied::Retry(format!(
                "Expected to discover {} participants, actually discovered {}",
                expected_count,
                discovered.len()
            )))
        }
    })
}

/// Discover until every expected name is visible. With
/// `across_systems`, discovered identifiers are `participant@system`
/// and are split before comparison; a malformed identifier aborts the
/// discovery with a parse error.
pub fn discover_participants_by_names(
    access: &dyn SystemAccess,
    timeout: Duration,
    expected_names: Vec<String>,
    across_systems: bool,
) -> Result<Discovered, DiscoveryError> {
    let mut expected = expected_names;
    expected.sort();

    poll_until(access, timeout, |discovered| {
        let mut names = Vec::with_capacity(discovered.len());
        for scoped in discovered.keys() {
            if across_systems {
                match split_scoped_name(scoped) {
                    Some((participant, _system)) => names.push(participant),
                    None => {
                        return Err(Unsatisfied::Fatal(DiscoveryError::Parse(scoped.clone())))
                    }
                }
            } else {
                names.push(scoped.clone());
            }
        }
        names.sort();

        let all_present = expected
            .iter()
            .all(|name| names.binary_search(name).is_ok());
        if all_present {
            Ok(())
        } else {
            Err(Unsatisfied::Retry(format!(
                "Expected to discover participants: {}, actually discovered participants: {}",
                expected.join(" "),
                names.join(" ")
            )))
        }
    })
}

fn poll_until(
    access: &dyn SystemAccess,
    timeout: Duration,
    predicate: impl Fn(&Discovered) -> Result<(), Unsatisfied>,
) -> Result<Discovered, DiscoveryError> {
    let period_ms = DISCOVERY_POLL_PERIOD.as_millis();
    let mut full_windows = timeout.as_millis() / period_ms;
    let last_window = Duration::from_millis((timeout.as_millis() % period_ms) as u64);

    loop {
        let window = if full_windows == 0 {
            last_window
        } else {
            DISCOVERY_POLL_PERIOD
        };
        let discovered = access.discover(window)?;
        match predicate(&discovered) {
            Ok(()) => return Ok(discovered),
            Err(Unsatisfied::Fatal(error)) => return Err(error),
            Err(Unsatisfied::Retry(mismatch)) => {
                if full_windows == 0 {
                    return Err(DiscoveryError::Mismatch(mismatch));
                }
            }
        }
        full_windows -= 1;
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
