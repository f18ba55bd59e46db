// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery entry points producing ready-to-use `System` instances.

use crate::error::SystemError;
use crate::system::{System, POOL_SIZE_FOR_PARALLEL_OPS};
use convoy_bus::{
    discover_participants, discover_participants_by_count, discover_participants_by_names,
    split_scoped_name, Discovered, DiscoveryError, DISCOVER_ALL_SYSTEMS, USE_DEFAULT_URL,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Duration;

/// What a discovery must find before it may return early.
#[derive(Debug, Clone)]
pub enum DiscoverExpectation {
    /// Whatever shows up within the timeout.
    Any,
    /// At least this many participants.
    Count(usize),
    /// At least these participants, by name.
    Names(Vec<String>),
}

/// Discover the participants of `system_name` and build a `System`
/// over them.
pub fn discover_system(system_name: &str, timeout: Duration) -> Result<System, SystemError> {
    discover_system_expecting_at(
        system_name,
        USE_DEFAULT_URL,
        DiscoverExpectation::Any,
        timeout,
    )
}

pub fn discover_system_at(
    system_name: &str,
    url: &str,
    timeout: Duration,
) -> Result<System, SystemError> {
    discover_system_expecting_at(system_name, url, DiscoverExpectation::Any, timeout)
}

pub fn discover_system_expecting(
    system_name: &str,
    expectation: DiscoverExpectation,
    timeout: Duration,
) -> Result<System, SystemError> {
    discover_system_expecting_at(system_name, USE_DEFAULT_URL, expectation, timeout)
}

pub fn discover_system_expecting_at(
    system_name: &str,
    url: &str,
    expectation: DiscoverExpectation,
    timeout: Duration,
) -> Result<System, SystemError> {
    let bus = convoy_bus::connect(system_name, url)?;
    let access = bus.system_access(system_name)?;
    let discovered = run_discovery(access.as_ref(), expectation, timeout, false)?;

    let system = System::with_url(system_name, url)?;
    system.add_async(&discovered)?;
    Ok(system)
}

/// Discover every reachable system and build one `System` per group
/// of `participant@system` identifiers.
pub fn discover_all_systems(timeout: Duration) -> Result<Vec<System>, SystemError> {
    discover_all_systems_at(USE_DEFAULT_URL, timeout)
}

pub fn discover_all_systems_at(url: &str, timeout: Duration) -> Result<Vec<System>, SystemError> {
    let bus = convoy_bus::connect(DISCOVER_ALL_SYSTEMS, url)?;
    let access = bus.system_access(DISCOVER_ALL_SYSTEMS)?;
    let discovered = run_discovery(access.as_ref(), DiscoverExpectation::Any, timeout, true)?;
    if discovered.is_empty() {
        return Ok(Vec::new());
    }

    // group by system; identifiers that do not split are fatal
    let mut groups: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (scoped, participant_url) in discovered {
        let (participant_name, found_system) = split_scoped_name(&scoped)
            .ok_or(DiscoveryError::Parse(scoped.clone()))
            .map_err(SystemError::from)?;
        groups
            .entry(found_system)
            .or_default()
            .insert(participant_name, participant_url);
    }

    let mut systems = Vec::with_capacity(groups.len());
    for system_name in groups.keys() {
        systems.push(System::with_url(system_name, url)?);
    }

    // the worker budget is split across the discovered systems
    let group_count = groups.len().clamp(1, POOL_SIZE_FOR_PARALLEL_OPS as usize) as u8;
    let per_system_pool = (POOL_SIZE_FOR_PARALLEL_OPS / group_count).max(1);
    let group_list: Vec<&BTreeMap<String, String>> = groups.values().collect();
    let results: Vec<Result<(), SystemError>> = match rayon::ThreadPoolBuilder::new()
        .num_threads(groups.len())
        .build()
    {
        Ok(pool) => pool.install(|| {
            systems
                .par_iter()
                .zip(group_list.par_iter())
                .map(|(system, participants)| {
                    system.add_async_with_pool(participants, per_system_pool)
                })
                .collect()
        }),
        Err(error) => {
            tracing::warn!(%error, "worker pool unavailable, populating systems serially");
            systems
                .iter()
                .zip(group_list.iter())
                .map(|(system, participants)| {
                    system.add_async_with_pool(participants, per_system_pool)
                })
                .collect()
        }
    };
    for result in results {
        result?;
    }
    Ok(systems)
}

fn run_discovery(
    access: &dyn convoy_bus::SystemAccess,
    expectation: DiscoverExpectation,
    timeout: Duration,
    across_systems: bool,
) -> Result<Discovered, SystemError> {
    let discovered = match expectation {
        DiscoverExpectation::Any => discover_participants(access, timeout),
        DiscoverExpectation::Count(count) => {
            discover_participants_by_count(access, timeout, count)
        }
        DiscoverExpectation::Names(names) => {
            discover_participants_by_names(access, timeout, names, across_systems)
        }
    }?;
    Ok(discovered)
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
