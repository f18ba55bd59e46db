// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participant states and the transition graph between them.

use serde::{Deserialize, Serialize};

/// State of a single participant, totally ordered for aggregation.
///
/// `Undefined` is never a valid transition target; `Unreachable` means
/// the participant gave no reply or has shut down.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantState {
    #[default]
    Undefined = 0,
    Unreachable = 1,
    Unloaded = 2,
    Loaded = 3,
    Initialized = 4,
    Paused = 5,
    Running = 6,
}

/// Aggregated state of a whole system.
///
/// `state` is the minimum over all member states; `homogeneous` is true
/// iff every member sits exactly in `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemState {
    pub homogeneous: bool,
    pub state: ParticipantState,
}

impl ParticipantState {
    pub const ALL: [ParticipantState; 7] = [
        ParticipantState::Undefined,
        ParticipantState::Unreachable,
        ParticipantState::Unloaded,
        ParticipantState::Loaded,
        ParticipantState::Initialized,
        ParticipantState::Paused,
        ParticipantState::Running,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParticipantState::Undefined => "undefined",
            ParticipantState::Unreachable => "unreachable",
            ParticipantState::Unloaded => "unloaded",
            ParticipantState::Loaded => "loaded",
            ParticipantState::Initialized => "initialized",
            ParticipantState::Paused => "paused",
            ParticipantState::Running => "running",
        }
    }

    /// Parse a lower-case state name. Unknown names map to `Unreachable`,
    /// matching how remote replies outside the known set are treated.
    pub fn from_name(name: &str) -> ParticipantState {
        match name {
            "undefined" => ParticipantState::Undefined,
            "unloaded" => ParticipantState::Unloaded,
            "loaded" => ParticipantState::Loaded,
            "initialized" => ParticipantState::Initialized,
            "paused" => ParticipantState::Paused,
            "running" => ParticipantState::Running,
            _ => ParticipantState::Unreachable,
        }
    }
}

impl std::fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Neighbors of each state in the legal single-hop transition graph.
///
/// Indexed by state discriminant. `Unloaded -> Unreachable` is the
/// shutdown edge; `Undefined` and `Unreachable` have no outgoing edges.
const ADJACENCY: [&[ParticipantState]; 7] = [
    &[], // undefined
    &[], // unreachable
    &[ParticipantState::Unreachable, ParticipantState::Loaded], // unloaded
    &[ParticipantState::Unloaded, ParticipantState::Initialized], // loaded
    &[
        ParticipantState::Loaded,
        ParticipantState::Paused,
        ParticipantState::Running,
    ], // initialized
    &[ParticipantState::Initialized, ParticipantState::Running], // paused
    &[ParticipantState::Initialized, ParticipantState::Paused], // running
];

/// Shortest path from `from` to `to` over the transition graph,
/// including both endpoints. Breadth-first search over seven nodes.
///
/// Returns `[to]` when the states are equal and an empty vector when no
/// path exists (e.g. out of `Unreachable`).
pub fn transition_path(from: ParticipantState, to: ParticipantState) -> Vec<ParticipantState> {
    if from == to {
        return vec![to];
    }

    let mut explored = [false; 7];
    let mut parent: [Option<ParticipantState>; 7] = [None; 7];
    let mut queue = std::collections::VecDeque::new();

    explored[from as usize] = true;
    queue.push_back(from);

    let mut found = false;
    'search: while let Some(node) = queue.pop_front() {
        for &neighbor in ADJACENCY[node as usize] {
            if !explored[neighbor as usize] {
                explored[neighbor as usize] = true;
                parent[neighbor as usize] = Some(node);
                queue.push_back(neighbor);
                if neighbor == to {
                    found = true;
                    break 'search;
                }
            }
        }
    }

    if !found {
        return Vec::new();
    }

    let mut path = vec![to];
    let mut crawl = to;
    while let Some(p) = parent[crawl as usize] {
        path.push(p);
        crawl = p;
    }
    path.reverse();
    path
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
