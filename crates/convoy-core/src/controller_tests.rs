// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;
use ParticipantState::*;

fn states(pairs: &[(&str, ParticipantState)]) -> ParticipantStates {
    pairs
        .iter()
        .map(|(name, state)| (name.to_string(), *state))
        .collect()
}

#[test]
fn empty_fleet_aggregates_to_unreachable() {
    let empty = ParticipantStates::new();
    assert_eq!(aggregated_state(&empty), Unreachable);
    let agg = system_state(&empty);
    assert_eq!(agg.state, Unreachable);
    assert!(!agg.homogeneous);
}

#[test]
fn aggregation_is_the_minimum() {
    let map = states(&[("a", Running), ("b", Loaded), ("c", Initialized)]);
    assert_eq!(aggregated_state(&map), Loaded);
    let agg = system_state(&map);
    assert_eq!(agg.state, Loaded);
    assert!(!agg.homogeneous);
}

#[test]
fn homogeneous_fleet_reports_homogeneous() {
    let map = states(&[("a", Running), ("b", Running)]);
    let agg = system_state(&map);
    assert!(agg.homogeneous);
    assert_eq!(agg.state, Running);
}

#[parameterized(
    all_below_picks_lowest = { &[("a", Unloaded), ("b", Initialized)], Running, Unloaded },
    all_above_picks_highest = { &[("a", Running), ("b", Paused)], Loaded, Running },
    mixed_picks_highest = { &[("a", Unloaded), ("b", Running)], Initialized, Running },
    at_target_picks_target = { &[("a", Running), ("b", Running)], Running, Running },
)]
fn trigger_selection(members: &[(&str, ParticipantState)], target: ParticipantState, expected: ParticipantState) {
    assert_eq!(state_to_trigger(&states(members), target), expected);
}

#[parameterized(
    up_one = { Unloaded, Running, Loaded },
    up_mid = { Loaded, Running, Initialized },
    down_one = { Running, Unloaded, Initialized },
    pause_direct = { Running, Paused, Paused },
    already_there = { Running, Running, Running },
    dead_end = { Unreachable, Running, Unreachable },
)]
fn next_hop(from: ParticipantState, target: ParticipantState, expected: ParticipantState) {
    assert_eq!(next_state(from, target), expected);
}

#[test]
fn target_reached_requires_all_members() {
    let map = states(&[("a", Running), ("b", Initialized)]);
    assert!(!target_reached(&map, Running));
    assert!(!target_reached(&ParticipantStates::new(), Running));
    assert!(target_reached(&states(&[("a", Running)]), Running));
}

fn arb_state() -> impl Strategy<Value = ParticipantState> {
    prop::sample::select(ParticipantState::ALL.to_vec())
}

proptest! {
    // Property 1: aggregation is the minimum and homogeneity means
    // every member equals it.
    #[test]
    fn aggregation_matches_minimum(members in prop::collection::btree_map("[a-z]{1,8}", arb_state(), 1..8)) {
        let min = *members.values().min().unwrap();
        let agg = system_state(&members);
        prop_assert_eq!(agg.state, min);
        prop_assert_eq!(agg.homogeneous, members.values().all(|s| *s == min));
    }

    // Property 2: following next_state from any valid start reaches the
    // target without revisiting a state.
    #[test]
    fn hops_converge_without_revisiting(
        from in prop::sample::select(vec![Unloaded, Loaded, Initialized, Paused, Running]),
        target in prop::sample::select(vec![Unloaded, Loaded, Initialized, Paused, Running]),
    ) {
        let mut visited = vec![from];
        let mut current = from;
        while current != target {
            let next = next_state(current, target);
            prop_assert!(!visited.contains(&next), "revisited {:?}", next);
            visited.push(next);
            current = next;
        }
        prop_assert!(visited.len() <= 5);
    }
}
