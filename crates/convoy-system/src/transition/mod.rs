// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cohort engine for fleet state transitions.
//!
//! One hop moves the cohort of participants sitting in the same state.
//! Within a hop the cohort is ordered by priority; all members sharing
//! the leading priority run together under the execution policy, then
//! the next priority group follows. Any group failure aborts the hop
//! with an aggregated error.

mod policy;

pub use policy::{run_parallel, run_serial, TransitionJob};

use crate::error::SystemError;
use crate::logging::SystemLogger;
use crate::system_log;
use crate::timer::ExecutionTimer;
use convoy_core::{
    ExecutionConfig, ExecutionPolicyKind, ParticipantState, ParticipantStates, Severity,
};
use std::sync::Arc;

/// How a hop orders its cohort before peeling priority groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrioritySorting {
    /// Highest priority value first (initialize, start).
    Decreasing,
    /// Lowest priority value first (deinitialize, stop).
    Increasing,
    /// Submission order (load, unload, pause, shutdown).
    None,
}

/// Run one hop over `(priority, job)` entries.
pub fn run_cohorts(
    mut entries: Vec<(i32, TransitionJob)>,
    sorting: PrioritySorting,
    config: ExecutionConfig,
    timer: &ExecutionTimer,
) -> Result<(), SystemError> {
    match sorting {
        PrioritySorting::Decreasing => entries.sort_by_key(|(priority, _)| std::cmp::Reverse(*priority)),
        PrioritySorting::Increasing => entries.sort_by_key(|(priority, _)| *priority),
        PrioritySorting::None => {}
    }

    while !entries.is_empty() {
        let lead_priority = entries[0].0;
        let (group, rest): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|(priority, _)| *priority == lead_priority);
        entries = rest;

        let jobs: Vec<TransitionJob> = group.into_iter().map(|(_, job)| job).collect();
        let ok = match config.policy {
            ExecutionPolicyKind::Sequential => run_serial(&jobs, timer),
            ExecutionPolicyKind::Parallel => run_parallel(&jobs, config.thread_count, timer),
        };

        let errors: Vec<String> = jobs.iter().filter_map(TransitionJob::error).collect();
        if !errors.is_empty() || !ok {
            let description = if errors.is_empty() {
                "state transition failed".to_string()
            } else {
                errors.join(" ")
            };
            return Err(SystemError::Transition { description });
        }
    }
    Ok(())
}

/// Reject `Undefined` as a transition target.
pub(crate) fn ensure_valid_target(
    logger: &Arc<SystemLogger>,
    system_name: &str,
    target: ParticipantState,
) -> Result<(), SystemError> {
    if target == ParticipantState::Undefined {
        system_log!(
            logger,
            Severity::Error,
            "Invalid value '{}' for target state of system '{}'",
            target,
            system_name
        );
        return Err(SystemError::InvalidTargetState {
            system: system_name.to_string(),
            state: target,
        });
    }
    Ok(())
}

/// No hop can start from an empty fleet or with unreachable members.
/// Driving toward `Unreachable` is the shutdown path and tolerates
/// members that are already gone.
pub(crate) fn ensure_transition_possible(
    logger: &Arc<SystemLogger>,
    system_name: &str,
    states: &ParticipantStates,
    target: ParticipantState,
) -> Result<(), SystemError> {
    if states.is_empty() {
        system_log!(
            logger,
            Severity::Error,
            "No participant in system '{}' is reachable",
            system_name
        );
        return Err(SystemError::NoParticipants {
            system: system_name.to_string(),
        });
    }
    let unreachable = states.values().any(|state| {
        matches!(
            state,
            ParticipantState::Undefined | ParticipantState::Unreachable
        )
    });
    if unreachable && target != ParticipantState::Unreachable {
        system_log!(
            logger,
            Severity::Error,
            "At least one participant in system '{}' is not reachable",
            system_name
        );
        return Err(SystemError::ParticipantsUnreachable {
            system: system_name.to_string(),
        });
    }
    Ok(())
}

/// Logs the transition outcome on every exit path: success on normal
/// completion, a warning when unwinding with an error. Guarantees no
/// silent partial transition.
pub(crate) struct TransitionGuard {
    logger: Arc<SystemLogger>,
    system_name: String,
    target_name: &'static str,
    success: bool,
}

impl TransitionGuard {
    pub fn new(logger: Arc<SystemLogger>, system_name: &str, target: ParticipantState) -> Self {
        Self {
            logger,
            system_name: system_name.to_string(),
            target_name: target.name(),
            success: false,
        }
    }

    pub fn mark_success(&mut self) {
        self.success = true;
    }
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        if self.success {
            system_log!(
                self.logger,
                Severity::Info,
                "System '{}' transition to state '{}' completed successfully",
                self.system_name,
                self.target_name
            );
        } else {
            system_log!(
                self.logger,
                Severity::Warning,
                "Cannot set homogeneous state '{}' of the system '{}'",
                self.target_name,
                self.system_name
            );
        }
    }
}

#[cfg(test)]
#[path = "cohort_tests.rs"]
mod tests;
