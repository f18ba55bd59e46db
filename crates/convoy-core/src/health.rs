// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health and liveliness types reported by participants.

use std::time::{Duration, Instant};
use thiserror::Error;

/// What drives a job: a fixed cycle or a set of trigger signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTrigger {
    Clock { cycle_time: Duration },
    Data { trigger_signals: Vec<String> },
}

/// Detail of the last error a job execution step produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecuteResult {
    pub error_code: i32,
    pub description: String,
    pub line: i32,
    pub file: String,
    pub function: String,
}

/// Error counter for one execution step (data-in, execute, data-out).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecuteError {
    pub error_count: u64,
    /// Simulation time of the last error.
    pub simulation_time: Duration,
    pub last_error: ExecuteResult,
}

/// Healthiness of one job running inside a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHealthiness {
    pub job_name: String,
    pub trigger: JobTrigger,
    /// Last simulation time this record was updated.
    pub simulation_time: Duration,
    pub data_in_error: ExecuteError,
    pub execute_error: ExecuteError,
    pub data_out_error: ExecuteError,
}

pub type JobsHealthiness = Vec<JobHealthiness>;

/// Whether a participant produced an alive notification recently
/// enough to be considered present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningState {
    Offline,
    Online,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("RunningState must be either offline or online, {0} was given for conversion")]
pub struct RunningStateParseError(pub String);

impl RunningState {
    pub fn name(self) -> &'static str {
        match self {
            RunningState::Offline => "offline",
            RunningState::Online => "online",
        }
    }

    pub fn from_name(name: &str) -> Result<RunningState, RunningStateParseError> {
        match name {
            "offline" => Ok(RunningState::Offline),
            "online" => Ok(RunningState::Online),
            other => Err(RunningStateParseError(other.to_string())),
        }
    }
}

impl std::fmt::Display for RunningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Most recent health snapshot of one participant, stamped with the
/// local monotonic time it arrived. `system_time` is `None` until the
/// first update has been received.
#[derive(Debug, Clone, Default)]
pub struct ParticipantHealthUpdate {
    pub system_time: Option<Instant>,
    pub jobs_healthiness: JobsHealthiness,
}

/// Health of one participant as reported to callers: liveliness
/// classification plus the last known jobs healthiness.
#[derive(Debug, Clone)]
pub struct ParticipantHealth {
    pub running_state: RunningState,
    pub jobs_healthiness: JobsHealthiness,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_state_string_round_trip() {
        assert_eq!(RunningState::from_name("online"), Ok(RunningState::Online));
        assert_eq!(
            RunningState::from_name("offline"),
            Ok(RunningState::Offline)
        );
        assert_eq!(RunningState::Online.name(), "online");
    }

    #[test]
    fn running_state_rejects_unknown() {
        let err = RunningState::from_name("hibernating").unwrap_err();
        assert!(err.to_string().contains("hibernating"));
    }
}
