// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the health service.

use crate::error::RpcError;
use crate::result::remote_result;
use convoy_bus::Requester;
use convoy_core::{ExecuteError, ExecuteResult, JobHealthiness, JobTrigger, JobsHealthiness};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Pulls job healthiness from a participant.
pub struct HealthClient {
    requester: Arc<dyn Requester>,
    component: String,
}

impl HealthClient {
    pub fn new(requester: Arc<dyn Requester>, component: impl Into<String>) -> Self {
        Self {
            requester,
            component: component.into(),
        }
    }

    pub fn get_health(&self) -> Result<JobsHealthiness, RpcError> {
        const METHOD: &str = "getHealth";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        parse_jobs_healthiness(METHOD, &reply)
    }

    pub fn reset_health(&self) -> Result<(), RpcError> {
        const METHOD: &str = "resetHealth";
        let reply = self
            .requester
            .call(&self.component, METHOD, json!({}))
            .map_err(|e| RpcError::transport(METHOD, e))?;
        remote_result(&reply).map_err(RpcError::from)
    }
}

fn ns(value: Option<&Value>) -> Duration {
    Duration::from_nanos(value.and_then(Value::as_u64).unwrap_or(0))
}

fn string(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_execute_error(value: Option<&Value>) -> ExecuteError {
    let Some(value) = value else {
        return ExecuteError::default();
    };
    let last = value.get("last_error");
    ExecuteError {
        error_count: value
            .get("error_count")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        simulation_time: ns(value.get("simulation_timestamp")),
        last_error: ExecuteResult {
            error_code: last
                .and_then(|l| l.get("error_code"))
                .and_then(Value::as_i64)
                .unwrap_or(0) as i32,
            description: string(last.and_then(|l| l.get("description"))),
            line: last
                .and_then(|l| l.get("line"))
                .and_then(Value::as_i64)
                .unwrap_or(0) as i32,
            file: string(last.and_then(|l| l.get("file"))),
            function: string(last.and_then(|l| l.get("function"))),
        },
    }
}

fn parse_jobs_healthiness(method: &str, reply: &Value) -> Result<JobsHealthiness, RpcError> {
    let jobs = reply
        .get("jobs_healthiness")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::malformed(method, "missing jobs_healthiness array"))?;

    let mut healthiness = Vec::with_capacity(jobs.len());
    for job in jobs {
        let job_name = string(job.get("job_name"));
        // a clock triggered job carries cycle_time, a data triggered
        // one carries its trigger signals
        let trigger = if let Some(cycle) = job.get("cycle_time") {
            JobTrigger::Clock {
                cycle_time: ns(Some(cycle)),
            }
        } else {
            let signals = job
                .get("trigger_signals")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            JobTrigger::Data {
                trigger_signals: signals,
            }
        };
        healthiness.push(JobHealthiness {
            job_name,
            trigger,
            simulation_time: ns(job.get("simulation_timestamp")),
            data_in_error: parse_execute_error(job.get("last_execute_data_in_error")),
            execute_error: parse_execute_error(job.get("last_execute_error")),
            data_out_error: parse_execute_error(job.get("last_execute_data_out_error")),
        });
    }
    Ok(healthiness)
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
