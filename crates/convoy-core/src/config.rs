// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution policy configuration for fleet transitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the members of one transition cohort are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicyKind {
    Sequential,
    #[default]
    Parallel,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Thread count with value 0 is not valid")]
    ZeroThreadCount,
}

/// Execution policy plus the worker-pool width used by the parallel
/// policy. Defaults to parallel with four workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub policy: ExecutionPolicyKind,
    pub thread_count: u8,
}

impl ExecutionConfig {
    pub fn new(policy: ExecutionPolicyKind, thread_count: u8) -> Result<Self, ConfigError> {
        if thread_count == 0 {
            return Err(ConfigError::ZeroThreadCount);
        }
        Ok(Self {
            policy,
            thread_count,
        })
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            policy: ExecutionPolicyKind::Parallel,
            thread_count: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_parallel_with_four_workers() {
        let config = ExecutionConfig::default();
        assert_eq!(config.policy, ExecutionPolicyKind::Parallel);
        assert_eq!(config.thread_count, 4);
    }

    #[test]
    fn zero_thread_count_is_rejected() {
        assert_eq!(
            ExecutionConfig::new(ExecutionPolicyKind::Sequential, 0),
            Err(ConfigError::ZeroThreadCount)
        );
    }

    #[test]
    fn valid_config_passes() {
        let config = ExecutionConfig::new(ExecutionPolicyKind::Sequential, 1).unwrap();
        assert_eq!(config.thread_count, 1);
    }
}
