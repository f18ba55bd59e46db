// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event monitor interface for receiving multiplexed logs.

use crate::severity::Severity;

/// Receiver for log events from remote participants and from the
/// system controller itself.
///
/// Implementations are invoked under the owning forwarder's lock and
/// possibly from service-bus threads: they must not block for long and
/// must not call back into the owning `System`.
pub trait EventMonitor: Send + Sync {
    fn on_log(
        &self,
        timestamp_ms: u64,
        severity: Severity,
        participant_name: &str,
        logger_name: &str,
        message: &str,
    );
}
