// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log severity levels shared by monitors and remote log filters.

use serde::{Deserialize, Serialize};

/// Severity of a log message, or the filter level of a sink.
///
/// As a filter, a sink at level `L` accepts messages with severity
/// `<= L`; `Off` accepts nothing. The numeric values travel on the
/// wire, so they are fixed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off = 0,
    Fatal = 1,
    Error = 2,
    Warning = 3,
    #[default]
    Info = 4,
    Debug = 5,
}

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Off => "off",
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }

    /// Wire value -> severity. Out-of-range values clamp to `Debug`,
    /// so an unknown remote level never silences a message.
    pub fn from_wire(value: i64) -> Severity {
        match value {
            0 => Severity::Off,
            1 => Severity::Fatal,
            2 => Severity::Error,
            3 => Severity::Warning,
            4 => Severity::Info,
            _ => Severity::Debug,
        }
    }

    /// True when a sink filtered at `self` should deliver a message of
    /// severity `message`.
    pub fn accepts(self, message: Severity) -> bool {
        self != Severity::Off && message != Severity::Off && message <= self
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_at_or_below_level() {
        assert!(Severity::Info.accepts(Severity::Warning));
        assert!(Severity::Info.accepts(Severity::Info));
        assert!(!Severity::Warning.accepts(Severity::Info));
        assert!(!Severity::Off.accepts(Severity::Fatal));
    }

    #[test]
    fn wire_round_trip() {
        for sev in [
            Severity::Off,
            Severity::Fatal,
            Severity::Error,
            Severity::Warning,
            Severity::Info,
            Severity::Debug,
        ] {
            assert_eq!(Severity::from_wire(sev as i64), sev);
        }
        assert_eq!(Severity::from_wire(42), Severity::Debug);
    }
}
