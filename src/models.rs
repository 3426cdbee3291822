use chrono::{DateTime, Local, SubsecRound, TimeDelta};
use std::fmt;

use crate::utils::{format_elapsed, format_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Up,
    /// Every host failed at `bad_since` and none has answered since.
    Down { bad_since: DateTime<Local> },
}

impl NetworkState {
    pub fn bad_since(&self) -> Option<DateTime<Local>> {
        match self {
            NetworkState::Up => None,
            NetworkState::Down { bad_since } => Some(*bad_since),
        }
    }
}

/// One closed downtime interval, written as a CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DowntimeRecord {
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

impl DowntimeRecord {
    /// Both ends are truncated to microseconds, the precision of the log.
    /// A wall clock that stepped backwards yields an empty interval.
    pub fn new(started_at: DateTime<Local>, ended_at: DateTime<Local>) -> Self {
        let started_at = started_at.trunc_subsecs(6);
        let ended_at = ended_at.trunc_subsecs(6).max(started_at);
        Self { started_at, ended_at }
    }

    pub fn duration(&self) -> TimeDelta {
        self.ended_at - self.started_at
    }
}

impl fmt::Display for DowntimeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downtime,{},{},{}",
            format_elapsed(self.duration()),
            format_timestamp(&self.started_at),
            format_timestamp(&self.ended_at),
        )
    }
}

/// Evidence from a single probe of a single host.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub host: String,
    pub reachable: bool,
    pub latency_ms: Option<f64>,
    pub message: String,
}

impl ProbeResult {
    pub fn reachable(host: &str, latency_ms: Option<f64>, message: impl Into<String>) -> Self {
        Self { host: host.to_string(), reachable: true, latency_ms, message: message.into() }
    }

    pub fn unreachable(host: &str, message: impl Into<String>) -> Self {
        Self { host: host.to_string(), reachable: false, latency_ms: None, message: message.into() }
    }
}
