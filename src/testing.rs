//! Doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::error::SinkError;
use crate::models::{DowntimeRecord, ProbeResult};
use crate::probe::Reachability;
use crate::sink::DowntimeSink;

/// Hosts answer iff they are in the reachable set; every call is logged.
#[derive(Default)]
pub struct ScriptedProbe {
    reachable: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn set_reachable(&self, hosts: &[&str]) {
        *self.reachable.lock().unwrap() = hosts.iter().map(|h| h.to_string()).collect();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Reachability for ScriptedProbe {
    async fn probe(&self, host: &str) -> ProbeResult {
        self.calls.lock().unwrap().push(host.to_string());
        if self.reachable.lock().unwrap().contains(host) {
            ProbeResult::reachable(host, Some(1.0), "ok")
        } else {
            ProbeResult::unreachable(host, "timeout")
        }
    }
}

#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<DowntimeRecord>>,
    fail: bool,
}

impl MemorySink {
    /// Every append fails as if the disk were full.
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn records(&self) -> Vec<DowntimeRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl DowntimeSink for MemorySink {
    fn append(&self, record: &DowntimeRecord) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Write {
                path: "/full/disk.csv".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Collects the level and message of every event while installed.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        self.0.lock().unwrap().push((*event.metadata().level(), message));
    }
}
