use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::models::{DowntimeRecord, NetworkState, ProbeResult};
use crate::probe::Reachability;
use crate::sink::DowntimeSink;
use crate::utils::format_timestamp;

/// Tracks network downtime across ticks and records each closed interval.
///
/// Dropping the monitor performs [`Monitor::shutdown`], so an interval that
/// is still open is written on every exit path, unwinding included.
pub struct Monitor<P: Reachability, S: DowntimeSink> {
    config: MonitorConfig,
    probe: P,
    sink: S,
    state: NetworkState,
    closed: bool,
}

impl<P: Reachability, S: DowntimeSink> Monitor<P, S> {
    pub fn new(config: MonitorConfig, probe: P, sink: S) -> Self {
        Self { config, probe, sink, state: NetworkState::Up, closed: false }
    }

    #[cfg(test)]
    pub fn state(&self) -> NetworkState {
        self.state
    }

    #[cfg(test)]
    pub fn probe(&self) -> &P {
        &self.probe
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Ticks then sleeps for the configured interval, forever. Dropping the
    /// future is the only way out.
    pub async fn run_forever(&mut self) {
        info!("Monitoring {} host(s) every {}s", self.config.hosts.len(), self.config.check_interval);
        loop {
            self.tick(Local::now()).await;
            tokio::time::sleep(self.config.interval()).await;
        }
    }

    pub async fn tick(&mut self, now: DateTime<Local>) {
        let now_ok = self.network_is_ok_now().await;

        match (self.state, now_ok) {
            (NetworkState::Up, false) => {
                error!("[CHANGE] network -> Down");
                self.state = NetworkState::Down { bad_since: now };
            }
            (NetworkState::Down { bad_since }, true) => {
                warn!("[CHANGE] network -> Up");
                self.write_downtime(bad_since, now);
                self.state = NetworkState::Up;
            }
            _ => {}
        }

        if let Some(bad_since) = self.state.bad_since() {
            warn!("Connection is bad since {}", format_timestamp(&bad_since));
        }
    }

    /// Writes the open interval, if any, up to now. Later calls do nothing.
    pub fn shutdown(&mut self) {
        self.shutdown_at(Local::now());
    }

    pub fn shutdown_at(&mut self, now: DateTime<Local>) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(bad_since) = self.state.bad_since() {
            info!("Closing open downtime interval started {}", format_timestamp(&bad_since));
            self.write_downtime(bad_since, now);
        }
    }

    /// Probes hosts in order until one answers.
    async fn network_is_ok_now(&self) -> bool {
        for host in &self.config.hosts {
            let result = self.probe.probe(host).await;
            log_probe(&result);
            if result.reachable {
                return true;
            }
        }
        false
    }

    /// A failed write is reported but never stops the monitor.
    fn write_downtime(&self, bad_since: DateTime<Local>, now: DateTime<Local>) {
        let record = DowntimeRecord::new(bad_since, now);
        if let Err(e) = self.sink.append(&record) {
            error!("Lost downtime record [{}]: {}", record, e);
        }
    }
}

impl<P: Reachability, S: DowntimeSink> Drop for Monitor<P, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn log_probe(result: &ProbeResult) {
    match result.latency_ms {
        Some(latency) => debug!(host = %result.host, reachable = result.reachable, "{} [{:.1}ms]", result.message, latency),
        None => debug!(host = %result.host, reachable = result.reachable, "{}", result.message),
    }
}
