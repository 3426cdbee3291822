use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Seconds to sleep between ticks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    /// Tried in order; the first reachable host ends the tick.
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default)]
    pub probe: ProbeSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProbeSettings {
    #[serde(default)]
    pub method: ProbeMethod,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    /// Raw ICMP echo through surge-ping. Needs ping socket privileges.
    Icmp,
    /// Runs the system `ping` binary once per host.
    #[default]
    Command,
}

pub fn default_check_interval() -> u64 { 15 }
pub fn default_timeout() -> u64 { 3500 }
pub fn default_log_path() -> PathBuf { PathBuf::from("downtime.utf8.csv") }

pub fn default_hosts() -> Vec<String> {
    ["vivatudo.com.br", "www.microsoft.com", "uol.com.br"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self { method: ProbeMethod::default(), timeout_ms: default_timeout() }
    }
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            hosts: default_hosts(),
            log_path: default_log_path(),
            probe: ProbeSettings::default(),
        }
    }
}

impl MonitorConfig {
    /// Reads a JSON config file. Missing fields fall back to the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        if let Some(idx) = self.hosts.iter().position(|h| h.trim().is_empty()) {
            return Err(ConfigError::BlankHost(idx));
        }
        if self.check_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.probe.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

impl fmt::Display for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "every {}s, hosts [{}], log {}, probe {:?} ({}ms timeout)",
            self.check_interval,
            self.hosts.join(", "),
            self.log_path.display(),
            self.probe.method,
            self.probe.timeout_ms,
        )
    }
}
