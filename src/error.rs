use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Rejected before the monitor loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("at least one host must be configured")]
    NoHosts,
    #[error("host entry #{0} is blank")]
    BlankHost(usize),
    #[error("check interval must be at least one second")]
    ZeroInterval,
    #[error("probe timeout must be at least one millisecond")]
    ZeroTimeout,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to append downtime record to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
