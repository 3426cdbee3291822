use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{MonitorConfig, ProbeMethod};
use crate::engine::Monitor;
use crate::error::ConfigError;
use crate::probe::{Reachability, SystemProbe};
use crate::sink::{CsvLog, DowntimeSink};

#[derive(Debug, Parser)]
#[command(name = "fiberless", version, about = "Monitors your network connection and logs downtime to a CSV file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Monitors the network and writes downtime to a CSV log file.
    Forever(MonitorArgs),
    /// Probes every host once and reports which ones answer.
    Check(MonitorArgs),
}

#[derive(Debug, Args, Default)]
pub struct MonitorArgs {
    /// JSON config file; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Time to sleep between checks
    #[arg(long, value_name = "SECONDS")]
    pub sleep: Option<u64>,
    /// Host to ping (repeat for more; replaces the configured list)
    #[arg(long = "host", value_name = "HOST")]
    pub hosts: Vec<String>,
    /// Path to downtime CSV log file
    #[arg(long, value_name = "FILE")]
    pub log_path: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub probe: Option<ProbeMethod>,
    /// Upper bound on a single probe
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl MonitorArgs {
    /// Defaults, then the config file, then flags. Validated last.
    pub fn resolve(&self) -> Result<MonitorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::from_file(path)?,
            None => MonitorConfig::default(),
        };

        if let Some(sleep) = self.sleep {
            config.check_interval = sleep;
        }
        if !self.hosts.is_empty() {
            config.hosts = self.hosts.clone();
        }
        if let Some(path) = &self.log_path {
            config.log_path = path.clone();
        }
        if let Some(method) = self.probe {
            config.probe.method = method;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.probe.timeout_ms = timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Forever(args) => forever(args).await,
        Command::Check(args) => check(args).await,
    }
}

async fn forever(args: MonitorArgs) -> Result<()> {
    let config = args.resolve().context("Invalid configuration")?;
    info!("Configuration: {}", config);

    let probe = SystemProbe::from_settings(&config.probe)?;
    let sink = CsvLog::new(config.log_path.clone());
    info!("Downtime is appended to {}", sink.path().display());
    let mut monitor = Monitor::new(config, probe, sink);

    run_until(&mut monitor, shutdown_signal()).await
}

/// Monitors until `shutdown` resolves, then closes any open interval.
async fn run_until<P, S, F>(monitor: &mut Monitor<P, S>, shutdown: F) -> Result<()>
where
    P: Reachability,
    S: DowntimeSink,
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        _ = monitor.run_forever() => {}
        signal = shutdown => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received. Closing fiberless...");
        }
    }

    monitor.shutdown();
    Ok(())
}

async fn check(args: MonitorArgs) -> Result<()> {
    let config = args.resolve().context("Invalid configuration")?;
    let probe = SystemProbe::from_settings(&config.probe)?;
    check_hosts(&probe, &config.hosts).await.map(|_| ())
}

/// Probes every host, without stopping at the first answer. Returns how
/// many answered; none answering is an error.
async fn check_hosts<P: Reachability>(probe: &P, hosts: &[String]) -> Result<usize> {
    let mut reachable = 0;
    for host in hosts {
        let result = probe.probe(host).await;
        let latency = result.latency_ms.map_or("N/A".to_string(), |l| format!("{:.1}ms", l));
        if result.reachable {
            reachable += 1;
            info!("{:<24} UP    {:>9}  {}", host, latency, result.message);
        } else {
            warn!("{:<24} DOWN  {:>9}  {}", host, latency, result.message);
        }
    }

    if reachable == 0 {
        bail!("none of the {} configured hosts answered", hosts.len());
    }
    info!("{}/{} hosts reachable, network is up", reachable, hosts.len());
    Ok(reachable)
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
        _ = hangup.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
