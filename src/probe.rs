use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::{Duration, Instant};
use surge_ping::{Client as PingClient, Config as PingConfig, PingIdentifier, PingSequence, ICMP};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::{ProbeMethod, ProbeSettings};
use crate::models::ProbeResult;

/// Answers whether a single host replied to a single probe.
///
/// Implementations never fail: resolution errors, timeouts and transport
/// errors are all reported as an unreachable [`ProbeResult`].
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn probe(&self, host: &str) -> ProbeResult;
}

/// The prober selected by [`ProbeSettings::method`].
pub enum SystemProbe {
    Icmp(IcmpProbe),
    Command(CommandProbe),
}

impl SystemProbe {
    pub fn from_settings(settings: &ProbeSettings) -> Result<Self> {
        Ok(match settings.method {
            ProbeMethod::Icmp => SystemProbe::Icmp(IcmpProbe::new(settings.timeout())?),
            ProbeMethod::Command => SystemProbe::Command(CommandProbe::new(settings.timeout())),
        })
    }
}

#[async_trait]
impl Reachability for SystemProbe {
    async fn probe(&self, host: &str) -> ProbeResult {
        match self {
            SystemProbe::Icmp(p) => p.probe(host).await,
            SystemProbe::Command(p) => p.probe(host).await,
        }
    }
}

pub struct IcmpProbe {
    v4_client: PingClient,
    /// Absent on hosts without IPv6 support; IPv6 targets are then unreachable.
    v6_client: Option<PingClient>,
    dns_resolver: TokioResolver,
    timeout: Duration,
}

impl IcmpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let v4_client = PingClient::new(&PingConfig::default())
            .context("Failed to create ICMPv4 client")?;
        let v6_client = match PingClient::new(&PingConfig::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("ICMPv6 unavailable ({}), IPv6 targets will count as unreachable", e);
                None
            }
        };

        let dns_resolver = match TokioResolver::builder_tokio() {
            Ok(builder) => {
                info!("DNS resolver configured from system settings");
                builder.build()
            }
            Err(e) => {
                warn!("System DNS configuration unavailable ({}), using Cloudflare 1.1.1.1 / 1.0.0.1", e);
                TokioResolver::builder_with_config(
                    ResolverConfig::cloudflare(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        };

        Ok(Self { v4_client, v6_client, dns_resolver, timeout })
    }

    async fn resolve(&self, host: &str) -> Result<IpAddr, String> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }
        match self.dns_resolver.lookup_ip(host).await {
            Ok(lookup) => lookup.iter().next().ok_or_else(|| "No IP Address Found".into()),
            Err(e) => Err(format!("DNS Resolution Failed: {}", e)),
        }
    }
}

#[async_trait]
impl Reachability for IcmpProbe {
    async fn probe(&self, host: &str) -> ProbeResult {
        let ip = match self.resolve(host).await {
            Ok(ip) => ip,
            Err(e) => return ProbeResult::unreachable(host, e),
        };

        let Some(client) = client_for(&ip, &self.v4_client, self.v6_client.as_ref()) else {
            return ProbeResult::unreachable(host, format!("No ICMPv6 client for {}", ip));
        };
        let payload = [0u8; 56];
        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        match pinger.ping(PingSequence(0), &payload).await {
            Ok((_, latency)) => ProbeResult::reachable(
                host,
                Some(latency.as_secs_f64() * 1000.0),
                format!("ICMP Response OK from {}", ip),
            ),
            Err(e) => ProbeResult::unreachable(host, format!("No ICMP reply from {}: {}", ip, e)),
        }
    }
}

fn client_for<'a, C>(ip: &IpAddr, v4: &'a C, v6: Option<&'a C>) -> Option<&'a C> {
    match ip {
        IpAddr::V4(_) => Some(v4),
        IpAddr::V6(_) => v6,
    }
}

/// Runs the system `ping` once per host and trusts its exit status.
pub struct CommandProbe {
    program: String,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("ping", timeout)
    }

    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }
}

#[cfg(windows)]
fn ping_args(host: &str) -> [&str; 3] {
    ["-n", "1", host]
}

#[cfg(not(windows))]
fn ping_args(host: &str) -> [&str; 4] {
    ["-q", "-c", "1", host]
}

#[async_trait]
impl Reachability for CommandProbe {
    async fn probe(&self, host: &str) -> ProbeResult {
        // A leading dash would be parsed as a ping option.
        if host.starts_with('-') {
            return ProbeResult::unreachable(host, "Refusing host that looks like an option");
        }

        let start = Instant::now();
        let mut child = match Command::new(&self.program)
            .args(ping_args(host))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return ProbeResult::unreachable(host, format!("Failed to run {}: {}", self.program, e)),
        };

        match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => ProbeResult::reachable(
                host,
                Some(start.elapsed().as_secs_f64() * 1000.0),
                "ping exited successfully",
            ),
            Ok(Ok(status)) => ProbeResult::unreachable(host, format!("ping exited with {}", status)),
            Ok(Err(e)) => ProbeResult::unreachable(host, format!("Failed waiting for ping: {}", e)),
            Err(_) => ProbeResult::unreachable(host, "Request Timeout"),
        }
    }
}
