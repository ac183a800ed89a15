//! # Passive Collectors
//!
//! Harvests addresses this machine already knows about without sending a
//! single probe: the default route, the neighbor (ARP) cache and the peers
//! of established TCP connections. Everything is read through the
//! [`SystemTables`] seam so the orchestration paths can run against fakes.
//!
//! Parsers are pure functions over captured tool output and drop anything
//! they cannot account for; a malformed line never fails a collection.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use hopmap_common::error::DiscoveryError;
use hopmap_common::network::addr;
use hopmap_common::network::interface::resolve_local_topology;
use hopmap_common::network::topology::NetworkTopology;
use hopmap_common::report::{ProgressEvent, Reporter};

use crate::registry::{HostRegistry, Source};

/// Seam over the local kernel's view of the network.
#[async_trait]
pub trait SystemTables: Send + Sync {
    /// The local interface topology. The one call here whose failure is
    /// fatal to a full discovery run.
    fn local_topology(&self) -> Result<NetworkTopology, DiscoveryError>;

    /// The IPv4 default gateway, if one is configured.
    async fn default_gateway(&self) -> Option<Ipv4Addr>;

    /// Resolved entries of the neighbor cache.
    async fn arp_cache(&self) -> Vec<Ipv4Addr>;

    /// Remote peers of established TCP connections, loopback excluded.
    async fn established_peers(&self) -> Vec<Ipv4Addr>;
}

/// Reads the real kernel tables through `ip` and `ss`.
pub struct KernelTables {
    timeout: Duration,
}

impl KernelTables {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn capture(&self, program: &str, args: &[&str]) -> Option<String> {
        let child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                trace!(program, status = ?output.status, "table read failed");
                None
            }
            Ok(Err(err)) => {
                trace!(program, %err, "could not invoke table reader");
                None
            }
            Err(_) => {
                trace!(program, "table read exceeded deadline");
                None
            }
        }
    }
}

#[async_trait]
impl SystemTables for KernelTables {
    fn local_topology(&self) -> Result<NetworkTopology, DiscoveryError> {
        resolve_local_topology()
    }

    async fn default_gateway(&self) -> Option<Ipv4Addr> {
        let output = self.capture("ip", &["route", "show", "default"]).await?;
        parse_default_route(&output)
    }

    async fn arp_cache(&self) -> Vec<Ipv4Addr> {
        match self.capture("ip", &["neigh", "show"]).await {
            Some(output) => parse_neighbor_table(&output),
            None => Vec::new(),
        }
    }

    async fn established_peers(&self) -> Vec<Ipv4Addr> {
        match self.capture("ss", &["-tn", "state", "established"]).await {
            Some(output) => parse_connection_table(&output),
            None => Vec::new(),
        }
    }
}

/// Extracts the gateway address from `ip route show default` output.
///
/// Only the first default route counts; multi-homed hosts keep their
/// secondary gateways out of the seed position.
pub(crate) fn parse_default_route(output: &str) -> Option<Ipv4Addr> {
    let line = output.lines().find(|l| l.trim_start().starts_with("default"))?;
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "via" {
            return tokens.next().and_then(|t| addr::parse_dotted_quad(t).ok());
        }
    }
    None
}

/// Extracts resolved neighbor addresses from `ip neigh show` output.
///
/// Entries in FAILED or INCOMPLETE state never carried a confirmed
/// hardware address and are skipped. Lines in the older `arp -a` shape,
/// with the address parenthesized, are accepted too.
pub(crate) fn parse_neighbor_table(output: &str) -> Vec<Ipv4Addr> {
    let mut addrs = Vec::new();
    for line in output.lines() {
        if line.contains("FAILED") || line.contains("INCOMPLETE") || line.contains("incomplete") {
            continue;
        }
        let candidate = line
            .split_whitespace()
            .map(|t| t.trim_matches(|c| c == '(' || c == ')'))
            .find_map(|t| addr::parse_dotted_quad(t).ok());
        if let Some(a) = candidate {
            addrs.push(a);
        }
    }
    addrs
}

/// Extracts remote peers from `ss -tn state established` output.
///
/// The peer is the last `addr:port` column of each row. Dual-stack sockets
/// report IPv4 peers in v6-mapped notation, which is normalized; loopback
/// peers and duplicates are dropped.
pub(crate) fn parse_connection_table(output: &str) -> Vec<Ipv4Addr> {
    let mut seen = std::collections::HashSet::new();
    let mut addrs = Vec::new();
    for line in output.lines() {
        let Some(peer_col) = line
            .split_whitespace()
            .rev()
            .find(|t| t.contains(':'))
        else {
            continue;
        };
        let Some((host, _port)) = peer_col.rsplit_once(':') else {
            continue;
        };
        let host = addr::strip_v6_mapped(host.trim_matches(|c| c == '[' || c == ']'));
        let Ok(peer) = addr::parse_dotted_quad(host) else {
            continue;
        };
        if peer.is_loopback() {
            continue;
        }
        if seen.insert(peer) {
            addrs.push(peer);
        }
    }
    addrs
}

/// Drives the passive sources into the registry.
pub struct PassiveCollector {
    tables: Arc<dyn SystemTables>,
    registry: Arc<HostRegistry>,
    reporter: Reporter,
}

impl PassiveCollector {
    pub fn new(
        tables: Arc<dyn SystemTables>,
        registry: Arc<HostRegistry>,
        reporter: Reporter,
    ) -> Self {
        Self {
            tables,
            registry,
            reporter,
        }
    }

    /// Collects neighbor and connection addresses; returns how many were new.
    pub async fn collect(&self) -> usize {
        let mut added = 0;
        for neighbor in self.tables.arp_cache().await {
            added += usize::from(self.record(neighbor, Source::LocalArp));
        }
        for peer in self.tables.established_peers().await {
            added += usize::from(self.record(peer, Source::ActiveConnection));
        }
        debug!(added, "passive collection complete");
        added
    }

    fn record(&self, addr: Ipv4Addr, source: Source) -> bool {
        let new = self.registry.try_add(addr, None, source);
        if new {
            self.reporter.emit(ProgressEvent::HostFound {
                addr,
                via: source.label(),
            });
        }
        new
    }
}
