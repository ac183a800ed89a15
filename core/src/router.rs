//! # Router Query Client
//!
//! Read-only management-plane queries against a single router. Three table
//! walks cover everything the graph walker needs: the router's own interface
//! addresses, the next-hop column of its routing table, and its ARP cache.
//! The `snmpwalk` binary does the wire work; parsing is a pure function over
//! its line output so it can be tested against captured transcripts.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use hopmap_common::error::DiscoveryError;
use hopmap_common::network::addr;

/// ipAdEntAddr: the router's own interface addresses.
pub const OID_INTERFACE_ADDRS: &str = "1.3.6.1.2.1.4.20.1.1";
/// ipRouteNextHop: next-hop column of the routing table.
pub const OID_NEXT_HOPS: &str = "1.3.6.1.2.1.4.21.1.7";
/// ipNetToMediaNetAddress: the router's ARP cache.
pub const OID_ARP_ENTRIES: &str = "1.3.6.1.2.1.4.22.1.3";

/// Extra slack on top of snmpwalk's own timeout before the child is killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Seam for management-plane table walks.
///
/// Implementations return the addresses found, already capped; an
/// unresponsive or wrong-credential router is an empty `Ok`, never an `Err`.
/// `Err` is reserved for rejected input.
#[async_trait]
pub trait RouterClient: Send + Sync {
    async fn interface_addresses(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError>;

    async fn next_hops(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError>;

    async fn arp_entries(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError>;
}

/// Queries via the system `snmpwalk` binary, v2c, no retries.
pub struct SnmpWalkClient {
    timeout: Duration,
    result_cap: usize,
}

impl SnmpWalkClient {
    pub fn new(timeout: Duration, result_cap: usize) -> Self {
        Self {
            timeout,
            result_cap,
        }
    }

    async fn walk(
        &self,
        router: Ipv4Addr,
        community: &str,
        oid: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        // The community came from a credential list or the command line and
        // is about to become an argv entry.
        addr::validate_community(community)?;

        let timeout_secs = self.timeout.as_secs().max(1).to_string();
        let child = Command::new("snmpwalk")
            .args(["-v2c", "-c", community, "-t", &timeout_secs, "-r", "0"])
            .arg(router.to_string())
            .arg(oid)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout + KILL_GRACE, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                trace!(%router, %err, "could not invoke snmpwalk");
                return Ok(Vec::new());
            }
            Err(_) => {
                trace!(%router, oid, "snmpwalk exceeded hard deadline");
                return Ok(Vec::new());
            }
        };

        if !output.status.success() {
            // Wrong community or unreachable agent; the walker treats both
            // as "this credential produced nothing".
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let addrs = parse_ip_address_lines(&stdout, self.result_cap);
        debug!(%router, oid, count = addrs.len(), "table walk complete");
        Ok(addrs)
    }
}

#[async_trait]
impl RouterClient for SnmpWalkClient {
    async fn interface_addresses(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        self.walk(router, community, OID_INTERFACE_ADDRS).await
    }

    async fn next_hops(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        self.walk(router, community, OID_NEXT_HOPS).await
    }

    async fn arp_entries(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        self.walk(router, community, OID_ARP_ENTRIES).await
    }
}

/// Extracts IPv4 addresses from snmpwalk line output, up to `cap` entries.
///
/// Each value line ends in `IpAddress: a.b.c.d`; the last whitespace token
/// is taken and anything that does not survive the dotted-quad gate is
/// dropped rather than failing the whole walk. Tolerates both named
/// (`IP-MIB::ipAdEntAddr...`) and numeric OID prefixes.
pub(crate) fn parse_ip_address_lines(output: &str, cap: usize) -> Vec<Ipv4Addr> {
    output
        .lines()
        .filter(|line| line.contains('='))
        .filter_map(|line| line.split_whitespace().next_back())
        .filter_map(|token| addr::parse_dotted_quad(token).ok())
        .take(cap)
        .collect()
}

/// Keeps only next-hop addresses worth walking to.
///
/// A next-hop edge is followed only into private address space, and never
/// to the unspecified address (directly-connected routes) or back to the
/// router that reported it.
pub(crate) fn filter_next_hops(hops: Vec<Ipv4Addr>, reporting_router: Ipv4Addr) -> Vec<Ipv4Addr> {
    hops.into_iter()
        .filter(|hop| {
            hop.is_private() && !hop.is_unspecified() && *hop != reporting_router
        })
        .collect()
}
