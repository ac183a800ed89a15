//! In-memory stand-ins for the engine's external touchpoints.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use async_trait::async_trait;

use hopmap_common::error::DiscoveryError;
use hopmap_common::network::addr;
use hopmap_common::network::topology::NetworkTopology;
use hopmap_core::passive::SystemTables;
use hopmap_core::probe::{ProbeOutcome, Prober};
use hopmap_core::router::RouterClient;
use hopmap_core::trace::PathResolver;

/// Answers echo probes for a fixed set of alive addresses.
pub struct FakePinger {
    alive: HashSet<Ipv4Addr>,
}

impl FakePinger {
    pub fn new(alive: &[Ipv4Addr]) -> Self {
        Self {
            alive: alive.iter().copied().collect(),
        }
    }
}

#[async_trait]
impl Prober for FakePinger {
    async fn probe(&self, address: &str) -> Result<ProbeOutcome, DiscoveryError> {
        let target = addr::parse_dotted_quad(address)?;
        if self.alive.contains(&target) {
            Ok(ProbeOutcome::reachable(2))
        } else {
            Ok(ProbeOutcome::UNREACHABLE)
        }
    }
}

/// One simulated router: the credential it accepts and its three tables.
pub struct FakeRouter {
    pub community: String,
    pub interfaces: Vec<Ipv4Addr>,
    pub next_hops: Vec<Ipv4Addr>,
    pub arp: Vec<Ipv4Addr>,
}

/// Serves table walks for a set of simulated routers.
#[derive(Default)]
pub struct FakeRouterClient {
    routers: HashMap<Ipv4Addr, FakeRouter>,
}

impl FakeRouterClient {
    pub fn with_router(mut self, address: Ipv4Addr, router: FakeRouter) -> Self {
        self.routers.insert(address, router);
        self
    }

    fn authorized(&self, router: Ipv4Addr, community: &str) -> Option<&FakeRouter> {
        self.routers
            .get(&router)
            .filter(|r| r.community == community)
    }
}

#[async_trait]
impl RouterClient for FakeRouterClient {
    async fn interface_addresses(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        addr::validate_community(community)?;
        Ok(self
            .authorized(router, community)
            .map(|r| r.interfaces.clone())
            .unwrap_or_default())
    }

    async fn next_hops(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        Ok(self
            .authorized(router, community)
            .map(|r| r.next_hops.clone())
            .unwrap_or_default())
    }

    async fn arp_entries(
        &self,
        router: Ipv4Addr,
        community: &str,
    ) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        Ok(self
            .authorized(router, community)
            .map(|r| r.arp.clone())
            .unwrap_or_default())
    }
}

/// A frozen snapshot of the local kernel's view.
#[derive(Default)]
pub struct FakeTables {
    pub topology: Option<NetworkTopology>,
    pub gateway: Option<Ipv4Addr>,
    pub arp: Vec<Ipv4Addr>,
    pub peers: Vec<Ipv4Addr>,
}

#[async_trait]
impl SystemTables for FakeTables {
    fn local_topology(&self) -> Result<NetworkTopology, DiscoveryError> {
        self.topology.ok_or_else(|| {
            DiscoveryError::Configuration("no usable interface".to_string())
        })
    }

    async fn default_gateway(&self) -> Option<Ipv4Addr> {
        self.gateway
    }

    async fn arp_cache(&self) -> Vec<Ipv4Addr> {
        self.arp.clone()
    }

    async fn established_peers(&self) -> Vec<Ipv4Addr> {
        self.peers.clone()
    }
}

/// Returns a fixed hop list for any target.
#[derive(Default)]
pub struct FakeTracer {
    pub hops: Vec<Ipv4Addr>,
}

#[async_trait]
impl PathResolver for FakeTracer {
    async fn trace(&self, target: &str) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        addr::parse_dotted_quad(target)?;
        Ok(self.hops.clone())
    }
}
