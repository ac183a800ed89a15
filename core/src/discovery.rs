//! # Discovery Orchestrator
//!
//! Sequences the collectors into complete runs. Every run owns a fresh
//! registry; the orchestration policies decide which collectors feed it and
//! in what order, and they never treat an empty network as an error.
//!
//! The automatic policy: resolve the local topology (failure here degrades
//! the run to passive-only), detect the default gateway, record it, walk the
//! router graph from it, then always run the passive collectors on top of
//! whatever the walk produced.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tracing::{info, warn};

use hopmap_common::config::DiscoveryConfig;
use hopmap_common::error::DiscoveryError;
use hopmap_common::network::topology::NetworkTopology;
use hopmap_common::report::Reporter;

use crate::passive::{KernelTables, PassiveCollector, SystemTables};
use crate::probe::{PingProber, Prober};
use crate::registry::{DiscoveredHost, HostRegistry, Source};
use crate::router::{RouterClient, SnmpWalkClient};
use crate::sweep::SubnetSweep;
use crate::trace::{PathResolver, SystemTraceroute};
use crate::walker::RouterWalker;

/// Well-known external addresses used to pull a hop list out of the ISP
/// path when no router answers management queries.
const TRACE_ANCHORS: [Ipv4Addr; 2] = [Ipv4Addr::new(8, 8, 8, 8), Ipv4Addr::new(1, 1, 1, 1)];

/// How many off-subnet hops the multi-subnet strategy expands into sweeps.
const MULTI_SUBNET_HOP_LIMIT: usize = 5;

/// Result of one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    /// Every discovered host, in discovery order.
    pub hosts: Vec<DiscoveredHost>,
    /// Whether any router gave up its tables during the run. Reporting
    /// detail only; an all-passive run is still a successful run.
    pub snmp_success: bool,
    /// The local topology the run operated under, when one was resolved.
    pub topology: Option<NetworkTopology>,
}

/// The discovery engine, generic over its external touchpoints.
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    tables: Arc<dyn SystemTables>,
    prober: Arc<dyn Prober>,
    router_client: Arc<dyn RouterClient>,
    tracer: Arc<dyn PathResolver>,
    reporter: Reporter,
}

impl DiscoveryEngine {
    pub fn new(
        config: DiscoveryConfig,
        tables: Arc<dyn SystemTables>,
        prober: Arc<dyn Prober>,
        router_client: Arc<dyn RouterClient>,
        tracer: Arc<dyn PathResolver>,
        reporter: Reporter,
    ) -> Self {
        Self {
            config,
            tables,
            prober,
            router_client,
            tracer,
            reporter,
        }
    }

    /// An engine wired to the real system: `ping`, `snmpwalk`, `traceroute`
    /// and the kernel tables.
    pub fn system(config: DiscoveryConfig, reporter: Reporter) -> Self {
        let tables = Arc::new(KernelTables::new(config.query_timeout));
        let prober = Arc::new(PingProber::new(config.probe_timeout));
        let router_client = Arc::new(SnmpWalkClient::new(
            config.query_timeout,
            config.query_result_cap,
        ));
        let tracer = Arc::new(SystemTraceroute::new(
            config.trace_timeout,
            config.trace_hop_cap,
        ));
        Self::new(config, tables, prober, router_client, tracer, reporter)
    }

    /// Zero-configuration discovery.
    ///
    /// Never fails: a machine with no usable interface still gets its
    /// passive tables read, and finding nothing yields an empty report.
    pub async fn automatic(&self) -> DiscoveryReport {
        let registry = Arc::new(HostRegistry::new());

        self.reporter.stage("resolving local topology");
        let topology = match self.tables.local_topology() {
            Ok(topology) => {
                info!(%topology, "local topology resolved");
                Some(topology)
            }
            Err(err) => {
                warn!(%err, "no local topology, degrading to passive collection");
                None
            }
        };

        let mut snmp_success = false;
        if topology.is_some() {
            self.reporter.stage("detecting default gateway");
            if let Some(gateway) = self.tables.default_gateway().await {
                // The gateway is a discovered host in its own right,
                // whether or not it answers management queries.
                registry.try_add(gateway, None, Source::Gateway);
                self.reporter.stage("walking router graph");
                let summary = self.walker(&registry).walk(gateway).await;
                snmp_success = summary.any_answered();
            } else {
                info!("no default gateway detected");
            }
        }

        self.reporter.stage("reading local tables");
        self.passive(&registry).collect().await;

        DiscoveryReport {
            hosts: registry.snapshot(),
            snmp_success,
            topology,
        }
    }

    /// User-directed sweep of one subnet.
    pub async fn scan_cidr(
        &self,
        network: Ipv4Addr,
        prefix_len: u8,
    ) -> Result<DiscoveryReport, DiscoveryError> {
        validate_scan_prefix(prefix_len)?;

        let registry = Arc::new(HostRegistry::new());
        self.reporter.stage(format!("sweeping {network}/{prefix_len}"));
        self.sweeper(&registry).scan(network, prefix_len).await?;

        Ok(DiscoveryReport {
            hosts: registry.snapshot(),
            snmp_success: false,
            topology: None,
        })
    }

    /// Directed harvest of a single router's tables.
    ///
    /// With a known credential only that credential is tried; otherwise the
    /// configured candidate list applies. The graph is not expanded past the
    /// named router.
    pub async fn query_router(
        &self,
        router: Ipv4Addr,
        community: Option<String>,
    ) -> Result<DiscoveryReport, DiscoveryError> {
        if let Some(community) = &community {
            hopmap_common::network::addr::validate_community(community)?;
        }

        let registry = Arc::new(HostRegistry::new());
        let mut single = self.config.clone();
        single.router_visit_cap = 1;

        let mut walker = RouterWalker::new(
            &single,
            Arc::clone(&self.router_client),
            Arc::clone(&registry),
            self.reporter.clone(),
        );
        if let Some(community) = community {
            walker = walker.with_community(community);
        }

        self.reporter.stage(format!("querying router {router}"));
        let summary = walker.walk(router).await;

        Ok(DiscoveryReport {
            hosts: registry.snapshot(),
            snmp_success: summary.any_answered(),
            topology: None,
        })
    }

    /// Directed trace toward one target.
    pub async fn trace(&self, target: &str) -> Result<DiscoveryReport, DiscoveryError> {
        let registry = Arc::new(HostRegistry::new());
        self.reporter.stage(format!("tracing path to {target}"));

        for hop in self.tracer.trace(target).await? {
            registry.try_add(hop, None, Source::Traceroute);
        }

        Ok(DiscoveryReport {
            hosts: registry.snapshot(),
            snmp_success: false,
            topology: None,
        })
    }

    /// Multi-subnet strategy: sweep the local subnet, then use the hop list
    /// toward an external anchor to find adjacent subnets and sweep the /24
    /// around each off-subnet private hop.
    ///
    /// Requires a local topology; the other directed modes can run without
    /// one, this one cannot.
    pub async fn multi_subnet(&self) -> Result<DiscoveryReport, DiscoveryError> {
        let topology = self.tables.local_topology()?;
        let registry = Arc::new(HostRegistry::new());

        self.reporter
            .stage(format!("sweeping local subnet {topology}"));
        let sweeper = self.sweeper(&registry);
        sweeper
            .scan(topology.network_addr, topology.prefix_len)
            .await?;

        self.reporter.stage("tracing toward external anchors");
        let mut hops = Vec::new();
        for anchor in TRACE_ANCHORS {
            hops = self.tracer.trace(&anchor.to_string()).await?;
            if !hops.is_empty() {
                break;
            }
        }

        let mut swept: HashSet<Ipv4Addr> = HashSet::new();
        let off_subnet = hops
            .into_iter()
            .filter(|hop| hop.is_private() && !topology.contains(*hop))
            .take(MULTI_SUBNET_HOP_LIMIT);
        for hop in off_subnet {
            registry.try_add(hop, None, Source::Traceroute);
            let network = Ipv4Addr::from(u32::from(hop) & 0xffff_ff00);
            if !swept.insert(network) {
                continue;
            }
            self.reporter.stage(format!("sweeping adjacent {network}/24"));
            sweeper.scan(network, 24).await?;
        }

        Ok(DiscoveryReport {
            hosts: registry.snapshot(),
            snmp_success: false,
            topology: Some(topology),
        })
    }

    /// Probe-free discovery from the local tables alone.
    pub async fn passive_only(&self) -> DiscoveryReport {
        let registry = Arc::new(HostRegistry::new());

        self.reporter.stage("reading local tables");
        if let Some(gateway) = self.tables.default_gateway().await {
            registry.try_add(gateway, None, Source::Gateway);
        }
        self.passive(&registry).collect().await;

        DiscoveryReport {
            hosts: registry.snapshot(),
            snmp_success: false,
            topology: self.tables.local_topology().ok(),
        }
    }

    fn walker(&self, registry: &Arc<HostRegistry>) -> RouterWalker {
        RouterWalker::new(
            &self.config,
            Arc::clone(&self.router_client),
            Arc::clone(registry),
            self.reporter.clone(),
        )
    }

    fn sweeper(&self, registry: &Arc<HostRegistry>) -> SubnetSweep {
        SubnetSweep::new(
            &self.config,
            Arc::clone(&self.prober),
            Arc::clone(registry),
            self.reporter.clone(),
        )
    }

    fn passive(&self, registry: &Arc<HostRegistry>) -> PassiveCollector {
        PassiveCollector::new(
            Arc::clone(&self.tables),
            Arc::clone(registry),
            self.reporter.clone(),
        )
    }
}

/// Directed sweeps accept prefixes between /16 and /30; anything wider
/// would sweep for hours, anything narrower has no hosts worth a run.
fn validate_scan_prefix(prefix_len: u8) -> Result<(), DiscoveryError> {
    if !(16..=30).contains(&prefix_len) {
        return Err(DiscoveryError::Validation(format!(
            "prefix length /{prefix_len} outside the accepted /16..=/30 range"
        )));
    }
    Ok(())
}
