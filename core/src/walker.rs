//! # Router Graph Walker
//!
//! Breadth-first traversal over the router graph. The frontier starts at the
//! default gateway; every answering router contributes its interface
//! addresses and ARP cache to the registry and its filtered next-hops as new
//! frontier entries. Credential candidates are tried in parallel per router,
//! with the earliest candidate in the list winning when several answer.
//!
//! The walk is bounded by a visit cap and tolerates cycles: a router is
//! queried at most once per run regardless of how many peers point at it.

use std::collections::{HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use hopmap_common::config::DiscoveryConfig;
use hopmap_common::report::{ProgressEvent, Reporter};

use crate::registry::{HostRegistry, Source};
use crate::router::{filter_next_hops, RouterClient};

/// What one walk accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Routers the walk attempted to query.
    pub routers_visited: usize,
    /// Routers where some credential produced data.
    pub routers_answered: usize,
}

impl WalkSummary {
    /// True when at least one router gave up its tables.
    pub fn any_answered(&self) -> bool {
        self.routers_answered > 0
    }
}

/// Tables read from one answering router.
struct RouterTables {
    community: String,
    interfaces: Vec<Ipv4Addr>,
    next_hops: Vec<Ipv4Addr>,
    arp: Vec<Ipv4Addr>,
}

pub struct RouterWalker {
    client: Arc<dyn RouterClient>,
    registry: Arc<HostRegistry>,
    reporter: Reporter,
    communities: Vec<String>,
    visit_cap: usize,
}

impl RouterWalker {
    pub fn new(
        config: &DiscoveryConfig,
        client: Arc<dyn RouterClient>,
        registry: Arc<HostRegistry>,
        reporter: Reporter,
    ) -> Self {
        Self {
            client,
            registry,
            reporter,
            communities: config.communities.clone(),
            visit_cap: config.router_visit_cap,
        }
    }

    /// Restricts the walk to a single known credential.
    pub fn with_community(mut self, community: String) -> Self {
        self.communities = vec![community];
        self
    }

    /// Walks the router graph starting from `seed`.
    ///
    /// Unresponsive routers and rejected table entries shrink the result,
    /// never fail the walk.
    pub async fn walk(&self, seed: Ipv4Addr) -> WalkSummary {
        let mut summary = WalkSummary::default();
        let mut enqueued: HashSet<Ipv4Addr> = HashSet::new();
        let mut frontier: VecDeque<Ipv4Addr> = VecDeque::new();

        enqueued.insert(seed);
        frontier.push_back(seed);

        while let Some(router) = frontier.pop_front() {
            if summary.routers_visited >= self.visit_cap {
                warn!(cap = self.visit_cap, "router visit cap reached, stopping walk");
                break;
            }
            summary.routers_visited += 1;
            self.reporter.emit(ProgressEvent::RouterVisit {
                router,
                visited: summary.routers_visited,
            });

            let Some(tables) = self.query_router(router).await else {
                self.reporter
                    .emit(ProgressEvent::RouterUnresponsive { router });
                debug!(%router, "no credential produced data");
                continue;
            };
            summary.routers_answered += 1;
            info!(%router, community = %tables.community, "router answered");

            for addr in tables.interfaces {
                self.record(addr, Source::RouterInterface);
            }
            for addr in tables.arp {
                self.record(addr, Source::RouterArp);
            }
            for hop in filter_next_hops(tables.next_hops, router) {
                self.record(hop, Source::RouterNextHop);
                // A next-hop is a candidate router; enqueue once, bounded by
                // what the visit cap can still absorb.
                if enqueued.len() < self.visit_cap && enqueued.insert(hop) {
                    frontier.push_back(hop);
                }
            }
        }

        summary
    }

    /// Tries every credential candidate against one router.
    ///
    /// All candidates go out concurrently; the earliest one in the list that
    /// yields a non-empty interface table wins and the remaining table walks
    /// run under it.
    async fn query_router(&self, router: Ipv4Addr) -> Option<RouterTables> {
        let mut attempts = JoinSet::new();
        for (rank, community) in self.communities.iter().cloned().enumerate() {
            let client = Arc::clone(&self.client);
            attempts.spawn(async move {
                let interfaces = client
                    .interface_addresses(router, &community)
                    .await
                    .unwrap_or_default();
                (rank, community, interfaces)
            });
        }

        let mut best: Option<(usize, String, Vec<Ipv4Addr>)> = None;
        while let Some(joined) = attempts.join_next().await {
            let Ok((rank, community, interfaces)) = joined else {
                continue;
            };
            if interfaces.is_empty() {
                continue;
            }
            let better = best.as_ref().map_or(true, |(b, _, _)| rank < *b);
            if better {
                best = Some((rank, community, interfaces));
            }
        }

        let (_, community, interfaces) = best?;
        self.reporter.emit(ProgressEvent::CredentialAccepted {
            router,
            community: community.clone(),
        });

        let next_hops = self
            .client
            .next_hops(router, &community)
            .await
            .unwrap_or_default();
        let arp = self
            .client
            .arp_entries(router, &community)
            .await
            .unwrap_or_default();

        Some(RouterTables {
            community,
            interfaces,
            next_hops,
            arp,
        })
    }

    fn record(&self, addr: Ipv4Addr, source: Source) {
        if self.registry.try_add(addr, None, source) {
            self.reporter.emit(ProgressEvent::HostFound {
                addr,
                via: source.label(),
            });
        }
    }
}
