use std::net::Ipv4Addr;
use std::sync::Arc;

use hopmap_common::config::DiscoveryConfig;
use hopmap_common::error::DiscoveryError;
use hopmap_common::network::topology::NetworkTopology;
use hopmap_common::report::Reporter;
use hopmap_core::{DiscoveryEngine, Source};

use crate::fakes::{FakePinger, FakeRouter, FakeRouterClient, FakeTables, FakeTracer};

fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}

fn home_topology() -> NetworkTopology {
    NetworkTopology::from_addr_mask(ip(192, 168, 1, 42), ip(255, 255, 255, 0))
}

fn engine(
    tables: FakeTables,
    alive: &[Ipv4Addr],
    routers: FakeRouterClient,
    hops: Vec<Ipv4Addr>,
) -> DiscoveryEngine {
    DiscoveryEngine::new(
        DiscoveryConfig::default(),
        Arc::new(tables),
        Arc::new(FakePinger::new(alive)),
        Arc::new(routers),
        Arc::new(FakeTracer { hops }),
        Reporter::disabled(),
    )
}

/// A gateway router answering under the second candidate credential with
/// two interfaces and one next-hop, plus one extra local ARP entry, yields
/// exactly four distinct addresses.
#[tokio::test]
async fn automatic_discovery_merges_router_and_passive_sources() {
    let gateway = ip(192, 168, 1, 1);
    let tables = FakeTables {
        topology: Some(home_topology()),
        gateway: Some(gateway),
        arp: vec![ip(192, 168, 1, 20)],
        peers: vec![],
    };
    let routers = FakeRouterClient::default().with_router(
        gateway,
        FakeRouter {
            community: "public".to_string(),
            interfaces: vec![gateway, ip(10, 0, 0, 1)],
            next_hops: vec![ip(10, 0, 0, 254)],
            arp: vec![],
        },
    );

    let report = engine(tables, &[], routers, vec![]).automatic().await;

    assert!(report.snmp_success);
    assert_eq!(report.topology, Some(home_topology()));

    let addrs: Vec<Ipv4Addr> = report.hosts.iter().map(|h| h.addr).collect();
    assert_eq!(addrs.len(), 4, "got {addrs:?}");
    assert!(addrs.contains(&gateway));
    assert!(addrs.contains(&ip(10, 0, 0, 1)));
    assert!(addrs.contains(&ip(10, 0, 0, 254)));
    assert!(addrs.contains(&ip(192, 168, 1, 20)));

    // The gateway was recorded before the walk, so it keeps the Gateway
    // attribution over the router's own interface listing.
    let gw_host = report.hosts.iter().find(|h| h.addr == gateway).unwrap();
    assert_eq!(gw_host.source, Source::Gateway);
    let arp_host = report
        .hosts
        .iter()
        .find(|h| h.addr == ip(192, 168, 1, 20))
        .unwrap();
    assert_eq!(arp_host.source, Source::LocalArp);
}

#[tokio::test]
async fn automatic_discovery_on_empty_machine_reports_zero_not_error() {
    let report = engine(
        FakeTables::default(),
        &[],
        FakeRouterClient::default(),
        vec![],
    )
    .automatic()
    .await;

    assert!(report.hosts.is_empty());
    assert!(!report.snmp_success);
    assert!(report.topology.is_none());
}

#[tokio::test]
async fn automatic_discovery_without_gateway_still_collects_passively() {
    let tables = FakeTables {
        topology: Some(home_topology()),
        gateway: None,
        arp: vec![ip(192, 168, 1, 7)],
        peers: vec![ip(142, 250, 74, 78)],
    };

    let report = engine(tables, &[], FakeRouterClient::default(), vec![])
        .automatic()
        .await;

    assert!(!report.snmp_success);
    let addrs: Vec<Ipv4Addr> = report.hosts.iter().map(|h| h.addr).collect();
    assert_eq!(addrs, vec![ip(192, 168, 1, 7), ip(142, 250, 74, 78)]);
}

#[tokio::test]
async fn directed_sweep_finds_alive_hosts_with_latency() {
    let alive = [ip(10, 1, 2, 3), ip(10, 1, 2, 200)];
    let eng = engine(
        FakeTables::default(),
        &alive,
        FakeRouterClient::default(),
        vec![],
    );

    let report = eng.scan_cidr(ip(10, 1, 2, 0), 24).await.unwrap();
    assert_eq!(report.hosts.len(), 2);
    for host in &report.hosts {
        assert_eq!(host.source, Source::SubnetScan);
        assert_eq!(host.latency_ms, Some(2));
    }
}

#[tokio::test]
async fn directed_sweep_rejects_out_of_range_prefixes() {
    let eng = engine(
        FakeTables::default(),
        &[],
        FakeRouterClient::default(),
        vec![],
    );

    let err = eng.scan_cidr(ip(10, 0, 0, 0), 12).await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Validation(_)));
    let err = eng.scan_cidr(ip(10, 0, 0, 0), 31).await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Validation(_)));
}

#[tokio::test]
async fn directed_router_query_uses_the_given_credential_only() {
    let router = ip(172, 16, 0, 1);
    let routers = FakeRouterClient::default().with_router(
        router,
        FakeRouter {
            community: "ops-east".to_string(),
            interfaces: vec![router],
            next_hops: vec![ip(172, 16, 0, 2)],
            arp: vec![ip(172, 16, 0, 30)],
        },
    );
    let eng = engine(FakeTables::default(), &[], routers, vec![]);

    let report = eng
        .query_router(router, Some("ops-east".to_string()))
        .await
        .unwrap();
    assert!(report.snmp_success);
    let addrs: Vec<Ipv4Addr> = report.hosts.iter().map(|h| h.addr).collect();
    assert!(addrs.contains(&router));
    assert!(addrs.contains(&ip(172, 16, 0, 30)));
    // The next-hop is recorded but, with a single-visit walk, never queried.
    assert!(addrs.contains(&ip(172, 16, 0, 2)));

    // The candidate list would not have found this credential.
    let report = eng.query_router(router, None).await.unwrap();
    assert!(!report.snmp_success);
    assert!(report.hosts.is_empty());
}

#[tokio::test]
async fn directed_trace_records_hops_in_path_order() {
    let hops = vec![ip(192, 168, 1, 1), ip(10, 11, 0, 1), ip(8, 8, 8, 8)];
    let eng = engine(
        FakeTables::default(),
        &[],
        FakeRouterClient::default(),
        hops.clone(),
    );

    let report = eng.trace("8.8.8.8").await.unwrap();
    let addrs: Vec<Ipv4Addr> = report.hosts.iter().map(|h| h.addr).collect();
    assert_eq!(addrs, hops);
    assert!(report.hosts.iter().all(|h| h.source == Source::Traceroute));

    let err = eng.trace("google.com").await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Validation(_)));
}

#[tokio::test]
async fn multi_subnet_sweeps_around_off_subnet_private_hops() {
    let tables = FakeTables {
        topology: Some(home_topology()),
        ..FakeTables::default()
    };
    // One alive host on the local subnet, one on the subnet behind the
    // first upstream router.
    let alive = [ip(192, 168, 1, 10), ip(10, 9, 0, 5)];
    // Hop list toward the anchor: local gateway, an off-subnet private
    // router, then the public internet.
    let hops = vec![ip(192, 168, 1, 1), ip(10, 9, 0, 1), ip(142, 250, 74, 78)];

    let report = engine(tables, &alive, FakeRouterClient::default(), hops)
        .multi_subnet()
        .await
        .unwrap();

    let addrs: Vec<Ipv4Addr> = report.hosts.iter().map(|h| h.addr).collect();
    assert!(addrs.contains(&ip(192, 168, 1, 10)));
    assert!(addrs.contains(&ip(10, 9, 0, 1)));
    assert!(addrs.contains(&ip(10, 9, 0, 5)));
    // The on-subnet hop and the public hop spawned no extra sweeps.
    assert!(!addrs.contains(&ip(142, 250, 74, 78)));

    let off_hop = report
        .hosts
        .iter()
        .find(|h| h.addr == ip(10, 9, 0, 1))
        .unwrap();
    assert_eq!(off_hop.source, Source::Traceroute);
}

#[tokio::test]
async fn multi_subnet_without_topology_is_a_configuration_error() {
    let eng = engine(
        FakeTables::default(),
        &[],
        FakeRouterClient::default(),
        vec![],
    );
    let err = eng.multi_subnet().await.unwrap_err();
    assert!(err.is_run_fatal());
}

#[tokio::test]
async fn passive_only_merges_gateway_arp_and_connections() {
    let gateway = ip(192, 168, 1, 1);
    let tables = FakeTables {
        topology: Some(home_topology()),
        gateway: Some(gateway),
        // The gateway shows up in the ARP cache too; first writer wins.
        arp: vec![gateway, ip(192, 168, 1, 33)],
        peers: vec![ip(192, 168, 1, 33), ip(142, 250, 74, 78)],
    };

    let report = engine(tables, &[], FakeRouterClient::default(), vec![])
        .passive_only()
        .await;

    assert!(!report.snmp_success);
    let addrs: Vec<Ipv4Addr> = report.hosts.iter().map(|h| h.addr).collect();
    assert_eq!(
        addrs,
        vec![gateway, ip(192, 168, 1, 33), ip(142, 250, 74, 78)]
    );
    assert_eq!(report.hosts[0].source, Source::Gateway);
    assert_eq!(report.hosts[1].source, Source::LocalArp);
    assert_eq!(report.hosts[2].source, Source::ActiveConnection);
}
