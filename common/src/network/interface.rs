//! # Local Topology Resolver
//!
//! Answers one question at the start of a run: which network is this machine
//! on? The first interface that is up, not loopback and carries an IPv4
//! network wins. Failure here is the only condition fatal to a whole
//! discovery run.

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;

use crate::error::DiscoveryError;
use crate::network::topology::NetworkTopology;

/// Resolves the local topology from the live interface table.
pub fn resolve_local_topology() -> Result<NetworkTopology, DiscoveryError> {
    resolve_from(datalink::interfaces())
}

fn resolve_from(interfaces: Vec<NetworkInterface>) -> Result<NetworkTopology, DiscoveryError> {
    interfaces
        .iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback())
        .find_map(first_v4_network)
        .ok_or_else(|| {
            DiscoveryError::Configuration(
                "no non-loopback interface with an IPv4 address".to_string(),
            )
        })
}

fn first_v4_network(iface: &NetworkInterface) -> Option<NetworkTopology> {
    iface.ips.iter().find_map(|net| match net {
        IpNetwork::V4(v4) => Some(NetworkTopology::from_addr_mask(v4.ip(), v4.mask())),
        IpNetwork::V6(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const IFF_UP: u32 = 1;
    const IFF_LOOPBACK: u32 = 1 << 3;

    fn mock_interface(name: &str, ips: Vec<IpNetwork>, flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: String::new(),
            index: 0,
            mac: None,
            ips,
            flags,
        }
    }

    #[test]
    fn picks_first_ipv4_interface() {
        let interfaces = vec![
            mock_interface(
                "lo",
                vec![IpNetwork::V4("127.0.0.1/8".parse().unwrap())],
                IFF_UP | IFF_LOOPBACK,
            ),
            mock_interface(
                "eth0",
                vec![IpNetwork::V4("192.168.1.42/24".parse().unwrap())],
                IFF_UP,
            ),
            mock_interface(
                "eth1",
                vec![IpNetwork::V4("10.0.0.2/8".parse().unwrap())],
                IFF_UP,
            ),
        ];

        let topo = resolve_from(interfaces).unwrap();
        assert_eq!(topo.local_addr, Ipv4Addr::new(192, 168, 1, 42));
        assert_eq!(topo.network_addr, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(topo.netmask, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(topo.prefix_len, 24);
    }

    #[test]
    fn skips_down_and_v6_only_interfaces() {
        let interfaces = vec![
            mock_interface(
                "eth0",
                vec![IpNetwork::V4("192.168.1.42/24".parse().unwrap())],
                0,
            ),
            mock_interface(
                "eth1",
                vec![IpNetwork::V6("fe80::1/64".parse().unwrap())],
                IFF_UP,
            ),
            mock_interface(
                "wlan0",
                vec![IpNetwork::V4("172.16.9.3/12".parse().unwrap())],
                IFF_UP,
            ),
        ];

        let topo = resolve_from(interfaces).unwrap();
        assert_eq!(topo.local_addr, Ipv4Addr::new(172, 16, 9, 3));
        assert_eq!(topo.prefix_len, 12);
    }

    #[test]
    fn no_usable_interface_is_a_configuration_error() {
        let interfaces = vec![mock_interface(
            "lo",
            vec![IpNetwork::V4("127.0.0.1/8".parse().unwrap())],
            IFF_UP | IFF_LOOPBACK,
        )];

        let err = resolve_from(interfaces).unwrap_err();
        assert!(err.is_run_fatal());
    }
}
