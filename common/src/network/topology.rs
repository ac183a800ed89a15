use std::fmt;
use std::net::Ipv4Addr;

/// Where this machine sits: its address, the surrounding network and the
/// mask that separates the two. Computed once per run and read-only after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkTopology {
    pub local_addr: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub network_addr: Ipv4Addr,
    pub prefix_len: u8,
}

impl NetworkTopology {
    /// Derives the network address and prefix length from an interface
    /// address and its mask.
    ///
    /// The prefix length counts the mask's leading one-bits and stops at the
    /// first zero, so a non-contiguous mask yields the length of its leading
    /// run rather than an error. The result is always in `0..=32`.
    pub fn from_addr_mask(local_addr: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        let network_addr = Ipv4Addr::from(u32::from(local_addr) & u32::from(netmask));
        let prefix_len = u32::from(netmask).leading_ones() as u8;
        Self {
            local_addr,
            netmask,
            network_addr,
            prefix_len,
        }
    }

    /// Whether `addr` falls inside this network.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & u32::from(self.netmask) == u32::from(self.network_addr)
    }
}

impl fmt::Display for NetworkTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_addr, self.prefix_len)
    }
}
