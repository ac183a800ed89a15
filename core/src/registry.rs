//! # Host Registry
//!
//! The single write path for discovery results. Deduplicated by address,
//! ordered by insertion, shared across probe workers. First writer wins:
//! whichever collector reports an address first keeps the source
//! attribution, no matter which collectors rediscover it later.

use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Mutex;

/// Which collector found a host first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Gateway,
    RouterInterface,
    RouterNextHop,
    RouterArp,
    LocalArp,
    ActiveConnection,
    SubnetScan,
    Traceroute,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Source::Gateway => "Gateway",
            Source::RouterInterface => "Router Interface",
            Source::RouterNextHop => "Router Next-Hop",
            Source::RouterArp => "Router ARP",
            Source::LocalArp => "Local ARP",
            Source::ActiveConnection => "Active Connection",
            Source::SubnetScan => "Subnet Scan",
            Source::Traceroute => "Traceroute",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One discovered host with its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub addr: Ipv4Addr,
    /// Round-trip time when the host answered an echo probe; collectors that
    /// learn addresses indirectly leave this unset.
    pub latency_ms: Option<u32>,
    pub reachable: bool,
    pub source: Source,
}

#[derive(Debug, Default)]
struct Entries {
    seen: HashSet<Ipv4Addr>,
    hosts: Vec<DiscoveredHost>,
}

/// Insertion-ordered, deduplicated collection of discovered hosts.
///
/// Check-then-insert is one synchronized step, so concurrent probe workers
/// can never race two entries for the same address in.
#[derive(Debug, Default)]
pub struct HostRegistry {
    entries: Mutex<Entries>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a host unless its address is already present.
    ///
    /// Returns true iff the address was new. An existing entry is left
    /// untouched, including its source attribution and latency.
    pub fn try_add(&self, addr: Ipv4Addr, latency_ms: Option<u32>, source: Source) -> bool {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        if !entries.seen.insert(addr) {
            return false;
        }
        entries.hosts.push(DiscoveredHost {
            addr,
            latency_ms,
            reachable: true,
            source,
        });
        true
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .seen
            .contains(&addr)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry lock poisoned").hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The run's results so far, in insertion order.
    pub fn snapshot(&self) -> Vec<DiscoveredHost> {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .hosts
            .clone()
    }
}
