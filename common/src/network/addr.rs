//! # Address And Credential Gates
//!
//! Every address string crossing from "data" to "query parameter" goes
//! through these gates, not just the outermost user input. Router tables,
//! ARP caches and connection listings all feed addresses back into further
//! probes, so an entry that survives parsing here is guaranteed to be a
//! plain dotted quad the transport can treat as opaque data.

use std::net::Ipv4Addr;

use crate::error::DiscoveryError;

/// Prefix `ss`/`netstat` put in front of IPv4 peers on dual-stack sockets.
const V6_MAPPED_PREFIX: &str = "::ffff:";

/// Parses a dotted-quad address under a strict charset.
///
/// Only digits and `.` are accepted before the actual parse, so strings
/// carrying shell metacharacters, hostnames or IPv6 notation are rejected
/// up front rather than handed to `Ipv4Addr::from_str`'s error path.
pub fn parse_dotted_quad(s: &str) -> Result<Ipv4Addr, DiscoveryError> {
    if s.is_empty() {
        return Err(DiscoveryError::Validation("empty address".into()));
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(DiscoveryError::Validation(format!(
            "address '{s}' contains characters outside [0-9.]"
        )));
    }
    s.parse::<Ipv4Addr>()
        .map_err(|_| DiscoveryError::Validation(format!("'{s}' is not a dotted-quad address")))
}

/// Validates a shared-secret string for router queries.
///
/// Alphanumerics, `-` and `_` only; the secret ends up on a command line and
/// must never be interpretable as anything but a single opaque word.
pub fn validate_community(community: &str) -> Result<(), DiscoveryError> {
    if community.is_empty() {
        return Err(DiscoveryError::Validation("empty community string".into()));
    }
    let ok = community
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !ok {
        return Err(DiscoveryError::Validation(format!(
            "community '{community}' contains characters outside [A-Za-z0-9_-]"
        )));
    }
    Ok(())
}

/// Strips the IPv6-mapped prefix dual-stack tools report for IPv4 peers.
pub fn strip_v6_mapped(s: &str) -> &str {
    s.strip_prefix(V6_MAPPED_PREFIX).unwrap_or(s)
}
