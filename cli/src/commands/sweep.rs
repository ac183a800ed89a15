use std::net::Ipv4Addr;
use std::time::Instant;

use anyhow::{Context, Result};

use hopmap_common::config::DiscoveryConfig;
use hopmap_common::network::addr;
use hopmap_common::report::Reporter;
use hopmap_core::DiscoveryEngine;

use crate::terminal::{print, progress};

pub async fn run(config: DiscoveryConfig, cidr: &str) -> Result<()> {
    let (network, prefix_len) = parse_cidr(cidr)?;

    let (reporter, rx) = Reporter::channel();
    let engine = DiscoveryEngine::system(config, reporter);
    let progress = progress::attach(rx);

    let started = Instant::now();
    let report = engine.scan_cidr(network, prefix_len).await;
    progress.detach();

    print::results(&report?.hosts, started.elapsed());
    Ok(())
}

/// Parses `a.b.c.d/len`; a bare address means its /24.
fn parse_cidr(s: &str) -> Result<(Ipv4Addr, u8)> {
    match s.split_once('/') {
        Some((network, len)) => {
            let network = addr::parse_dotted_quad(network)?;
            let len: u8 = len
                .parse()
                .with_context(|| format!("'{len}' is not a prefix length"))?;
            Ok((network, len))
        }
        None => Ok((addr::parse_dotted_quad(s)?, 24)),
    }
}
