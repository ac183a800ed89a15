//! # Path Resolver
//!
//! Resolves the hop list toward a target by running the system `traceroute`
//! in numeric mode. Hops that never answered show up as `*` rows and are
//! skipped; everything else is gated through the dotted-quad parser before
//! it can reach the registry.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use hopmap_common::error::DiscoveryError;
use hopmap_common::network::addr;

/// Seam for hop-list resolution.
///
/// An unreachable target or expired deadline is an empty `Ok`; `Err` is
/// reserved for rejected input.
#[async_trait]
pub trait PathResolver: Send + Sync {
    async fn trace(&self, target: &str) -> Result<Vec<Ipv4Addr>, DiscoveryError>;
}

/// Traces via the system `traceroute` binary.
pub struct SystemTraceroute {
    timeout: Duration,
    hop_cap: usize,
}

impl SystemTraceroute {
    pub fn new(timeout: Duration, hop_cap: usize) -> Self {
        Self { timeout, hop_cap }
    }
}

#[async_trait]
impl PathResolver for SystemTraceroute {
    async fn trace(&self, target: &str) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
        let target = addr::parse_dotted_quad(target)?;

        let hop_cap = self.hop_cap.to_string();
        let child = Command::new("traceroute")
            .args(["-n", "-m", &hop_cap, "-w", "1"])
            .arg(target.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                trace!(%target, %err, "could not invoke traceroute");
                return Ok(Vec::new());
            }
            Err(_) => {
                trace!(%target, "trace exceeded deadline");
                return Ok(Vec::new());
            }
        };

        if !output.status.success() {
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_trace_output(&stdout))
    }
}

/// Extracts answering hop addresses from numeric traceroute output.
///
/// The banner line is skipped, `*` rows contribute nothing, and a hop line
/// yields its first dotted-quad token. Order is the hop order.
pub(crate) fn parse_trace_output(output: &str) -> Vec<Ipv4Addr> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("traceroute"))
        .filter_map(|line| {
            line.split_whitespace()
                .skip(1) // hop number
                .find_map(|token| addr::parse_dotted_quad(token).ok())
        })
        .collect()
}
