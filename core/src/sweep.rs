//! # Subnet Enumerator
//!
//! Expands a network/prefix pair into its candidate host addresses and
//! drives the prober across them with bounded concurrency. The candidate
//! list never contains the network or broadcast address, and subnets wider
//! than the host cap are truncated by design, with the truncation reported
//! rather than silently applied.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use hopmap_common::config::DiscoveryConfig;
use hopmap_common::error::DiscoveryError;
use hopmap_common::report::{ProgressEvent, Reporter};

use crate::probe::{ProbeOutcome, Prober};
use crate::registry::{HostRegistry, Source};

/// How many progress updates one full sweep produces.
const PROGRESS_UPDATES: usize = 20;

/// The bounded candidate list for one subnet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    pub candidates: Vec<Ipv4Addr>,
    /// True when the subnet held more hosts than the cap allowed.
    pub capped: bool,
    /// Host count the subnet would have without the cap.
    pub requested: usize,
}

/// Enumerates probe candidates for `network/prefix_len`, capped at
/// `host_cap` addresses.
///
/// Candidates start at network+1 and walk upward in host order; octet carry
/// falls out of the u32 arithmetic. Prefixes of 31 and 32 have no usable
/// host addresses and yield an empty plan.
pub fn plan_sweep(
    network: Ipv4Addr,
    prefix_len: u8,
    host_cap: usize,
) -> Result<SweepPlan, DiscoveryError> {
    if prefix_len > 32 {
        return Err(DiscoveryError::Validation(format!(
            "prefix length {prefix_len} exceeds 32"
        )));
    }

    let host_bits = 32 - u32::from(prefix_len);
    let requested = if host_bits < 2 {
        0
    } else {
        (1usize << host_bits) - 2
    };
    let count = requested.min(host_cap);

    let mask = if prefix_len == 0 {
        0
    } else {
        u32::MAX << host_bits
    };
    let base = u32::from(network) & mask;

    let candidates = (1..=count as u32)
        .map(|offset| Ipv4Addr::from(base + offset))
        .collect();

    Ok(SweepPlan {
        candidates,
        capped: requested > count,
        requested,
    })
}

/// Probes every candidate of a subnet into the shared registry.
pub struct SubnetSweep {
    prober: Arc<dyn Prober>,
    registry: Arc<HostRegistry>,
    reporter: Reporter,
    concurrency: usize,
    host_cap: usize,
}

impl SubnetSweep {
    pub fn new(
        config: &DiscoveryConfig,
        prober: Arc<dyn Prober>,
        registry: Arc<HostRegistry>,
        reporter: Reporter,
    ) -> Self {
        Self {
            prober,
            registry,
            reporter,
            concurrency: config.sweep_concurrency.max(1),
            host_cap: config.sweep_host_cap,
        }
    }

    /// Sweeps one subnet and returns how many hosts it newly added.
    pub async fn scan(&self, network: Ipv4Addr, prefix_len: u8) -> Result<usize, DiscoveryError> {
        let plan = plan_sweep(network, prefix_len, self.host_cap)?;
        let total = plan.candidates.len();
        if plan.capped {
            self.reporter.emit(ProgressEvent::SweepCapped {
                requested: plan.requested,
                capped_to: total,
            });
        }
        if total == 0 {
            return Ok(0);
        }

        debug!(%network, prefix_len, total, "sweeping subnet");

        let cadence = (total / PROGRESS_UPDATES).max(1);
        let scanned = Arc::new(AtomicUsize::new(0));
        let added = Arc::new(AtomicUsize::new(0));
        let permits = Arc::new(Semaphore::new(self.concurrency));

        let mut workers = JoinSet::new();
        for candidate in plan.candidates {
            let prober = Arc::clone(&self.prober);
            let registry = Arc::clone(&self.registry);
            let reporter = self.reporter.clone();
            let scanned = Arc::clone(&scanned);
            let added = Arc::clone(&added);
            let permits = Arc::clone(&permits);

            workers.spawn(async move {
                // The semaphore lives as long as the sweep; acquisition can
                // only fail if it were closed.
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };

                // Self-generated candidates always pass the gate; treat a
                // rejection the same as no reply.
                let outcome = prober
                    .probe(&candidate.to_string())
                    .await
                    .unwrap_or(ProbeOutcome::UNREACHABLE);

                if outcome.reachable
                    && registry.try_add(candidate, outcome.latency_ms, Source::SubnetScan)
                {
                    added.fetch_add(1, Ordering::Relaxed);
                    reporter.emit(ProgressEvent::HostFound {
                        addr: candidate,
                        via: Source::SubnetScan.label(),
                    });
                }

                let done = scanned.fetch_add(1, Ordering::Relaxed) + 1;
                if done % cadence == 0 || done == total {
                    reporter.emit(ProgressEvent::SweepProgress {
                        scanned: done,
                        total,
                    });
                }
            });
        }

        while let Some(joined) = workers.join_next().await {
            // A panicked worker loses one candidate, not the sweep.
            if let Err(err) = joined {
                debug!(%err, "sweep worker aborted");
            }
        }

        Ok(added.load(Ordering::Relaxed))
    }
}
