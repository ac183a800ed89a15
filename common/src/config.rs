use std::time::Duration;

/// Run-wide configuration for the discovery engine.
///
/// Defaults: one-second echo probes, three-second management queries, a
/// 254-host ceiling per subnet sweep and a bounded router walk.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Deadline for a single echo probe.
    pub probe_timeout: Duration,
    /// Deadline for a single router management query.
    pub query_timeout: Duration,
    /// Overall deadline for one trace toward an external anchor.
    pub trace_timeout: Duration,
    /// Maximum in-flight probes during a subnet sweep.
    pub sweep_concurrency: usize,
    /// Hard ceiling on candidates per sweep; larger subnets are only
    /// partially scanned and the cap is reported to the caller.
    pub sweep_host_cap: usize,
    /// Hard ceiling on routers visited by one graph walk.
    pub router_visit_cap: usize,
    /// Maximum hops followed by the path resolver.
    pub trace_hop_cap: usize,
    /// Maximum addresses accepted from a single router query.
    pub query_result_cap: usize,
    /// Shared-secret candidates tried, in order, against each router.
    pub communities: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(1),
            query_timeout: Duration::from_secs(3),
            trace_timeout: Duration::from_secs(45),
            sweep_concurrency: 48,
            sweep_host_cap: 254,
            router_visit_cap: 30,
            trace_hop_cap: 30,
            query_result_cap: 256,
            communities: ["abc", "public", "private", "community", "cisco"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
