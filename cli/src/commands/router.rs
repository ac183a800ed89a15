use std::time::Instant;

use anyhow::Result;

use hopmap_common::config::DiscoveryConfig;
use hopmap_common::network::addr;
use hopmap_common::report::Reporter;
use hopmap_core::DiscoveryEngine;

use crate::terminal::{print, progress};

pub async fn run(
    config: DiscoveryConfig,
    address: &str,
    community: Option<String>,
) -> Result<()> {
    let router = addr::parse_dotted_quad(address)?;

    let (reporter, rx) = Reporter::channel();
    let engine = DiscoveryEngine::system(config, reporter);
    let progress = progress::attach(rx);

    let started = Instant::now();
    let report = engine.query_router(router, community).await;
    progress.detach();

    let report = report?;
    if !report.snmp_success {
        print::status(format!("{router} did not answer under any credential"));
    }
    print::results(&report.hosts, started.elapsed());
    Ok(())
}
