use std::time::Instant;

use anyhow::Result;

use hopmap_common::config::DiscoveryConfig;
use hopmap_common::report::Reporter;
use hopmap_core::DiscoveryEngine;

use crate::terminal::{print, progress};

pub async fn run(config: DiscoveryConfig) -> Result<()> {
    let (reporter, rx) = Reporter::channel();
    let engine = DiscoveryEngine::system(config, reporter);
    let progress = progress::attach(rx);

    let started = Instant::now();
    let report = engine.multi_subnet().await;
    progress.detach();

    let report = report?;
    if let Some(topology) = &report.topology {
        print::status(format!("local network {topology}"));
    }
    print::results(&report.hosts, started.elapsed());
    Ok(())
}
