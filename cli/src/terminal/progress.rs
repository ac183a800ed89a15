use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use hopmap_common::report::ProgressEvent;

/// A spinner fed by the engine's progress channel.
pub struct ProgressHandle {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl ProgressHandle {
    /// Stops the feed task and clears the spinner line.
    pub fn detach(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}

/// Spawns a task translating progress events into spinner updates.
pub fn attach(mut rx: UnboundedReceiver<ProgressEvent>) -> ProgressHandle {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .expect("static template")
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    let feed = bar.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render(&feed, event);
        }
    });

    ProgressHandle { bar, task }
}

fn render(bar: &ProgressBar, event: ProgressEvent) {
    match event {
        ProgressEvent::Stage(msg) => bar.set_message(msg),
        ProgressEvent::SweepProgress { scanned, total } => {
            bar.set_message(format!(
                "probing hosts {}/{}",
                scanned.to_string().bold(),
                total
            ));
        }
        ProgressEvent::SweepCapped {
            requested,
            capped_to,
        } => {
            bar.println(format!(
                "{} subnet holds {requested} hosts, probing the first {capped_to}",
                "(!)".yellow().bold()
            ));
        }
        ProgressEvent::RouterVisit { router, visited } => {
            bar.set_message(format!("querying router {router} (#{visited})"));
        }
        ProgressEvent::CredentialAccepted { router, community } => {
            bar.println(format!(
                "{} router {router} answered under '{community}'",
                "(>)".green().bold()
            ));
        }
        ProgressEvent::RouterUnresponsive { router } => {
            bar.println(format!(
                "{} router {router} did not answer",
                "(!)".yellow().bold()
            ));
        }
        ProgressEvent::HostFound { addr, via } => {
            bar.println(format!(
                "{} {} via {}",
                "(>)".green().bold(),
                addr.to_string().bright_cyan(),
                via
            ));
        }
    }
}
