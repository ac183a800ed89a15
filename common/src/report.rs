//! # Progress Side Channel
//!
//! Long sweeps and router walks emit advisory events so a front end can show
//! activity. The channel is strictly best-effort: a missing or saturated
//! receiver never fails the run, and correctness never depends on an event
//! being delivered.

use std::net::Ipv4Addr;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A human-consumable progress event.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A new phase of the run has begun.
    Stage(String),
    /// A sweep advanced; emitted at a fixed cadence, not per probe.
    SweepProgress { scanned: usize, total: usize },
    /// The requested subnet exceeded the host cap and was truncated.
    SweepCapped { requested: usize, capped_to: usize },
    /// The graph walk is about to query a router.
    RouterVisit { router: Ipv4Addr, visited: usize },
    /// A credential candidate produced data for a router.
    CredentialAccepted { router: Ipv4Addr, community: String },
    /// No credential candidate produced data for a router.
    RouterUnresponsive { router: Ipv4Addr },
    /// A previously unseen host entered the registry.
    HostFound { addr: Ipv4Addr, via: &'static str },
}

/// Handle the engine writes progress through.
///
/// Cloneable so every worker task can carry one. When detached, events are
/// demoted to trace-level log lines.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    tx: Option<UnboundedSender<ProgressEvent>>,
}

impl Reporter {
    /// A reporter wired to a receiver the caller drains.
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A reporter that drops everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ProgressEvent) {
        match &self.tx {
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => tracing::trace!(?event, "progress"),
        }
    }

    pub fn stage(&self, msg: impl Into<String>) {
        self.emit(ProgressEvent::Stage(msg.into()));
    }
}
