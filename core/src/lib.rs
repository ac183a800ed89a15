//! # Hopmap Core
//!
//! The discovery engine. One run owns a fresh [`registry::HostRegistry`] and
//! drives the collectors into it:
//!
//! * [`probe`]: single-address echo probing.
//! * [`sweep`]: bounded subnet enumeration over the prober.
//! * [`router`]: read-only management queries against one router.
//! * [`walker`]: breadth-first traversal over routers via next-hop edges.
//! * [`passive`]: local kernel tables (gateway, ARP cache, connections).
//! * [`trace`]: hop-list fallback toward an external anchor.
//! * [`discovery`]: the orchestration policies combining all of the above.
//!
//! Every external touchpoint sits behind a trait so the engine can run
//! end-to-end against in-memory fakes.

pub mod discovery;
pub mod passive;
pub mod probe;
pub mod registry;
pub mod router;
pub mod sweep;
pub mod trace;
pub mod walker;

pub use discovery::{DiscoveryEngine, DiscoveryReport};
pub use registry::{DiscoveredHost, HostRegistry, Source};
