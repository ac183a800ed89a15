//! # Hopmap Common
//!
//! Shared building blocks for the hopmap discovery engine:
//!
//! * [`error`]: the error taxonomy every engine component reports through.
//! * [`config`]: run-wide knobs (timeouts, caps, credential candidates).
//! * [`network`]: address validation, subnet arithmetic and the local
//!   topology resolver.
//! * [`report`]: the advisory progress side channel between the engine and
//!   whatever front end is watching it.
//!
//! Nothing in this crate performs discovery on its own.

pub mod config;
pub mod error;
pub mod network;
pub mod report;
