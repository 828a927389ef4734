//! Observability: ephemeral runtime counters for the engines.
//!
//! Counters live in a thread-local cell, cost nothing to the caller, and
//! reset explicitly. The engines record entrypoints and walk events; nothing
//! here performs I/O.

pub mod metrics;

pub use metrics::{EventOps, EventState, WalkCounters, report, reset};
