//! The state engine: absolute snapshots of an aggregate.
//!
//! Extraction walks the boundary and produces a default-suppressed,
//! codec-serialized `StateBlob`. Application is an absolute write (every
//! attribute not named in the blob returns to its class default, every
//! attached child is replaced), so applying an extracted blob to an
//! equivalent graph is idempotent.

mod apply;
mod extract;

pub use apply::apply_state;
pub use extract::extract_state;
