//! Core runtime for Shepherd: the aggregate boundary resolver, state and
//! change engines, portable value model, and the adapter seams hosts
//! implement.
//!
//! An aggregate is one root entity plus the subtree it exclusively owns.
//! The engines treat that subtree as a unit for two jobs: snapshotting it as
//! a portable nested map (`state`), and diffing/patching/reversing it as a
//! nested map of `(before, after)` pairs (`changes`). Everything the engines
//! know about the host's entities arrives through [`adapter::EntityAdapter`].

// public exports are one module level down
pub mod adapter;
pub mod aggregate;
pub mod blob;
pub mod boundary;
pub mod changes;
pub mod error;
pub mod model;
pub mod obs;
pub mod state;
pub mod value;

mod traversal;

// test
#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;

///
/// CONSTANTS
///

/// Maximum nesting depth the engines will walk.
///
/// Recursion depth equals aggregate graph depth; the budget turns a runaway
/// or accidentally cyclic host graph into a typed `DepthExceeded` failure
/// instead of a stack overflow.
pub const MAX_AGGREGATE_DEPTH: usize = 64;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No observability or traversal internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        adapter::{AttributeChange, AttributeState, EntityAdapter, ValueCodec},
        aggregate::Aggregate,
        blob::{ChangeBlob, MetaAction, StateBlob},
        boundary::{Boundary, BoundaryResolver},
        changes::{apply_changes, extract_changes, reverse_changes, validate_changes},
        error::{AggregateError, ValidationError},
        model::{AssociationDescriptor, Cardinality},
        state::{apply_state, extract_state},
        value::{Float64, Value, ValueMap},
    };
}
