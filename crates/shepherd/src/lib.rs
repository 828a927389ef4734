//! Shepherd treats a root entity and the subtree it exclusively owns as one
//! unit: snapshot it as a portable nested map, or diff it as a reversible
//! nested map of `(before, after)` pairs, and replay either against another
//! copy of the graph.
//!
//! ## Crate layout
//! - `core`: the engines (boundary resolution, state extraction and
//!   application, change extraction/application/reversal/validation) plus
//!   the value model and the adapter traits hosts implement.
//! - `root`: the caller-facing [`AggregateRoot`] binding.
//!
//! The `prelude` module mirrors the surface host code usually needs.

pub use shepherd_core as core;

mod root;

pub use root::AggregateRoot;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        AggregateRoot,
        core::{
            adapter::{AttributeChange, AttributeState, EntityAdapter, ValueCodec},
            blob::{ChangeBlob, MetaAction, StateBlob},
            error::{AggregateError, ValidationError},
            model::{AssociationDescriptor, Cardinality},
            value::{Float64, Value, ValueMap},
        },
    };
}
