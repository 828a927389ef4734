pub mod association;
pub mod namespace;

pub use association::{AssociationDescriptor, Cardinality};
