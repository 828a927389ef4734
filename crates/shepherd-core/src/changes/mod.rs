//! The change engine: reversible diffs of an aggregate.
//!
//! Extraction turns the adapter's dirty deltas into a portable nested map of
//! `(before, after)` pairs with `_create`/`_destroy` lifecycle markers.
//! Application replays such a map under optimistic-concurrency checks.
//! Reversal inverts a map losslessly; validation proves a map safe to apply.

mod apply;
mod extract;
mod reverse;
mod validate;

pub use apply::apply_changes;
pub use extract::extract_changes;
pub use reverse::reverse_changes;
pub use validate::validate_changes;
