mod changes;
mod state;

pub use changes::{ChangeBlob, parse_index};
pub use state::StateBlob;

/// Reserved key marking an entity as new/unsaved.
pub const CREATE_KEY: &str = "_create";

/// Reserved key marking an entity for removal.
pub const DESTROY_KEY: &str = "_destroy";

/// Conventional truthy payload for the reserved keys; reversal only inspects
/// key presence.
pub const META_VALUE: &str = "1";

///
/// MetaAction
///
/// The lifecycle marker a change blob may carry. At most one per blob level.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetaAction {
    Create,
    Destroy,
}

impl MetaAction {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Create => CREATE_KEY,
            Self::Destroy => DESTROY_KEY,
        }
    }

    /// The marker the reversal engine swaps this one for.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Create => Self::Destroy,
            Self::Destroy => Self::Create,
        }
    }
}

/// Whether a blob key is one of the reserved lifecycle markers.
#[must_use]
pub fn is_meta_key(key: &str) -> bool {
    key == CREATE_KEY || key == DESTROY_KEY
}
