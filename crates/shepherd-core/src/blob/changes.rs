use crate::{
    blob::{self, MetaAction},
    value::{Value, ValueMap},
};
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};

///
/// ChangeBlob
///
/// Portable diff of one aggregate: attribute name → `(before, after)` pair,
/// `_create`/`_destroy` lifecycle markers, association name → nested change
/// map (to-one) or index-keyed group of change maps (to-many). To-many keys
/// are decimal strings in the child collection's own enumeration order.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, Deserialize, Eq, IntoIterator, PartialEq, Serialize,
)]
#[serde(transparent)]
pub struct ChangeBlob(ValueMap);

impl ChangeBlob {
    #[must_use]
    pub const fn new() -> Self {
        Self(ValueMap::new())
    }

    #[must_use]
    pub fn from_map(map: ValueMap) -> Self {
        Self(map)
    }

    #[must_use]
    pub const fn as_map(&self) -> &ValueMap {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Map(self.0)
    }

    /// Record a lifecycle marker with the conventional truthy payload.
    pub fn set_meta(&mut self, action: MetaAction) {
        self.0
            .insert(action.key().to_string(), Value::text(blob::META_VALUE));
    }

    #[must_use]
    pub fn marks_create(&self) -> bool {
        self.0.contains_key(blob::CREATE_KEY)
    }

    #[must_use]
    pub fn marks_destroy(&self) -> bool {
        self.0.contains_key(blob::DESTROY_KEY)
    }

    /// Record a `(before, after)` pair for one attribute.
    pub fn set_pair(&mut self, attribute: impl Into<String>, before: Value, after: Value) {
        self.0.insert(attribute.into(), Value::pair(before, after));
    }
}

impl From<ValueMap> for ChangeBlob {
    fn from(map: ValueMap) -> Self {
        Self(map)
    }
}

/// Parse a to-many group key as a 0-based position. Plain decimal digits
/// only; anything else is a malformed key.
#[must_use]
pub fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    key.parse().ok()
}
