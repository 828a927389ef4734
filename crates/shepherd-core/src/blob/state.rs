use crate::value::{Value, ValueMap};
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};

///
/// StateBlob
///
/// Portable snapshot of one aggregate: attribute name → codec-serialized
/// value (defaults suppressed), association name → nested state map (to-one)
/// or ordered list of state maps (to-many). Nested children are carried as
/// `Value::Map` so the blob stays a plain JSON-encodable tree.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, Deserialize, Eq, IntoIterator, PartialEq, Serialize,
)]
#[serde(transparent)]
pub struct StateBlob(ValueMap);

impl StateBlob {
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
}

impl From<ValueMap> for StateBlob {
    fn from(map: ValueMap) -> Self {
        Self(map)
    }
}
