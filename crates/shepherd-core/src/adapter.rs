use crate::{model::AssociationDescriptor, value::Value};

///
/// AttributeState
///
/// One attribute as reported by the adapter: the typed current value plus
/// the raw storage form handed to codecs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeState {
    pub name: String,
    pub value: Value,
    pub raw: Value,
}

///
/// AttributeChange
///
/// One dirty attribute as reported by the adapter.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeChange {
    pub name: String,
    pub before: Value,
    pub after: Value,
}

///
/// ValueCodec
///
/// Optional per-attribute value transform applied while materializing blobs:
/// `serialize` maps the raw storage form to the wire form, `deserialize`
/// maps it back. Transforms are total; reversibility of class defaults is
/// enforced separately by the engines (`UnsupportedDefault`).
///

pub trait ValueCodec {
    fn serialize(&self, value: &Value) -> Value;
    fn deserialize(&self, value: &Value) -> Value;
}

///
/// EntityAdapter
///
/// The host object-relational capability the engines consume. A host
/// implements this once on an adapter value and passes it to every engine
/// call; behavior is registered explicitly, never injected into a shared
/// base type.
///
/// The engines treat every method as an instantaneous, non-blocking call.
/// They never retain entity references beyond a single call, and they only
/// touch associations inside the resolved boundary.
///

pub trait EntityAdapter {
    /// Host entity handle. Owned by the caller for the duration of a call.
    type Entity;

    // ------------------------------------------------------------------
    // Class-level metadata
    // ------------------------------------------------------------------

    /// Hierarchical class path of this entity (e.g. `project::todo_list`).
    fn class_of<'e>(&self, entity: &'e Self::Entity) -> &'e str;

    /// All declared associations of a class, in declaration order.
    fn associations(&self, class: &str) -> Vec<AssociationDescriptor>;

    /// Class default for an attribute; `None` means the class has no such
    /// attribute.
    fn default_value(&self, class: &str, attribute: &str) -> Option<Value>;

    /// Optional value transform for an attribute.
    fn codec(&self, class: &str, attribute: &str) -> Option<&dyn ValueCodec>;

    // ------------------------------------------------------------------
    // Instance attributes
    // ------------------------------------------------------------------

    /// Every attribute of the entity with its current and raw values.
    fn attributes(&self, entity: &Self::Entity) -> Vec<AttributeState>;

    /// Attributes whose value differs from the persisted (or freshly built)
    /// baseline, with before/after values.
    fn dirty_attributes(&self, entity: &Self::Entity) -> Vec<AttributeChange>;

    /// Write one attribute. Returns `false` when the class has no such
    /// attribute.
    fn set_attribute(&self, entity: &mut Self::Entity, attribute: &str, value: Value) -> bool;

    // ------------------------------------------------------------------
    // Association access
    // ------------------------------------------------------------------

    fn to_one<'e>(&self, entity: &'e Self::Entity, association: &str) -> Option<&'e Self::Entity>;

    fn to_one_mut<'e>(
        &self,
        entity: &'e mut Self::Entity,
        association: &str,
    ) -> Option<&'e mut Self::Entity>;

    /// Children of a to-many association in the adapter's enumeration order.
    fn children<'e>(&self, entity: &'e Self::Entity, association: &str) -> Vec<&'e Self::Entity>;

    fn children_len(&self, entity: &Self::Entity, association: &str) -> usize;

    fn child_mut<'e>(
        &self,
        entity: &'e mut Self::Entity,
        association: &str,
        index: usize,
    ) -> Option<&'e mut Self::Entity>;

    /// Build and attach a fresh child with class defaults: a to-one edge
    /// replaces any existing child, a to-many edge appends.
    fn build_child<'e>(
        &self,
        entity: &'e mut Self::Entity,
        association: &str,
    ) -> &'e mut Self::Entity;

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn mark_for_destruction(&self, entity: &mut Self::Entity);

    fn is_new(&self, entity: &Self::Entity) -> bool;

    fn is_marked_for_destruction(&self, entity: &Self::Entity) -> bool;

    /// Host validity predicate; consulted by change validation only.
    fn is_valid(&self, entity: &Self::Entity) -> bool;
}
