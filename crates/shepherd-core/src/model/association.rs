///
/// Cardinality
///
/// Engine dispatch tag for association edges. The engines never dispatch on
/// class names, only on this tag.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    /// 0..1 child.
    ToOne,
    /// Ordered list of children.
    ToMany,
}

impl Cardinality {
    #[must_use]
    pub const fn is_to_many(self) -> bool {
        matches!(self, Self::ToMany)
    }
}

///
/// AssociationDescriptor
///
/// One declared association edge of an entity class, as reported by the
/// adapter. Fields are owned so hosts may synthesize descriptors at runtime.
///
/// `foreign_key` names the field on the *child* side that points back at the
/// parent; children reached through a traversable edge exclude it from their
/// own blobs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationDescriptor {
    pub name: String,
    pub cardinality: Cardinality,
    pub foreign_key: String,
    /// Child lifecycle bound to the parent. Reference-direction edges
    /// (the parent merely points outward) carry `false`.
    pub owning: bool,
    pub readonly: bool,
    /// Reachable only by composing two other associations.
    pub indirect: bool,
    pub target_class: String,
    pub target_table: String,
}

impl AssociationDescriptor {
    /// An owning, writable, direct association; adjust flags with the
    /// builder methods below.
    pub fn new(
        name: impl Into<String>,
        cardinality: Cardinality,
        foreign_key: impl Into<String>,
        target_class: impl Into<String>,
        target_table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality,
            foreign_key: foreign_key.into(),
            owning: true,
            readonly: false,
            indirect: false,
            target_class: target_class.into(),
            target_table: target_table.into(),
        }
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Mark as a reference-direction edge (the parent owns nothing).
    #[must_use]
    pub fn reference(mut self) -> Self {
        self.owning = false;
        self
    }

    #[must_use]
    pub fn indirect(mut self) -> Self {
        self.indirect = true;
        self
    }
}
