use crate::{
    MAX_AGGREGATE_DEPTH,
    adapter::EntityAdapter,
    boundary::{Boundary, BoundaryResolver},
    error::AggregateError,
    model::AssociationDescriptor,
    value::Value,
};
use std::{collections::BTreeSet, rc::Rc};

/// Identity attribute, excluded from every blob.
pub const IDENTITY_ATTRIBUTE: &str = "id";

/// Audit timestamp attributes, excluded from every blob.
pub const AUDIT_ATTRIBUTES: [&str; 2] = ["created_at", "updated_at"];

///
/// Aggregate
///
/// Binding of one entity class to its resolved boundary and excluded
/// attribute set for the duration of one engine step. It holds no entity
/// state (engines pass the entity handle alongside, so shared and exclusive
/// borrows both work) and it is cheap to recreate per recursive step.
///
/// Children reached through a traversable association additionally exclude
/// that association's foreign key, so a child never reports or accepts its
/// own back-pointer.
///

pub struct Aggregate<'a, A: EntityAdapter> {
    adapter: &'a A,
    class: String,
    boundary: Rc<Boundary>,
    excluded_attributes: BTreeSet<String>,
    depth: usize,
}

impl<'a, A: EntityAdapter> Aggregate<'a, A> {
    /// Bind the root of an aggregate.
    pub fn root(adapter: &'a A, entity: &A::Entity, resolver: &mut BoundaryResolver) -> Self {
        let class = adapter.class_of(entity).to_string();
        Self::bind(adapter, class, None, 0, resolver)
    }

    /// Bind a child reached through `association`, one level deeper.
    pub(crate) fn descend(
        &self,
        association: &AssociationDescriptor,
        class: String,
        resolver: &mut BoundaryResolver,
    ) -> Result<Self, AggregateError> {
        if self.depth + 1 >= MAX_AGGREGATE_DEPTH {
            return Err(AggregateError::DepthExceeded {
                limit: MAX_AGGREGATE_DEPTH,
            });
        }

        Ok(Self::bind(
            self.adapter,
            class,
            Some(association.foreign_key.as_str()),
            self.depth + 1,
            resolver,
        ))
    }

    fn bind(
        adapter: &'a A,
        class: String,
        foreign_key: Option<&str>,
        depth: usize,
        resolver: &mut BoundaryResolver,
    ) -> Self {
        let boundary = resolver.resolve_with(&class, || adapter.associations(&class));

        let mut excluded_attributes: BTreeSet<String> = AUDIT_ATTRIBUTES
            .iter()
            .map(ToString::to_string)
            .collect();
        excluded_attributes.insert(IDENTITY_ATTRIBUTE.to_string());
        if let Some(foreign_key) = foreign_key
            && !foreign_key.is_empty()
        {
            excluded_attributes.insert(foreign_key.to_string());
        }

        Self {
            adapter,
            class,
            boundary,
            excluded_attributes,
            depth,
        }
    }

    #[must_use]
    pub const fn adapter(&self) -> &'a A {
        self.adapter
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    #[must_use]
    pub fn is_excluded_attribute(&self, name: &str) -> bool {
        self.excluded_attributes.contains(name)
    }

    /// Run a raw value through the attribute's codec, storage → wire.
    #[must_use]
    pub fn serialize_value(&self, attribute: &str, value: &Value) -> Value {
        self.adapter
            .codec(&self.class, attribute)
            .map_or_else(|| value.clone(), |codec| codec.serialize(value))
    }

    /// Run a wire value through the attribute's codec, wire → storage.
    #[must_use]
    pub fn deserialize_value(&self, attribute: &str, value: &Value) -> Value {
        self.adapter
            .codec(&self.class, attribute)
            .map_or_else(|| value.clone(), |codec| codec.deserialize(value))
    }

    /// `SchemaMismatch` for a key this class does not know.
    pub(crate) fn schema_mismatch(&self, name: &str) -> AggregateError {
        crate::obs::metrics::count(|m| m.walk.schema_mismatches += 1);

        AggregateError::SchemaMismatch {
            class: self.class.clone(),
            name: name.to_string(),
        }
    }
}
