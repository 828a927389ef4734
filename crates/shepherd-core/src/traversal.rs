//! The shared recursive-descent driver.
//!
//! Both apply engines split an incoming blob against the resolved boundary
//! here, then drive a visitor per attribute and per association; both query
//! engines drive a visitor over the live entity instead. Dispatch is always
//! on the descriptor's cardinality tag.

use crate::{
    adapter::EntityAdapter,
    aggregate::Aggregate,
    blob::{CREATE_KEY, DESTROY_KEY, MetaAction},
    error::AggregateError,
    model::association::{AssociationDescriptor, Cardinality},
    value::{Value, ValueMap},
};

///
/// ApplyPlan
///
/// An incoming blob split against a resolved boundary: writable attribute
/// payloads, traversable association payloads, and the lifecycle marker.
/// Untraversable association names and excluded attribute names are dropped
/// during the split; anything left that the schema does not know is a
/// mismatch.
///

pub(crate) struct ApplyPlan {
    pub attributes: Vec<(String, Value)>,
    pub associations: Vec<(AssociationDescriptor, Value)>,
    pub meta: Option<MetaAction>,
}

pub(crate) fn split_blob<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    map: &ValueMap,
) -> Result<ApplyPlan, AggregateError> {
    let mut plan = ApplyPlan {
        attributes: Vec::new(),
        associations: Vec::new(),
        meta: None,
    };
    let mut saw_create = false;
    let mut saw_destroy = false;

    for (key, value) in map {
        if key == CREATE_KEY {
            saw_create = true;
        } else if key == DESTROY_KEY {
            saw_destroy = true;
        } else if let Some(association) = aggregate.boundary().find_traversable(key) {
            plan.associations.push((association.clone(), value.clone()));
        } else if aggregate.boundary().is_excluded_association(key) {
            // outside the boundary; never written
        } else if aggregate.is_excluded_attribute(key) {
            // back-pointers and audit fields are never accepted
        } else if aggregate
            .adapter()
            .default_value(aggregate.class(), key)
            .is_some()
        {
            plan.attributes.push((key.clone(), value.clone()));
        } else {
            return Err(aggregate.schema_mismatch(key));
        }
    }

    plan.meta = match (saw_create, saw_destroy) {
        (true, true) => {
            return Err(AggregateError::Malformed {
                name: CREATE_KEY.to_string(),
                expected: "at most one of _create/_destroy",
            });
        }
        (true, false) => Some(MetaAction::Create),
        (false, true) => Some(MetaAction::Destroy),
        (false, false) => None,
    };

    Ok(plan)
}

///
/// ApplyVisitor
///
/// Per-node callbacks for the apply direction. `flush` runs after the last
/// attribute and before the first association, so a visitor can buffer
/// attribute writes and commit them only once every payload checked out.
///

pub(crate) trait ApplyVisitor<A: EntityAdapter> {
    fn attribute(
        &mut self,
        entity: &mut A::Entity,
        name: &str,
        payload: &Value,
    ) -> Result<(), AggregateError>;

    fn flush(&mut self, entity: &mut A::Entity) -> Result<(), AggregateError> {
        let _ = entity;
        Ok(())
    }

    fn to_one(
        &mut self,
        entity: &mut A::Entity,
        association: &AssociationDescriptor,
        payload: &Value,
    ) -> Result<(), AggregateError>;

    fn to_many(
        &mut self,
        entity: &mut A::Entity,
        association: &AssociationDescriptor,
        payload: &Value,
    ) -> Result<(), AggregateError>;
}

/// Drive an apply visitor over a split plan: attributes, flush, then
/// associations by cardinality. Association failures are wrapped with the
/// association name so nested errors carry the path from the root.
pub(crate) fn drive_apply<A: EntityAdapter, V: ApplyVisitor<A>>(
    visitor: &mut V,
    entity: &mut A::Entity,
    plan: &ApplyPlan,
) -> Result<(), AggregateError> {
    for (name, payload) in &plan.attributes {
        visitor.attribute(entity, name, payload)?;
    }
    visitor.flush(entity)?;

    for (association, payload) in &plan.associations {
        let outcome = match association.cardinality {
            Cardinality::ToOne => visitor.to_one(entity, association, payload),
            Cardinality::ToMany => visitor.to_many(entity, association, payload),
        };
        outcome.map_err(|err| err.with_field(&association.name))?;
    }

    Ok(())
}

///
/// QueryVisitor
///
/// Per-node callbacks for the extract direction. Attributes arrive
/// pre-serialized; associations arrive as live child handles. Associations
/// outside the boundary are never offered, not even to test presence.
///

pub(crate) trait QueryVisitor<A: EntityAdapter> {
    fn attribute(&mut self, name: &str, value: &Value);

    fn to_one(
        &mut self,
        association: &AssociationDescriptor,
        child: &A::Entity,
    ) -> Result<(), AggregateError>;

    fn to_many(
        &mut self,
        association: &AssociationDescriptor,
        children: &[&A::Entity],
    ) -> Result<(), AggregateError>;
}

/// Drive a query visitor: attributes first, then each traversable
/// association in declaration order.
pub(crate) fn drive_query<A: EntityAdapter, V: QueryVisitor<A>>(
    visitor: &mut V,
    aggregate: &Aggregate<'_, A>,
    entity: &A::Entity,
    attributes: &[(String, Value)],
) -> Result<(), AggregateError> {
    for (name, value) in attributes {
        visitor.attribute(name, value);
    }

    for association in &aggregate.boundary().traversable {
        let outcome = match association.cardinality {
            Cardinality::ToOne => match aggregate.adapter().to_one(entity, &association.name) {
                Some(child) => visitor.to_one(association, child),
                None => Ok(()),
            },
            Cardinality::ToMany => {
                let children = aggregate.adapter().children(entity, &association.name);
                visitor.to_many(association, &children)
            }
        };
        outcome.map_err(|err| err.with_field(&association.name))?;
    }

    Ok(())
}
